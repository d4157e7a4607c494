/*!
 * Path Utility
 * Canonical join / up / split / clean over a configured root and dialect
 */

use std::path::{Component, Path, PathBuf};

/// Separator conventions a path literal may follow
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PathDialect {
    #[default]
    Unix,
    Windows,
}

impl PathDialect {
    pub fn separator(self) -> char {
        match self {
            PathDialect::Unix => '/',
            PathDialect::Windows => '\\',
        }
    }

    fn is_separator(self, c: char) -> bool {
        match self {
            PathDialect::Unix => c == '/',
            PathDialect::Windows => c == '/' || c == '\\',
        }
    }
}

/// Path operations anchored at a root directory
///
/// `~` expands to the root; every other literal is taken as written.
#[derive(Debug, Clone)]
pub struct PathUtility {
    root: PathBuf,
    dialect: PathDialect,
}

impl PathUtility {
    pub fn new<P: Into<PathBuf>>(root: P, dialect: PathDialect) -> Self {
        Self {
            root: root.into(),
            dialect,
        }
    }

    /// Utility rooted at the current user's home directory
    pub fn home() -> Self {
        let root = std::env::var_os("HOME")
            .or_else(|| std::env::var_os("USERPROFILE"))
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("/"));
        Self::new(root, PathDialect::default())
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn dialect(&self) -> PathDialect {
        self.dialect
    }

    /// Whether a literal names a file rather than a library
    ///
    /// File literals start with `.`, `/`, `~` or a drive root such as `C:\`.
    pub fn is_path(&self, literal: &str) -> bool {
        if literal.starts_with('.') || literal.starts_with('/') || literal.starts_with('~') {
            return true;
        }
        let bytes = literal.as_bytes();
        bytes.len() >= 3
            && bytes[0].is_ascii_alphabetic()
            && bytes[1] == b':'
            && (bytes[2] == b'\\' || bytes[2] == b'/')
    }

    /// Lexically normalize a path, expanding a leading `~`
    pub fn clean<P: AsRef<Path>>(&self, path: P) -> PathBuf {
        let path = path.as_ref();
        let expanded = match path.strip_prefix("~") {
            Ok(rest) => self.root.join(rest),
            Err(_) => path.to_path_buf(),
        };
        path_clean::clean(expanded)
    }

    /// Join parts in order and clean the result
    ///
    /// An absolute part discards everything before it.
    pub fn join<I, P>(&self, parts: I) -> PathBuf
    where
        I: IntoIterator<Item = P>,
        P: AsRef<Path>,
    {
        let mut joined = PathBuf::new();
        for part in parts {
            joined.push(part.as_ref());
        }
        self.clean(joined)
    }

    /// Parent directory of a path; the root of an absolute path is its own parent
    pub fn up<P: AsRef<Path>>(&self, path: P) -> PathBuf {
        let cleaned = self.clean(path);
        match cleaned.parent() {
            Some(parent) if parent.as_os_str().is_empty() => PathBuf::from("."),
            Some(parent) => parent.to_path_buf(),
            None => cleaned,
        }
    }

    /// Non-empty segments of a path literal
    pub fn split(&self, literal: &str) -> Vec<String> {
        literal
            .split(|c| self.dialect.is_separator(c))
            .filter(|segment| !segment.is_empty())
            .map(str::to_string)
            .collect()
    }

    /// Segments of an already-parsed path, without the root marker
    pub fn components<P: AsRef<Path>>(&self, path: P) -> Vec<String> {
        path.as_ref()
            .components()
            .filter_map(|component| match component {
                Component::Normal(name) => Some(name.to_string_lossy().into_owned()),
                _ => None,
            })
            .collect()
    }
}

impl Default for PathUtility {
    fn default() -> Self {
        Self::home()
    }
}
