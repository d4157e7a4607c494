/*!
 * Loader Configuration
 * Library root, accepted extensions, and execution limits
 */

use crate::core::limits::*;
use crate::vfs::PathDialect;
use std::path::{Path, PathBuf};
use tracing::warn;

/// Settings a [`Loader`](super::Loader) is constructed from
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoaderConfig {
    library_root: PathBuf,
    extensions: Vec<String>,
    print_imports: bool,
    app_id: Option<String>,
    path_root: PathBuf,
    dialect: PathDialect,
    max_call_depth: usize,
    max_require_depth: usize,
}

impl LoaderConfig {
    pub fn builder() -> LoaderConfigBuilder {
        LoaderConfigBuilder::new()
    }

    /// Defaults overridden by `LOTUS_LIBRARY_ROOT`, `LOTUS_PRINT_IMPORTS` and `appId`
    pub fn from_env() -> Self {
        LoaderConfigBuilder::from_env().build()
    }

    pub fn library_root(&self) -> &Path {
        &self.library_root
    }

    /// Accepted extensions in priority order, lower-case with a leading dot
    pub fn extensions(&self) -> &[String] {
        &self.extensions
    }

    /// Index file a directory request redirects to
    pub fn index_file(&self) -> String {
        format!("{}{}", INDEX_STEM, self.extensions[0])
    }

    pub fn print_imports(&self) -> bool {
        self.print_imports
    }

    pub fn app_id(&self) -> Option<&str> {
        self.app_id.as_deref()
    }

    /// Directory `~` expands to
    pub fn path_root(&self) -> &Path {
        &self.path_root
    }

    pub fn dialect(&self) -> PathDialect {
        self.dialect
    }

    pub fn max_call_depth(&self) -> usize {
        self.max_call_depth
    }

    pub fn max_require_depth(&self) -> usize {
        self.max_require_depth
    }
}

impl Default for LoaderConfig {
    fn default() -> Self {
        LoaderConfigBuilder::new().build()
    }
}

/// Builder for LoaderConfig
#[derive(Debug, Clone)]
pub struct LoaderConfigBuilder {
    library_root: Option<PathBuf>,
    extensions: Option<Vec<String>>,
    print_imports: bool,
    app_id: Option<String>,
    path_root: Option<PathBuf>,
    dialect: PathDialect,
    max_call_depth: usize,
    max_require_depth: usize,
}

impl LoaderConfigBuilder {
    pub fn new() -> Self {
        Self {
            library_root: None,
            extensions: None,
            print_imports: false,
            app_id: None,
            path_root: None,
            dialect: PathDialect::default(),
            max_call_depth: DEFAULT_MAX_CALL_DEPTH,
            max_require_depth: DEFAULT_MAX_REQUIRE_DEPTH,
        }
    }

    /// Builder seeded from the process environment
    pub fn from_env() -> Self {
        let mut builder = Self::new();
        if let Some(root) = std::env::var_os(ENV_LIBRARY_ROOT).filter(|v| !v.is_empty()) {
            builder.library_root = Some(PathBuf::from(root));
        }
        builder.print_imports = std::env::var(ENV_PRINT_IMPORTS)
            .map(|v| is_truthy(&v))
            .unwrap_or(false);
        builder.app_id = std::env::var(ENV_APP_ID).ok().filter(|v| !v.is_empty());
        builder
    }

    pub fn with_library_root<P: Into<PathBuf>>(mut self, root: P) -> Self {
        self.library_root = Some(root.into());
        self
    }

    /// Replace the accepted extensions; order is priority order
    pub fn with_extensions<I, S>(mut self, extensions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.extensions = Some(
            extensions
                .into_iter()
                .map(|ext| normalize_extension(ext.as_ref()))
                .filter(|ext| ext.len() > 1)
                .collect(),
        );
        self
    }

    /// Log where each import was requested from and resolved to
    pub fn with_print_imports(mut self, enabled: bool) -> Self {
        self.print_imports = enabled;
        self
    }

    pub fn with_app_id(mut self, app_id: impl Into<String>) -> Self {
        self.app_id = Some(app_id.into());
        self
    }

    pub fn has_app_id(&self) -> bool {
        self.app_id.is_some()
    }

    pub fn with_path_root<P: Into<PathBuf>>(mut self, root: P) -> Self {
        self.path_root = Some(root.into());
        self
    }

    pub fn with_dialect(mut self, dialect: PathDialect) -> Self {
        self.dialect = dialect;
        self
    }

    pub fn with_max_call_depth(mut self, depth: usize) -> Self {
        self.max_call_depth = depth.max(1);
        self
    }

    pub fn with_max_require_depth(mut self, depth: usize) -> Self {
        self.max_require_depth = depth.max(1);
        self
    }

    pub fn build(self) -> LoaderConfig {
        let extensions = match self.extensions {
            Some(extensions) if !extensions.is_empty() => extensions,
            Some(_) => {
                warn!("No usable source extensions configured, using defaults");
                default_extensions()
            }
            None => default_extensions(),
        };

        LoaderConfig {
            library_root: self
                .library_root
                .unwrap_or_else(|| PathBuf::from(DEFAULT_LIBRARY_ROOT)),
            extensions,
            print_imports: self.print_imports,
            app_id: self.app_id,
            path_root: self
                .path_root
                .unwrap_or_else(|| crate::vfs::PathUtility::home().root().to_path_buf()),
            dialect: self.dialect,
            max_call_depth: self.max_call_depth,
            max_require_depth: self.max_require_depth,
        }
    }
}

impl Default for LoaderConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}

fn default_extensions() -> Vec<String> {
    DEFAULT_SOURCE_EXTENSIONS.iter().map(|e| e.to_string()).collect()
}

fn normalize_extension(ext: &str) -> String {
    let ext = ext.trim().to_lowercase();
    if ext.starts_with('.') {
        ext
    } else {
        format!(".{}", ext)
    }
}

fn is_truthy(value: &str) -> bool {
    matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}
