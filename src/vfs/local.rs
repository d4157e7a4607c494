/*!
 * Local File Resource
 * Text resource over std::fs with selectable encodings
 */

use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use crate::core::{LoaderError, LoaderResult};

/// Text encodings a resource can be read or written with
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Encoding {
    #[default]
    Utf8,
    Ascii,
    Latin1,
}

impl Encoding {
    fn decode(self, bytes: Vec<u8>, path: &Path) -> LoaderResult<String> {
        match self {
            Encoding::Utf8 => String::from_utf8(bytes).map_err(|e| LoaderError::ImportFailure {
                path: path.to_path_buf(),
                reason: format!("not valid UTF-8: {}", e),
            }),
            // High bit is stripped, matching 7-bit ASCII decoders
            Encoding::Ascii => Ok(bytes.into_iter().map(|b| (b & 0x7f) as char).collect()),
            Encoding::Latin1 => Ok(bytes.into_iter().map(char::from).collect()),
        }
    }

    fn encode(self, text: &str) -> Vec<u8> {
        match self {
            Encoding::Utf8 => text.as_bytes().to_vec(),
            Encoding::Ascii => text
                .chars()
                .map(|c| if c.is_ascii() { c as u8 } else { b'?' })
                .collect(),
            Encoding::Latin1 => text
                .chars()
                .map(|c| u8::try_from(u32::from(c)).unwrap_or(b'?'))
                .collect(),
        }
    }
}

/// Readable and writable text resource
pub trait Resource: Send + Sync {
    fn read(&self, encoding: Encoding) -> LoaderResult<String>;

    fn write(&self, text: &str, encoding: Encoding) -> LoaderResult<()>;

    fn append(&self, text: &str, encoding: Encoding) -> LoaderResult<()>;

    fn path(&self) -> &Path;
}

/// Resource backed by a file on the host filesystem
#[derive(Debug, Clone)]
pub struct FileResource {
    path: PathBuf,
}

impl FileResource {
    /// Wrap an existing (or not yet existing) file without touching disk
    pub fn new<P: Into<PathBuf>>(path: P) -> Self {
        Self { path: path.into() }
    }

    /// Wrap a file, creating its parent directory and an empty file if the parent is missing
    pub fn make<P: Into<PathBuf>>(path: P) -> LoaderResult<Self> {
        let resource = Self::new(path);
        if let Some(parent) = resource.path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                fs::create_dir_all(parent)?;
                fs::write(&resource.path, b"")?;
            }
        }
        Ok(resource)
    }
}

impl Resource for FileResource {
    fn read(&self, encoding: Encoding) -> LoaderResult<String> {
        let bytes = fs::read(&self.path).map_err(|e| LoaderError::ImportFailure {
            path: self.path.clone(),
            reason: e.to_string(),
        })?;
        encoding.decode(bytes, &self.path)
    }

    fn write(&self, text: &str, encoding: Encoding) -> LoaderResult<()> {
        fs::write(&self.path, encoding.encode(text))?;
        Ok(())
    }

    fn append(&self, text: &str, encoding: Encoding) -> LoaderResult<()> {
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        file.write_all(&encoding.encode(text))?;
        Ok(())
    }

    fn path(&self) -> &Path {
        &self.path
    }
}
