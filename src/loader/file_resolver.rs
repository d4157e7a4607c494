/*!
 * File Resolver
 * Relative and absolute requests to concrete source files
 */

use crate::core::{LoaderError, LoaderResult};
use crate::vfs::PathUtility;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, error};

/// Resolves file-style requests against the requesting unit's location
#[derive(Debug, Clone)]
pub struct FileResolver {
    paths: PathUtility,
    extensions: Vec<String>,
    index_file: String,
}

impl FileResolver {
    pub fn new(paths: PathUtility, extensions: Vec<String>, index_file: String) -> Self {
        Self {
            paths,
            extensions,
            index_file,
        }
    }

    /// Join the request onto the requester's directory, then locate the file
    ///
    /// Directories redirect to their index file. Otherwise the last segment is a
    /// name prefix: extensions are tried in configured order, and within one
    /// extension the first match in directory-listing order wins.
    pub fn resolve(&self, current: &Path, requested: &str) -> LoaderResult<PathBuf> {
        let joined = if Path::new(requested).is_absolute() || requested.starts_with('~') {
            self.paths.clean(requested)
        } else {
            self.paths.join([self.paths.up(current), PathBuf::from(requested)])
        };

        if joined.is_dir() {
            let index = joined.join(&self.index_file);
            if index.is_file() {
                return Ok(index);
            }
            error!(
                directory = %joined.display(),
                index = %self.index_file,
                "Cannot import directory without an index"
            );
            return Err(LoaderError::MissingIndex {
                directory: joined,
                index: self.index_file.clone(),
            });
        }

        let not_located = |joined: &Path| {
            error!(path = %joined.display(), "Unable to locate file");
            LoaderError::FileNotLocated {
                path: joined.to_path_buf(),
            }
        };

        let prefix = match joined.file_name() {
            Some(name) => name.to_string_lossy().into_owned(),
            None => return Err(not_located(&joined)),
        };
        let directory = joined.parent().unwrap_or_else(|| Path::new("/"));

        let names: Vec<String> = match fs::read_dir(directory) {
            Ok(entries) => entries
                .filter_map(|entry| entry.ok())
                .map(|entry| entry.file_name().to_string_lossy().into_owned())
                .filter(|name| name.starts_with(&prefix))
                .collect(),
            Err(e) => {
                debug!(directory = %directory.display(), error = %e, "Directory not listable");
                return Err(not_located(&joined));
            }
        };

        for extension in &self.extensions {
            if let Some(name) = names
                .iter()
                .find(|name| name.to_lowercase().ends_with(extension.as_str()))
            {
                return Ok(directory.join(name));
            }
        }

        Err(not_located(&joined))
    }
}
