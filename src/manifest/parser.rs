/*!
 * Manifest Parser
 * Relaxed object notation (JSON5) loading for manifest files
 */

use crate::core::{LoaderError, LoaderResult};
use crate::vfs::{Encoding, FileResource, Resource};
use serde::de::DeserializeOwned;
use std::path::Path;
use tracing::{debug, error};

/// Parse manifest text; `path` is only used for error reporting
pub fn parse_str<M: DeserializeOwned>(text: &str, path: &Path) -> LoaderResult<M> {
    json5::from_str(text).map_err(|e| {
        error!(path = %path.display(), error = %e, "Manifest is not valid");
        LoaderError::ManifestInvalid {
            path: path.to_path_buf(),
            reason: e.to_string(),
        }
    })
}

/// Read and parse the manifest at `path` on behalf of `owner`
pub fn load<M: DeserializeOwned>(path: &Path, owner: &str) -> LoaderResult<M> {
    if !path.is_file() {
        error!(owner, path = %path.display(), "Manifest wasn't found");
        return Err(LoaderError::ManifestNotFound {
            library: owner.to_string(),
            path: path.to_path_buf(),
        });
    }

    let text = FileResource::new(path).read(Encoding::Utf8)?;
    debug!(path = %path.display(), bytes = text.len(), "Parsing manifest");
    parse_str(&text, path)
}
