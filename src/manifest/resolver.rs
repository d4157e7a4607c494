/*!
 * Manifest Resolver
 * Maps library identifiers to entry points through library manifests
 */

use super::parser;
use super::types::{LibraryManifest, Manifest};
use crate::core::{LoaderError, LoaderResult, MANIFEST_FILE};
use crate::vfs::PathUtility;
use std::path::{Path, PathBuf};
use tracing::{debug, error};

/// Outcome of resolving a library identifier
#[derive(Debug, Clone, PartialEq)]
pub struct LibraryTarget {
    /// Identifier segment 0, as requested
    pub library: String,
    pub submodule: Option<String>,
    pub library_dir: PathBuf,
    pub manifest_path: PathBuf,
    /// Library index; seeds the unit's `fileName`
    pub entry_point: PathBuf,
    /// Unit to execute: the index, or the submodule's file
    pub target: PathBuf,
    pub manifest: LibraryManifest,
}

/// Resolves `library[/submodule]` identifiers under a library root
#[derive(Debug, Clone)]
pub struct ManifestResolver {
    library_root: PathBuf,
    paths: PathUtility,
}

impl ManifestResolver {
    pub fn new<P: Into<PathBuf>>(library_root: P, paths: PathUtility) -> Self {
        Self {
            library_root: library_root.into(),
            paths,
        }
    }

    pub fn library_root(&self) -> &Path {
        &self.library_root
    }

    /// Locate, parse and validate the manifest behind `identifier`
    pub fn resolve(&self, identifier: &str) -> LoaderResult<LibraryTarget> {
        // Empty segments are significant: an empty submodule names the bare library
        let segments: Vec<String> = identifier.split('/').map(str::to_string).collect();
        let library = match segments.first() {
            Some(segment) if !segment.is_empty() => segment.clone(),
            _ => {
                error!(identifier, "Library identifier has no library segment");
                return Err(LoaderError::InvalidIdentifier(identifier.to_string()));
            }
        };
        let submodule = segments.get(1).filter(|key| !key.is_empty()).cloned();
        if segments.len() > 2 {
            debug!(
                identifier,
                ignored = ?&segments[2..],
                "Ignoring identifier segments past the submodule"
            );
        }

        let library_dir = self.paths.join([self.library_root.as_path(), Path::new(&library)]);
        let manifest_path = library_dir.join(MANIFEST_FILE);
        let manifest: LibraryManifest = parser::load(&manifest_path, &library)?;

        let index = match manifest.index.as_deref() {
            Some(index) if !index.trim().is_empty() => index.to_string(),
            _ => {
                error!(library = %library, "Library doesn't provide an entry point");
                return Err(LoaderError::MissingEntryPoint {
                    library,
                    reason: "manifest declares no index".into(),
                });
            }
        };
        let entry_point = self.paths.join([library_dir.as_path(), Path::new(&index)]);

        if submodule.is_none() && !entry_point.exists() {
            error!(library = %library, entry = %entry_point.display(), "Library entry point is missing");
            return Err(LoaderError::MissingEntryPoint {
                library,
                reason: format!("{} does not exist", entry_point.display()),
            });
        }

        if !manifest.answers_to(&library) {
            error!(
                requested = %library,
                display_name = %manifest.display_name,
                "Mismatched names - may be a bogus library"
            );
            return Err(LoaderError::LibraryMismatch {
                requested: library,
                display_name: manifest.display_name.clone(),
            });
        }

        let target = match &submodule {
            Some(key) => match manifest.modules.get(key) {
                Some(relative) => self.paths.join([library_dir.as_path(), Path::new(relative)]),
                None => {
                    error!(library = %library, module = %key, "Unrecognised module");
                    return Err(LoaderError::UnknownModule {
                        library,
                        module: key.clone(),
                    });
                }
            },
            None => entry_point.clone(),
        };

        Ok(LibraryTarget {
            library,
            submodule,
            library_dir,
            manifest_path,
            entry_point,
            target,
            manifest,
        })
    }
}
