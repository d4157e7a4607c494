/*!
 * Error Types
 * Loader error taxonomy with thiserror, miette, and serde support
 */

use miette::Diagnostic;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use thiserror::Error;

/// Exit status used for every failure that does not carry its own code
pub const FAILURE_EXIT_CODE: i32 = 1;

/// Errors raised while resolving, validating, or executing a unit
#[derive(Error, Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Diagnostic)]
#[serde(tag = "error_type", content = "details", rename_all = "snake_case")]
pub enum LoaderError {
    #[error("Manifest wasn't found for library '{library}' at {}", .path.display())]
    #[diagnostic(
        code(loader::manifest_not_found),
        help("Libraries live under the library root as <name>/manifest.json.")
    )]
    ManifestNotFound { library: String, path: PathBuf },

    #[error("Manifest {} could not be parsed: {reason}", .path.display())]
    #[diagnostic(
        code(loader::manifest_invalid),
        help("Manifests use relaxed JSON: comments and trailing commas are fine, broken structure is not.")
    )]
    ManifestInvalid { path: PathBuf, reason: String },

    #[error("Mismatched names - '{requested}' may be a bogus library (manifest declares '{display_name}')")]
    #[diagnostic(
        code(loader::library_mismatch),
        help("The first identifier segment must match the manifest's displayName, ignoring case.")
    )]
    LibraryMismatch {
        requested: String,
        display_name: String,
    },

    #[error("Library '{library}' has no usable entry point: {reason}")]
    #[diagnostic(
        code(loader::missing_entry_point),
        help("Set 'index' in the library manifest to an existing source file.")
    )]
    MissingEntryPoint { library: String, reason: String },

    #[error("Unrecognised module '{module}' on library '{library}'")]
    #[diagnostic(
        code(loader::unknown_module),
        help("Submodules must be listed in the manifest's 'modules' mapping.")
    )]
    UnknownModule { library: String, module: String },

    #[error("Cannot import directory {} and it has no '{index}'", .directory.display())]
    #[diagnostic(
        code(loader::missing_index),
        help("Add an index source file to the directory or request a file inside it.")
    )]
    MissingIndex { directory: PathBuf, index: String },

    #[error("Unable to locate file {}", .path.display())]
    #[diagnostic(
        code(loader::file_not_located),
        help("No sibling file starts with the requested name and carries an accepted extension.")
    )]
    FileNotLocated { path: PathBuf },

    #[error("Unable to load file {}: {reason}", .path.display())]
    #[diagnostic(code(loader::import_failure))]
    ImportFailure { path: PathBuf, reason: String },

    #[error("Invalid module identifier '{0}'")]
    #[diagnostic(
        code(loader::invalid_identifier),
        help("Use a path ('./file', '/abs/file') or library syntax ('library/module').")
    )]
    InvalidIdentifier(String),

    #[error("Circular dependency: {} was required while it was still loading", .path.display())]
    #[diagnostic(
        code(loader::circular_dependency),
        help("Break the cycle by moving shared code into a third unit.")
    )]
    CircularDependency { path: PathBuf },

    #[error("Permission denied for {subject}: {reason}")]
    #[diagnostic(code(loader::permission_denied))]
    PermissionDenied { subject: String, reason: String },

    #[error("Native module '{module}' is not available at {}", .path.display())]
    #[diagnostic(
        code(loader::native_module_not_found),
        help("Native modules must be registered with the host before a library can load them.")
    )]
    NativeModuleNotFound { module: String, path: PathBuf },

    #[error("Unit {} failed: {message}", .path.display())]
    #[diagnostic(code(loader::execution_fault))]
    ExecutionFault { path: PathBuf, message: String },

    #[error("Unit requested exit with status {code}")]
    #[diagnostic(code(loader::exit))]
    Exit { code: i32 },

    #[error("I/O error: {0}")]
    #[diagnostic(
        code(loader::io_error),
        help("Filesystem operation failed. Check file permissions and paths.")
    )]
    Io(String),
}

impl LoaderError {
    /// Process exit status the top-level caller should terminate with
    pub fn exit_code(&self) -> i32 {
        match self {
            LoaderError::Exit { code } => *code,
            _ => FAILURE_EXIT_CODE,
        }
    }

    /// Stable snake_case name of the error kind
    pub fn kind(&self) -> &'static str {
        match self {
            LoaderError::ManifestNotFound { .. } => "manifest_not_found",
            LoaderError::ManifestInvalid { .. } => "manifest_invalid",
            LoaderError::LibraryMismatch { .. } => "library_mismatch",
            LoaderError::MissingEntryPoint { .. } => "missing_entry_point",
            LoaderError::UnknownModule { .. } => "unknown_module",
            LoaderError::MissingIndex { .. } => "missing_index",
            LoaderError::FileNotLocated { .. } => "file_not_located",
            LoaderError::ImportFailure { .. } => "import_failure",
            LoaderError::InvalidIdentifier(_) => "invalid_identifier",
            LoaderError::CircularDependency { .. } => "circular_dependency",
            LoaderError::PermissionDenied { .. } => "permission_denied",
            LoaderError::NativeModuleNotFound { .. } => "native_module_not_found",
            LoaderError::ExecutionFault { .. } => "execution_fault",
            LoaderError::Exit { .. } => "exit",
            LoaderError::Io(_) => "io_error",
        }
    }
}

impl From<std::io::Error> for LoaderError {
    fn from(err: std::io::Error) -> Self {
        LoaderError::Io(err.to_string())
    }
}

/// Result type for loader operations
pub type LoaderResult<T> = std::result::Result<T, LoaderError>;
