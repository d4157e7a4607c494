/*!
 * Manifest Module
 * Application and library manifests, parsing, and library resolution
 */

pub mod parser;
pub mod resolver;
pub mod types;

// Re-exports
pub use resolver::{LibraryTarget, ManifestResolver};
pub use types::{ApplicationManifest, LibraryManifest, Manifest};
