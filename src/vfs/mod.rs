/*!
 * Virtual File System Module
 * Path utility and file resources used by the loader
 */

pub mod local;
pub mod paths;

// Re-exports
pub use local::{Encoding, FileResource, Resource};
pub use paths::{PathDialect, PathUtility};
