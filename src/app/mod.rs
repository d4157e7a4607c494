/*!
 * Application Module
 * Launching an application from its manifest
 */

pub mod launcher;

pub use launcher::{launch, locate_manifest, LaunchOptions, LaunchOutcome};
