/*!
 * Lotus Runtime Library
 * Manifest-driven module loading for Lotus units
 */

pub mod app;
pub mod core;
pub mod loader;
pub mod manifest;
pub mod monitoring;
pub mod permissions;
pub mod sandbox;
pub mod vfs;

// Re-exports
pub use app::{launch, locate_manifest, LaunchOptions, LaunchOutcome};
pub use crate::core::{LoaderError, LoaderResult};
pub use loader::{
    CacheStats, HostEnvironment, HostStreams, Loader, LoaderBuilder, LoaderConfig,
    LoaderConfigBuilder, NativeBridge, NativeModules, RequireType,
};
pub use manifest::{ApplicationManifest, LibraryManifest, Manifest, ManifestResolver};
pub use monitoring::init_tracing;
pub use permissions::{
    AdvisoryGate, DeclaredGate, GateDecision, GateRequest, PermissionGate, PermissionKind,
    PermissionRegistry,
};
pub use sandbox::{CapabilityContext, ScriptExecutor, UnitExecutor, Value};
pub use vfs::{Encoding, FileResource, PathDialect, PathUtility, Resource};
