/*!
 * Loader Limits and Constants
 *
 * Centralized location for file names, defaults, and thresholds used across
 * resolution and execution. Grouped by domain.
 */

// =============================================================================
// MANIFESTS & LAYOUT
// =============================================================================

/// File name of every library and application manifest
pub const MANIFEST_FILE: &str = "manifest.json";

/// Default directory holding installed libraries
pub const DEFAULT_LIBRARY_ROOT: &str = "/usr/lib/lotus";

/// Reserved directory under the library root for host-native modules
pub const NATIVE_DIR: &str = "native";

/// Stem of the file a directory import redirects to
pub const INDEX_STEM: &str = "index";

/// Accepted source extensions, in priority order
pub const DEFAULT_SOURCE_EXTENSIONS: &[&str] = &[".src", ".alt"];

// =============================================================================
// ENVIRONMENT
// =============================================================================

/// Process-scoped application identifier read at loader construction
pub const ENV_APP_ID: &str = "appId";

/// Overrides the library root
pub const ENV_LIBRARY_ROOT: &str = "LOTUS_LIBRARY_ROOT";

/// Enables import tracing ("1" or "true")
pub const ENV_PRINT_IMPORTS: &str = "LOTUS_PRINT_IMPORTS";

/// Enables JSON log output ("1" or "true")
pub const ENV_TRACE_JSON: &str = "LOTUS_TRACE_JSON";

// =============================================================================
// EXECUTION
// =============================================================================

/// Maximum nested function calls inside one interpreter run
/// [SECURITY] Keeps runaway recursion in a unit from overflowing the host stack
pub const DEFAULT_MAX_CALL_DEPTH: usize = 256;

/// Maximum nested `require` chain length across units
pub const DEFAULT_MAX_REQUIRE_DEPTH: usize = 64;
