/*!
 * Permissions Module
 * Permission kinds, the declarative registry, and the load-time gate
 *
 * Application permissions are metadata for a consent surface. Enforcement
 * happens only through a [`PermissionGate`]; the default [`AdvisoryGate`]
 * allows every load.
 */

pub mod gate;
pub mod registry;
pub mod types;

// Re-export commonly used items
pub use gate::{AdvisoryGate, DeclaredGate, GateDecision, GateRequest, PermissionGate};
pub use registry::{ApplicationPermissions, PermissionRegistry, PermissionSummary};
pub use types::{PermissionError, PermissionKind};
