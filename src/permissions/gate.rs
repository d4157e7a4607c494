/*!
 * Permission Gate
 * Enforcement hook consulted before library and native loads
 */

use crate::core::{LoaderError, LoaderResult};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use tracing::warn;

/// Load about to happen
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "type")]
pub enum GateRequest {
    /// A library unit, after its manifest validated
    Library {
        identifier: String,
        manifest: PathBuf,
        requires_native: bool,
    },
    /// A native module requested through `require_native`
    Native {
        module: String,
        path: PathBuf,
        library: PathBuf,
        requires_native: bool,
    },
}

impl GateRequest {
    /// Human-readable subject for denials
    pub fn subject(&self) -> String {
        match self {
            GateRequest::Library { identifier, .. } => format!("library '{}'", identifier),
            GateRequest::Native { module, .. } => format!("native module '{}'", module),
        }
    }
}

/// Gate verdict
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GateDecision {
    Allow,
    Deny(String),
}

impl GateDecision {
    pub fn deny(reason: impl Into<String>) -> Self {
        GateDecision::Deny(reason.into())
    }

    pub fn is_allowed(&self) -> bool {
        matches!(self, GateDecision::Allow)
    }
}

/// Decides whether a load may proceed
pub trait PermissionGate: Send + Sync {
    fn check(&self, request: &GateRequest) -> GateDecision;

    /// Check and convert a refusal into `PermissionDenied`
    fn enforce(&self, request: &GateRequest) -> LoaderResult<()> {
        match self.check(request) {
            GateDecision::Allow => Ok(()),
            GateDecision::Deny(reason) => {
                let subject = request.subject();
                warn!(subject = %subject, reason = %reason, "Permission denied");
                Err(LoaderError::PermissionDenied { subject, reason })
            }
        }
    }
}

/// Allows everything; declarations stay advisory
#[derive(Debug, Clone, Copy, Default)]
pub struct AdvisoryGate;

impl PermissionGate for AdvisoryGate {
    fn check(&self, _request: &GateRequest) -> GateDecision {
        GateDecision::Allow
    }
}

/// Holds libraries to their manifest: no native bridge without `requiresNative`
#[derive(Debug, Clone, Copy, Default)]
pub struct DeclaredGate;

impl PermissionGate for DeclaredGate {
    fn check(&self, request: &GateRequest) -> GateDecision {
        match request {
            GateRequest::Native {
                requires_native: false,
                library,
                ..
            } => GateDecision::deny(format!(
                "library at {} does not declare requiresNative",
                library.display()
            )),
            _ => GateDecision::Allow,
        }
    }
}
