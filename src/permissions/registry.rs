/*!
 * Permission Registry
 * Catalogue of permission kinds and manifest summaries
 */

use super::types::PermissionKind;
use crate::manifest::{ApplicationManifest, Manifest};
use serde::Serialize;

/// One requested permission with its user-facing description
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PermissionSummary {
    pub kind: PermissionKind,
    pub description: &'static str,
}

/// Permissions an application asks for, ready for a consent surface
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ApplicationPermissions {
    pub application: String,
    pub requested: Vec<PermissionSummary>,
}

/// Declarative registry; enforcement belongs to a [`PermissionGate`](super::PermissionGate)
#[derive(Debug, Clone, Copy, Default)]
pub struct PermissionRegistry;

impl PermissionRegistry {
    pub fn new() -> Self {
        Self
    }

    pub fn kinds(&self) -> &'static [PermissionKind] {
        &PermissionKind::ALL
    }

    pub fn describe(&self, kind: PermissionKind) -> &'static str {
        kind.describe()
    }

    /// Deduplicated, ordinal-ordered summary of a manifest's requests
    pub fn summarize(&self, manifest: &ApplicationManifest) -> ApplicationPermissions {
        let mut kinds = manifest.requires_permissions.clone();
        kinds.sort();
        kinds.dedup();

        ApplicationPermissions {
            application: manifest.display_name().to_string(),
            requested: kinds
                .into_iter()
                .map(|kind| PermissionSummary {
                    kind,
                    description: kind.describe(),
                })
                .collect(),
        }
    }
}
