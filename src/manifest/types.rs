/*!
 * Manifest Types
 * Application and library manifest shapes
 */

use crate::permissions::PermissionKind;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Fields every manifest variant carries
pub trait Manifest {
    fn display_name(&self) -> &str;

    fn dependencies(&self) -> &[String];

    /// Case-insensitive match against the identifier segment used to request it
    fn answers_to(&self, requested: &str) -> bool {
        self.display_name().to_lowercase() == requested.to_lowercase()
    }
}

/// Manifest at the root of an application
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ApplicationManifest {
    pub display_name: String,
    /// Icon directory, relative to the manifest
    pub icon: Option<String>,
    pub entry_point: Option<String>,
    pub requires_permissions: Vec<PermissionKind>,
    pub dependencies: Vec<String>,
}

/// Manifest at the root of a library
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LibraryManifest {
    pub display_name: String,
    pub index: Option<String>,
    pub dependencies: Vec<String>,
    pub requires_native: bool,
    /// Submodule key to path relative to the library directory
    pub modules: BTreeMap<String, String>,
}

impl Manifest for ApplicationManifest {
    fn display_name(&self) -> &str {
        &self.display_name
    }

    fn dependencies(&self) -> &[String] {
        &self.dependencies
    }
}

impl Manifest for LibraryManifest {
    fn display_name(&self) -> &str {
        &self.display_name
    }

    fn dependencies(&self) -> &[String] {
        &self.dependencies
    }
}
