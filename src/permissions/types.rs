/*!
 * Permission Types
 * Declarable capability categories for applications
 */

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Permission parsing errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PermissionError {
    #[error("Unknown permission '{0}'")]
    Unknown(String),
}

/// Capability category an application may ask the user for
///
/// Manifests may name a kind (`"network"`) or use its ordinal (`2`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum PermissionKind {
    FileSystem,
    HardwareInfo,
    Network,
    Camera,
    Microphone,
    Location,
    Notifications,
    UserInfo,
    SystemSettings,
    PowerSettings,
    ApplicationData,
}

impl PermissionKind {
    /// Every kind, in ordinal order
    pub const ALL: [PermissionKind; 11] = [
        PermissionKind::FileSystem,
        PermissionKind::HardwareInfo,
        PermissionKind::Network,
        PermissionKind::Camera,
        PermissionKind::Microphone,
        PermissionKind::Location,
        PermissionKind::Notifications,
        PermissionKind::UserInfo,
        PermissionKind::SystemSettings,
        PermissionKind::PowerSettings,
        PermissionKind::ApplicationData,
    ];

    pub fn name(self) -> &'static str {
        match self {
            PermissionKind::FileSystem => "filesystem",
            PermissionKind::HardwareInfo => "hardware-info",
            PermissionKind::Network => "network",
            PermissionKind::Camera => "camera",
            PermissionKind::Microphone => "microphone",
            PermissionKind::Location => "location",
            PermissionKind::Notifications => "notifications",
            PermissionKind::UserInfo => "user-info",
            PermissionKind::SystemSettings => "system-settings",
            PermissionKind::PowerSettings => "power-settings",
            PermissionKind::ApplicationData => "application-data",
        }
    }

    /// Fixed user-facing description
    pub fn describe(self) -> &'static str {
        match self {
            PermissionKind::FileSystem => {
                "Allow the process read and write to and from files, as well as access their metadata"
            }
            PermissionKind::HardwareInfo => "Allow the process to view hardware-related information",
            PermissionKind::Network => "Allow the process to perform network-related tasks",
            PermissionKind::Camera => "Allow the processes to access the system's cameras",
            PermissionKind::Microphone => "Allow the process to access the system's microphones",
            PermissionKind::Location => "Allow the process to access location-related information",
            PermissionKind::Notifications => "Allow the process to read received notifications",
            PermissionKind::UserInfo => {
                "Allow the process to access advanced information about the current user"
            }
            PermissionKind::SystemSettings => {
                "Allow the process to read and change system settings for the current user"
            }
            PermissionKind::PowerSettings => "Allow the process to manage system power",
            PermissionKind::ApplicationData => {
                "Allow the system to read and change application settings such as permissions"
            }
        }
    }

    pub fn from_ordinal(ordinal: usize) -> Option<Self> {
        Self::ALL.get(ordinal).copied()
    }
}

impl fmt::Display for PermissionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for PermissionKind {
    type Err = PermissionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase();
        Self::ALL
            .iter()
            .copied()
            .find(|kind| kind.name() == wanted)
            .ok_or_else(|| PermissionError::Unknown(s.to_string()))
    }
}

impl Serialize for PermissionKind {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.name())
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum PermissionRepr {
    Ordinal(f64),
    Name(String),
}

impl<'de> Deserialize<'de> for PermissionKind {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        match PermissionRepr::deserialize(deserializer)? {
            PermissionRepr::Ordinal(n) if n >= 0.0 && n.fract() == 0.0 => {
                PermissionKind::from_ordinal(n as usize).ok_or_else(|| {
                    serde::de::Error::custom(format!("permission ordinal {} out of range", n))
                })
            }
            PermissionRepr::Ordinal(n) => Err(serde::de::Error::custom(format!(
                "invalid permission ordinal {}",
                n
            ))),
            PermissionRepr::Name(name) => name.parse().map_err(serde::de::Error::custom),
        }
    }
}
