/*!
 * Application Permission Tests
 * Declared permissions are parsed and summarized, never enforced
 */

use crate::common::Fixture;
use lotus_runtime::manifest::parser;
use lotus_runtime::{ApplicationManifest, PermissionKind, PermissionRegistry};
use pretty_assertions::assert_eq;

#[test]
fn test_names_and_ordinals_mix() {
    let fixture = Fixture::new();
    let path = fixture.write(
        "app/manifest.json",
        "{displayName: 'camera-app', entryPoint: 'main.src', requiresPermissions: ['camera', 0, 'camera', 2]}",
    );

    let manifest: ApplicationManifest = parser::load(&path, "application").unwrap();
    let summary = PermissionRegistry::new().summarize(&manifest);

    assert_eq!(summary.application, "camera-app");
    assert_eq!(
        summary
            .requested
            .iter()
            .map(|p| p.kind)
            .collect::<Vec<_>>(),
        vec![
            PermissionKind::FileSystem,
            PermissionKind::Network,
            PermissionKind::Camera
        ]
    );
    assert_eq!(
        summary.requested[1].description,
        "Allow the process to perform network-related tasks"
    );
}

#[test]
fn test_unknown_permission_rejected() {
    let fixture = Fixture::new();
    let path = fixture.write(
        "app/manifest.json",
        "{displayName: 'x', requiresPermissions: ['teleport']}",
    );

    let err = parser::load::<ApplicationManifest>(&path, "application").unwrap_err();
    assert_eq!(err.kind(), "manifest_invalid");
}

#[test]
fn test_registry_lists_every_kind() {
    let registry = PermissionRegistry::new();
    assert_eq!(registry.kinds().len(), 11);
    for kind in registry.kinds() {
        assert!(!registry.describe(*kind).is_empty());
    }
}
