/*!
 * Library Require Tests
 * Manifest-backed library resolution through the loader
 */

use crate::common::Fixture;
use lotus_runtime::LoaderError;
use pretty_assertions::assert_eq;

const INDEX: &str = "exports.name = fileName; exports.kind = requireType;";
const TRIG: &str =
    "exports.name = fileName; exports.context = Context.fileName; exports.unit = 'trig';";

fn mathutils(fixture: &Fixture, manifest: &str) {
    fixture.library(
        "mathutils",
        manifest,
        &[("index.src", INDEX), ("trig.src", TRIG)],
    );
}

#[test]
fn test_submodule_sees_own_file_and_library_entry_point() {
    let fixture = Fixture::new();
    mathutils(
        &fixture,
        r#"{displayName: "mathutils", index: "index.src", modules: {"trig": "trig.src"}}"#,
    );
    let (loader, _) = fixture.loader();

    let value = loader
        .require(&fixture.requester("app/main.src"), "mathutils/trig")
        .unwrap();
    let index = fixture.library_root().join("mathutils/index.src");
    let trig = fixture.library_root().join("mathutils/trig.src");
    assert_eq!(value.get("unit").unwrap().as_str(), Some("trig"));
    assert_eq!(
        value.get("name").unwrap().as_str(),
        Some(trig.display().to_string().as_str())
    );
    assert_eq!(
        value.get("context").unwrap().as_str(),
        Some(index.display().to_string().as_str())
    );
}

#[test]
fn test_bare_library_runs_index() {
    let fixture = Fixture::new();
    mathutils(
        &fixture,
        r#"{displayName: "mathutils", index: "index.src", modules: {"trig": "trig.src"}}"#,
    );
    let (loader, _) = fixture.loader();

    let value = loader
        .require(&fixture.requester("app/main.src"), "mathutils")
        .unwrap();
    let index = fixture.library_root().join("mathutils/index.src");
    assert_eq!(
        value.get("name").unwrap().as_str(),
        Some(index.display().to_string().as_str())
    );
    assert_eq!(value.get("kind").unwrap().as_str(), Some("Library"));
}

#[test]
fn test_missing_index() {
    let fixture = Fixture::new();
    mathutils(&fixture, r#"{displayName: "mathutils"}"#);
    let (loader, _) = fixture.loader();

    let err = loader
        .require(&fixture.requester("app/main.src"), "mathutils")
        .unwrap_err();
    assert_eq!(err.kind(), "missing_entry_point");
}

#[test]
fn test_display_name_ignores_case() {
    let fixture = Fixture::new();
    mathutils(&fixture, r#"{displayName: "Mathutils", index: "index.src"}"#);
    let (loader, _) = fixture.loader();

    assert!(loader
        .require(&fixture.requester("app/main.src"), "mathutils")
        .is_ok());
}

#[test]
fn test_display_name_mismatch() {
    let fixture = Fixture::new();
    mathutils(&fixture, r#"{displayName: "statistics", index: "index.src"}"#);
    let (loader, _) = fixture.loader();

    let err = loader
        .require(&fixture.requester("app/main.src"), "mathutils")
        .unwrap_err();
    assert_eq!(
        err,
        LoaderError::LibraryMismatch {
            requested: "mathutils".into(),
            display_name: "statistics".into(),
        }
    );
}

#[test]
fn test_unknown_submodule() {
    let fixture = Fixture::new();
    mathutils(
        &fixture,
        r#"{displayName: "mathutils", index: "index.src", modules: {"trig": "trig.src"}}"#,
    );
    let (loader, _) = fixture.loader();

    let err = loader
        .require(&fixture.requester("app/main.src"), "mathutils/algebra")
        .unwrap_err();
    assert_eq!(
        err,
        LoaderError::UnknownModule {
            library: "mathutils".into(),
            module: "algebra".into(),
        }
    );
}

#[test]
fn test_missing_and_invalid_manifests() {
    let fixture = Fixture::new();
    fixture.library("broken", "{ displayName: ", &[]);
    let (loader, _) = fixture.loader();
    let main = fixture.requester("app/main.src");

    assert_eq!(
        loader.require(&main, "absent").unwrap_err().kind(),
        "manifest_not_found"
    );
    assert_eq!(
        loader.require(&main, "broken").unwrap_err().kind(),
        "manifest_invalid"
    );
}

#[test]
fn test_library_files_require_siblings() {
    let fixture = Fixture::new();
    fixture.library(
        "strings",
        "{displayName: 'strings', index: 'index.src'}",
        &[
            ("index.src", "exports.pad = require('./impl/pad').pad;"),
            (
                "impl/pad.src",
                "fn pad(s) { return '[' + s + ']'; }\nexports.pad = pad;\nexports.kind = requireType;",
            ),
        ],
    );
    fixture.write(
        "app/main.src",
        "let strings = require('strings');\nexports.out = strings.pad('x');",
    );
    let (loader, _) = fixture.loader();

    let value = loader.run_entry(&fixture.root().join("app/main.src")).unwrap();
    assert_eq!(value.get("out").unwrap().as_str(), Some("[x]"));
}

#[test]
fn test_library_shared_between_requesters() {
    let fixture = Fixture::new();
    mathutils(&fixture, r#"{displayName: "mathutils", index: "index.src"}"#);
    let (loader, _) = fixture.loader();

    let first = loader
        .require(&fixture.requester("app/a.src"), "mathutils")
        .unwrap();
    let unknown = loader
        .require(&fixture.requester("other/b.src"), "mathutils/extra/ignored")
        .unwrap_err();
    assert_eq!(unknown.kind(), "unknown_module");

    let again = loader
        .require(&fixture.requester("other/b.src"), "mathutils")
        .unwrap();
    assert!(first.same(&again));
}
