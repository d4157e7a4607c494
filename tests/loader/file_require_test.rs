/*!
 * File Require Tests
 * Relative, absolute and directory requests through the loader
 */

use crate::common::{canonical, Fixture};
use lotus_runtime::{Loader, LoaderError, RequireType, Value};
use pretty_assertions::assert_eq;
use std::collections::BTreeMap;
use std::fs;

#[test]
fn test_extension_priority() {
    let fixture = Fixture::new();
    fixture.write("app/src/helpers.src", "exports.from = 'src';");
    fixture.write("app/src/helpers.alt", "exports.from = 'alt';");
    let (loader, _) = fixture.loader();

    let value = loader
        .require(&fixture.requester("app/src/main.src"), "./helpers")
        .unwrap();
    assert_eq!(value.get("from").unwrap().as_str(), Some("src"));
}

#[test]
fn test_secondary_extension_used_when_primary_absent() {
    let fixture = Fixture::new();
    fixture.write("app/helpers.alt", "exports.from = 'alt';");
    let (loader, _) = fixture.loader();

    let value = loader
        .require(&fixture.requester("app/main.src"), "./helpers")
        .unwrap();
    assert_eq!(value.get("from").unwrap().as_str(), Some("alt"));
}

#[test]
fn test_file_units_see_canonical_file_name() {
    let fixture = Fixture::new();
    let unit = fixture.write(
        "app/util.src",
        "exports.name = fileName; exports.context = Context.fileName; exports.kind = requireType;",
    );
    let (loader, _) = fixture.loader();

    let value = loader
        .require(&fixture.requester("app/main.src"), "./util")
        .unwrap();
    let expected = canonical(&unit).display().to_string();
    assert_eq!(value.get("name").unwrap().as_str(), Some(expected.as_str()));
    assert_eq!(value.get("context").unwrap().as_str(), Some(expected.as_str()));
    assert_eq!(value.get("kind").unwrap().as_str(), Some("File"));
}

#[test]
fn test_nested_requires_resolve_from_requiring_unit() {
    let fixture = Fixture::new();
    fixture.write(
        "app/main.src",
        "exports.inner = require('./src/outer').inner;",
    );
    fixture.write("app/src/outer.src", "exports.inner = require('./deep/inner');");
    fixture.write("app/src/deep/inner.src", "exports.depth = 2;");
    let (loader, _) = fixture.loader();

    let value = loader
        .require(&fixture.requester("app/start.src"), "./main")
        .unwrap();
    let inner = value.get("inner").unwrap();
    assert_eq!(inner.get("depth").unwrap().as_number(), Some(2.0));
}

#[test]
fn test_absolute_request() {
    let fixture = Fixture::new();
    let target = fixture.write("elsewhere/tool.src", "exports.ok = true;");
    let (loader, _) = fixture.loader();

    let absolute = target.with_extension("").display().to_string();
    let value = loader
        .require(&fixture.requester("app/main.src"), &absolute)
        .unwrap();
    assert!(value.get("ok").unwrap().is_truthy());
}

#[test]
fn test_directory_redirects_to_index() {
    let fixture = Fixture::new();
    fixture.write("app/pkg/index.src", "exports.index = true;");
    fs::create_dir_all(fixture.root().join("app/empty")).unwrap();
    let (loader, _) = fixture.loader();
    let main = fixture.requester("app/main.src");

    let value = loader.require(&main, "./pkg").unwrap();
    assert!(value.get("index").unwrap().is_truthy());

    let err = loader.require(&main, "./empty").unwrap_err();
    assert_eq!(
        err,
        LoaderError::MissingIndex {
            directory: fixture.root().join("app/empty"),
            index: "index.src".into(),
        }
    );
}

#[test]
fn test_unlocatable_file() {
    let fixture = Fixture::new();
    fixture.write("app/notes.txt", "not a unit");
    let (loader, _) = fixture.loader();

    let err = loader
        .require(&fixture.requester("app/main.src"), "./notes")
        .unwrap_err();
    assert_eq!(
        err,
        LoaderError::FileNotLocated {
            path: fixture.root().join("app/notes"),
        }
    );
    assert_eq!(err.exit_code(), 1);
}

#[test]
fn test_matched_directory_is_import_failure() {
    let fixture = Fixture::new();
    fs::create_dir_all(fixture.root().join("app/data.src")).unwrap();
    let (loader, _) = fixture.loader();

    let err = loader
        .require(&fixture.requester("app/main.src"), "./data")
        .unwrap_err();
    assert!(matches!(
        err,
        LoaderError::ImportFailure { ref reason, .. } if reason == "Path specified is not a file"
    ));
}

#[test]
fn test_fault_stops_sibling_requires() {
    let fixture = Fixture::new();
    fixture.write(
        "app/main.src",
        "require('./bad');\nrequire('./sibling');",
    );
    let bad = fixture.write("app/bad.src", "throw 'broken';");
    fixture.write("app/sibling.src", "Context.stdout.write('sibling ran');");
    let (loader, stdout) = fixture.loader();

    let err = loader
        .require(&fixture.requester("app/start.src"), "./main")
        .unwrap_err();
    assert_eq!(
        err,
        LoaderError::ExecutionFault {
            path: canonical(&bad),
            message: "Uncaught broken".into(),
        }
    );
    assert_eq!(stdout.contents(), "");
    assert!(loader.cached(&fixture.root().join("app/sibling.src")).is_none());
    assert!(loader.cached(&fixture.root().join("app/main.src")).is_none());
}

#[test]
fn test_circular_require_detected() {
    let fixture = Fixture::new();
    let a = fixture.write("app/a.src", "exports.b = require('./b');");
    fixture.write("app/b.src", "exports.a = require('./a');");
    let (loader, _) = fixture.loader();

    let err = loader
        .require(&fixture.requester("app/main.src"), "./a")
        .unwrap_err();
    assert_eq!(err, LoaderError::CircularDependency { path: canonical(&a) });
    assert!(loader.cached_paths().is_empty());
}

#[test]
fn test_require_chain_limit() {
    let fixture = Fixture::new();
    for (unit, next) in [("one", "two"), ("two", "three"), ("three", "four")] {
        fixture.write(
            &format!("app/{}.src", unit),
            &format!("exports.next = require('./{}');", next),
        );
    }
    fixture.write("app/four.src", "exports.end = true;");
    let loader = Loader::new(fixture.config().with_max_require_depth(3).build());

    let err = loader
        .require(&fixture.requester("app/main.src"), "./one")
        .unwrap_err();
    assert!(matches!(
        err,
        LoaderError::ImportFailure { ref reason, .. } if reason.contains("deeper than 3")
    ));
}

#[test]
fn test_exit_status_surfaces() {
    let fixture = Fixture::new();
    fixture.write("app/quit.src", "Context.exit(4);\nexports.after = true;");
    let (loader, _) = fixture.loader();

    let err = loader
        .require(&fixture.requester("app/main.src"), "./quit")
        .unwrap_err();
    assert_eq!(err, LoaderError::Exit { code: 4 });
    assert_eq!(err.exit_code(), 4);
}

#[test]
fn test_syntax_error_is_execution_fault() {
    let fixture = Fixture::new();
    fixture.write("app/broken.src", "let = 1;");
    let (loader, _) = fixture.loader();

    let err = loader
        .require(&fixture.requester("app/main.src"), "./broken")
        .unwrap_err();
    assert_eq!(err.kind(), "execution_fault");
}

#[test]
fn test_run_with_extra_globals() {
    let fixture = Fixture::new();
    let unit = fixture.write(
        "app/plugin.src",
        "exports.kind = requireType; exports.greeting = greeting;",
    );
    let (loader, _) = fixture.loader();

    let mut extras = BTreeMap::new();
    extras.insert("greeting".to_string(), Value::str("hello"));
    extras.insert("requireType".to_string(), Value::str("Plugin"));

    let value = loader
        .run_with(&unit, &unit, RequireType::File, extras)
        .unwrap();
    assert_eq!(value.get("greeting").unwrap().as_str(), Some("hello"));
    assert_eq!(value.get("kind").unwrap().as_str(), Some("Plugin"));

    let again = loader.run(&unit, &unit, RequireType::File).unwrap();
    assert_eq!(again.get("greeting").unwrap().as_str(), Some("hello"));
}
