/*!
 * Native Bridge Tests
 * require_native, module registry, and permission gates
 */

use crate::common::Fixture;
use lotus_runtime::{
    DeclaredGate, GateDecision, GateRequest, LoaderError, NativeModules, PermissionGate, Value,
};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

fn hash_modules(created: Arc<AtomicUsize>) -> NativeModules {
    let natives = NativeModules::new();
    natives.register("crypto/hash", move || {
        created.fetch_add(1, Ordering::SeqCst);
        Ok(Value::object([
            ("name", Value::str("hash")),
            (
                "twice",
                Value::native("twice", |args| match args.first() {
                    Some(Value::Number(n)) => Ok(Value::Number(n * 2.0)),
                    _ => Ok(Value::Null),
                }),
            ),
        ]))
    });
    natives
}

fn native_library(fixture: &Fixture, name: &str, requires_native: bool) {
    fixture.library(
        name,
        &format!(
            "{{displayName: '{}', index: 'index.src', requiresNative: {}}}",
            name, requires_native
        ),
        &[
            (
                "index.src",
                "let hash = require_native('./crypto/hash');\nexports.hash = hash;\nexports.doubled = hash.twice(21);\nexports.helper = require('./helper');",
            ),
            ("helper.src", "exports.hash = require_native('crypto/hash');"),
        ],
    );
}

#[test]
fn test_native_value_memoized_per_path() {
    let fixture = Fixture::new();
    native_library(&fixture, "alpha", true);
    native_library(&fixture, "beta", true);
    let created = Arc::new(AtomicUsize::new(0));
    let (builder, _, _) = fixture.builder();
    let loader = builder
        .with_native_modules(hash_modules(Arc::clone(&created)))
        .build();
    let main = fixture.requester("app/main.src");

    let alpha = loader.require(&main, "alpha").unwrap();
    let beta = loader.require(&main, "beta").unwrap();

    assert_eq!(alpha.get("doubled").unwrap().as_number(), Some(42.0));
    let hash = alpha.get("hash").unwrap();
    assert!(hash.same(&beta.get("hash").unwrap()));
    assert!(hash.same(&alpha.get("helper").unwrap().get("hash").unwrap()));
    assert_eq!(created.load(Ordering::SeqCst), 1);
    assert!(loader
        .cached(&fixture.library_root().join("native/crypto/hash"))
        .is_some());
}

#[test]
fn test_unknown_native_module() {
    let fixture = Fixture::new();
    native_library(&fixture, "alpha", true);
    let (loader, _) = fixture.loader();

    let err = loader
        .require(&fixture.requester("app/main.src"), "alpha")
        .unwrap_err();
    assert_eq!(
        err,
        LoaderError::NativeModuleNotFound {
            module: "crypto/hash".into(),
            path: fixture.library_root().join("native/crypto/hash"),
        }
    );
}

#[test]
fn test_plain_files_have_no_native_bridge() {
    let fixture = Fixture::new();
    fixture.write("app/tool.src", "exports.x = require_native('fs');");
    let (loader, _) = fixture.loader();

    let err = loader
        .require(&fixture.requester("app/main.src"), "./tool")
        .unwrap_err();
    assert!(matches!(
        err,
        LoaderError::ExecutionFault { ref message, .. } if message.contains("require_native")
    ));
}

#[test]
fn test_builtin_fs_module() {
    let fixture = Fixture::new();
    let target = fixture.root().join("out/note.txt");
    let source = format!(
        "let fs = require_native('fs');\nfs.write('{0}', 'hello');\nfs.append('{0}', ' world');\nexports.text = fs.read('{0}');\nexports.exists = fs.exists('{0}');",
        target.display()
    );
    fixture.library(
        "notes",
        "{displayName: 'notes', index: 'index.src'}",
        &[("index.src", source.as_str())],
    );
    let (loader, _) = fixture.loader();

    let value = loader
        .require(&fixture.requester("app/main.src"), "notes")
        .unwrap();
    assert_eq!(value.get("text").unwrap().as_str(), Some("hello world"));
    assert!(value.get("exists").unwrap().is_truthy());
}

#[test]
fn test_declared_gate_refuses_undeclared_native_use() {
    let fixture = Fixture::new();
    native_library(&fixture, "sneaky", false);
    let (builder, _, _) = fixture.builder();
    let loader = builder
        .with_gate(Arc::new(DeclaredGate))
        .with_native_modules(hash_modules(Arc::new(AtomicUsize::new(0))))
        .build();

    let err = loader
        .require(&fixture.requester("app/main.src"), "sneaky")
        .unwrap_err();
    assert_eq!(err.kind(), "permission_denied");
}

struct DenyLibrary(&'static str);

impl PermissionGate for DenyLibrary {
    fn check(&self, request: &GateRequest) -> GateDecision {
        match request {
            GateRequest::Library { identifier, .. } if identifier.starts_with(self.0) => {
                GateDecision::Deny("blocked by policy".into())
            }
            _ => GateDecision::Allow,
        }
    }
}

#[test]
fn test_custom_gate_blocks_library() {
    let fixture = Fixture::new();
    fixture.library(
        "secret",
        "{displayName: 'secret', index: 'index.src'}",
        &[("index.src", "Context.stdout.write('leaked');")],
    );
    let (builder, stdout, _) = fixture.builder();
    let loader = builder.with_gate(Arc::new(DenyLibrary("secret"))).build();

    let err = loader
        .require(&fixture.requester("app/main.src"), "secret")
        .unwrap_err();
    assert!(matches!(err, LoaderError::PermissionDenied { ref reason, .. } if reason == "blocked by policy"));
    assert_eq!(stdout.contents(), "");
}
