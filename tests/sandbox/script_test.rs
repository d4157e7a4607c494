/*!
 * Script Language Tests
 * Units executed through the default executor
 */

use lotus_runtime::sandbox::Value;
use lotus_runtime::{CapabilityContext, LoaderError, ScriptExecutor, UnitExecutor};
use pretty_assertions::assert_eq;
use serde_json::json;
use std::path::Path;

fn run(source: &str) -> Result<Value, LoaderError> {
    let context = CapabilityContext::new(Value::Null, "/units/test.src");
    ScriptExecutor::new(64).execute(source, context, Path::new("/units/test.src"))
}

fn exports(source: &str) -> serde_json::Value {
    run(source).unwrap().to_json()
}

#[test]
fn test_closures_and_recursion() {
    let value = exports(
        r#"
        fn fib(n) {
            if (n < 2) { return n; }
            return fib(n - 1) + fib(n - 2);
        }
        fn counter() {
            let count = 0;
            return fn() { count = count + 1; return count; };
        }
        let next = counter();
        next();
        exports.fib = fib(10);
        exports.count = next();
        "#,
    );
    assert_eq!(value, json!({"fib": 55.0, "count": 2.0}));
}

#[test]
fn test_collections() {
    let value = exports(
        r#"
        let list = [1, 2];
        list.push(3);
        list[3] = 4;
        let total = 0;
        let i = 0;
        while (i < list.length) {
            total = total + list[i];
            i = i + 1;
        }
        let record = {name: "lotus", "tags": []};
        record.tags.push("unit");
        record.size = "abc".length;
        exports.total = total;
        exports.record = record;
        exports.missing = record.nothing;
        "#,
    );
    assert_eq!(
        value,
        json!({
            "total": 10.0,
            "record": {"name": "lotus", "tags": ["unit"], "size": 3.0},
            "missing": null
        })
    );
}

#[test]
fn test_operators() {
    let value = exports(
        r#"
        exports.concat = "n=" + 7;
        exports.logic = (1 < 2) && !(3 <= 2) || false;
        exports.modulo = 17 % 5;
        exports.negate = -(2 * 3);
        exports.equal = "a" == "a";
        exports.shortCircuit = null || "fallback";
        "#,
    );
    assert_eq!(
        value,
        json!({
            "concat": "n=7",
            "logic": true,
            "modulo": 2.0,
            "negate": -6.0,
            "equal": true,
            "shortCircuit": "fallback"
        })
    );
}

#[test]
fn test_runtime_errors_are_faults() {
    for source in [
        "missing();",
        "let x = 1; x();",
        "exports.y = {} - 1;",
        "undeclared = 1;",
        "fn forever(n) { return forever(n + 1); } forever(0);",
    ] {
        let err = run(source).unwrap_err();
        assert_eq!(err.kind(), "execution_fault", "source: {}", source);
    }
}

#[test]
fn test_thrown_values_render_in_message() {
    let err = run("throw {code: 7};").unwrap_err();
    match err {
        LoaderError::ExecutionFault { message, .. } => assert!(message.starts_with("Uncaught")),
        other => panic!("unexpected error {:?}", other),
    }
}

#[test]
fn test_comments_and_optional_semicolons() {
    let value = exports(
        "// leading comment\nlet a = 1 /* inline */\nexports.a = a\nexports.b = 'two'",
    );
    assert_eq!(value, json!({"a": 1.0, "b": "two"}));
}
