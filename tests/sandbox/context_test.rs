/*!
 * Capability Context Tests
 * What a unit can see of its host, and nothing more
 */

use crate::common::Fixture;
use lotus_runtime::{HostEnvironment, HostStreams, Loader};
use pretty_assertions::assert_eq;

#[test]
fn test_process_context_snapshot() {
    let fixture = Fixture::new();
    let entry = fixture.write(
        "app/main.src",
        r#"
        exports.argv = Context.argv;
        exports.user = Context.user;
        exports.root = Context.root;
        exports.flag = Context.env.LOTUS_FLAG;
        exports.app = Context.appId;
        exports.pid = Context.procId > 0;
        "#,
    );
    let host = HostEnvironment::capture()
        .with_argv(["--verbose", "input.txt"])
        .with_user("tester")
        .with_root("/srv/app")
        .with_env_var("LOTUS_FLAG", "on");
    let loader = Loader::builder(fixture.config().with_app_id("demo").build())
        .with_host(host)
        .build();

    let value = loader.run_entry(&entry).unwrap().to_json();
    assert_eq!(
        value,
        serde_json::json!({
            "argv": ["--verbose", "input.txt"],
            "user": "tester",
            "root": "/srv/app",
            "flag": "on",
            "app": "demo",
            "pid": true
        })
    );
}

#[test]
fn test_streams_are_injected() {
    let fixture = Fixture::new();
    let entry = fixture.write(
        "app/main.src",
        r#"
        let first = Context.stdin.readLine();
        let second = Context.stdin.readLine();
        Context.stdout.write("got ", first);
        Context.stderr.write("warn");
        console.log("done", 1);
        exports.eof = Context.stdin.readLine() == null;
        exports.second = second;
        "#,
    );
    let (streams, stdout, stderr) = HostStreams::capture("alpha\nbeta\n");
    let loader = Loader::builder(fixture.config().build())
        .with_streams(streams)
        .build();

    let value = loader.run_entry(&entry).unwrap();
    assert_eq!(stdout.contents(), "got alphadone 1\n");
    assert_eq!(stderr.contents(), "warn");
    assert_eq!(value.get("second").unwrap().as_str(), Some("beta"));
    assert!(value.get("eof").unwrap().is_truthy());
}

#[test]
fn test_units_do_not_share_globals() {
    let fixture = Fixture::new();
    fixture.write("app/first.src", "let secret = 42;\nexports.ok = true;");
    fixture.write("app/second.src", "exports.leak = secret;");
    let (loader, _) = fixture.loader();
    let main = fixture.requester("app/main.src");

    assert!(loader.require(&main, "./first").is_ok());
    let err = loader.require(&main, "./second").unwrap_err();
    assert_eq!(err.kind(), "execution_fault");
}
