/*!
 * Event Loop Tests
 * Timer callbacks drained after the entry unit returns
 */

use crate::common::Fixture;
use lotus_runtime::LoaderError;

#[test]
fn test_immediates_before_timers() {
    let fixture = Fixture::new();
    let entry = fixture.write(
        "app/main.src",
        r#"
        let out = Context.stdout;
        Timing.setTimeout(fn() { out.write('timeout;'); }, 5);
        Timing.setImmediate(fn(tag) { out.write(tag + ';'); }, 'first');
        Timing.setImmediate(fn() { out.write('second;'); });
        out.write('entry;');
        "#,
    );
    let (loader, stdout) = fixture.loader();

    loader.run_entry(&entry).unwrap();
    assert_eq!(loader.pending_tasks(), 3);
    assert_eq!(loader.run_event_loop().unwrap(), 3);
    assert_eq!(stdout.contents(), "entry;first;second;timeout;");
}

#[test]
fn test_interval_until_cleared() {
    let fixture = Fixture::new();
    let entry = fixture.write(
        "app/main.src",
        r#"
        let ticks = 0;
        let id = null;
        id = Timing.setInterval(fn() {
            ticks = ticks + 1;
            if (ticks == 3) { Timing.clearInterval(id); }
        }, 1);
        exports.ticks = fn() { return ticks; };
        "#,
    );
    let (loader, _) = fixture.loader();

    let exports = loader.run_entry(&entry).unwrap();
    assert_eq!(loader.run_event_loop().unwrap(), 3);
    let ticks = lotus_runtime::sandbox::script::call(&exports.get("ticks").unwrap(), vec![]).unwrap();
    assert_eq!(ticks.as_number(), Some(3.0));
}

#[test]
fn test_cleared_timeout_never_runs() {
    let fixture = Fixture::new();
    let entry = fixture.write(
        "app/main.src",
        "let id = Timing.setTimeout(fn() { Context.stdout.write('ran'); }, 1);\nTiming.clearTimeout(id);",
    );
    let (loader, stdout) = fixture.loader();

    loader.run_entry(&entry).unwrap();
    assert_eq!(loader.run_event_loop().unwrap(), 0);
    assert_eq!(stdout.contents(), "");
}

#[test]
fn test_callback_fault_surfaces() {
    let fixture = Fixture::new();
    let entry = fixture.write(
        "app/main.src",
        "Timing.setImmediate(fn() { throw 'late failure'; });\nTiming.setTimeout(fn() { Context.stdout.write('after'); }, 1);",
    );
    let (loader, stdout) = fixture.loader();

    loader.run_entry(&entry).unwrap();
    let err = loader.run_event_loop().unwrap_err();
    assert!(matches!(
        err,
        LoaderError::ExecutionFault { ref message, .. } if message.contains("late failure")
    ));
    assert_eq!(stdout.contents(), "");
}

#[test]
fn test_entry_runs_with_unknown_require_type() {
    let fixture = Fixture::new();
    let entry = fixture.write("app/main.src", "exports.kind = requireType;");
    let (loader, _) = fixture.loader();

    let value = loader.run_entry(&entry).unwrap();
    assert_eq!(value.get("kind").unwrap().as_str(), Some("unknown"));
}
