/*!
 * Module Cache Tests
 * Execute-once semantics and export identity across spellings
 */

use crate::common::Fixture;
use proptest::prelude::*;

const COUNTED: &str = "Context.stdout.write('ran;');\nexports.items = [];";

#[test]
fn test_spellings_share_one_execution() {
    let fixture = Fixture::new();
    let unit = fixture.write("app/util.src", COUNTED);
    fixture.write("app/sub/placeholder.src", "");
    let (loader, stdout) = fixture.loader();
    let main = fixture.requester("app/main.src");

    let by_name = loader.require(&main, "./util").unwrap();
    let by_file = loader.require(&main, "./util.src").unwrap();
    let by_detour = loader.require(&main, "./sub/../util").unwrap();
    let by_path = loader
        .require(&main, &unit.display().to_string())
        .unwrap();

    assert!(by_name.same(&by_file));
    assert!(by_name.same(&by_detour));
    assert!(by_name.same(&by_path));
    assert_eq!(stdout.contents(), "ran;");

    let stats = loader.cache_stats();
    assert_eq!((stats.modules, stats.misses, stats.hits), (1, 1, 3));
}

#[test]
fn test_mutations_visible_to_later_requirers() {
    let fixture = Fixture::new();
    fixture.write("app/registry.src", "exports.items = [];");
    fixture.write(
        "app/producer.src",
        "require('./registry').items.push('from producer');",
    );
    fixture.write(
        "app/consumer.src",
        "require('./producer');\nexports.seen = require('./registry').items.length;",
    );
    let (loader, _) = fixture.loader();

    let value = loader
        .require(&fixture.requester("app/main.src"), "./consumer")
        .unwrap();
    assert_eq!(value.get("seen").unwrap().as_number(), Some(1.0));
}

#[test]
fn test_failed_unit_is_retried() {
    let fixture = Fixture::new();
    fixture.write("app/flaky.src", "throw 'not yet';");
    let (loader, _) = fixture.loader();
    let main = fixture.requester("app/main.src");

    assert!(loader.require(&main, "./flaky").is_err());
    fixture.write("app/flaky.src", "exports.ready = true;");
    let value = loader.require(&main, "./flaky").unwrap();
    assert!(value.get("ready").unwrap().is_truthy());
}

#[test]
fn test_loaders_are_independent() {
    let fixture = Fixture::new();
    fixture.write("app/util.src", COUNTED);
    let (first, first_out) = fixture.loader();
    let (second, second_out) = fixture.loader();
    let main = fixture.requester("app/main.src");

    let a = first.require(&main, "./util").unwrap();
    let b = second.require(&main, "./util").unwrap();
    assert!(!a.get("items").unwrap().same(&b.get("items").unwrap()));
    assert_eq!(first_out.contents(), "ran;");
    assert_eq!(second_out.contents(), "ran;");
}

fn spelling() -> impl Strategy<Value = String> {
    (
        0usize..3,
        prop::bool::ANY,
        prop::sample::select(vec!["util", "util.src", "uti", "u"]),
    )
        .prop_map(|(detours, dotted, name)| {
            let mut request = String::from(".");
            for _ in 0..detours {
                request.push_str("/sub/..");
            }
            if dotted {
                request.push_str("/.");
            }
            format!("{}/{}", request, name)
        })
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(24))]

    #[test]
    fn prop_cache_idempotent(requests in prop::collection::vec(spelling(), 1..6)) {
        let fixture = Fixture::new();
        fixture.write("app/util.src", COUNTED);
        let (loader, stdout) = fixture.loader();
        let main = fixture.requester("app/main.src");

        let first = loader.require(&main, &requests[0]).unwrap();
        for request in &requests[1..] {
            let again = loader.require(&main, request).unwrap();
            prop_assert!(first.same(&again));
        }
        prop_assert_eq!(stdout.contents(), "ran;");
        prop_assert_eq!(loader.cache_stats().modules, 1);
    }
}
