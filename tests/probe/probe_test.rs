// tests/probe/probe_test.rs
use erdprobe::config::ProbeSettings;
use erdprobe::expr::parse;
use erdprobe::probe::Prober;
use erdprobe::value::{Bindings, Value};
use std::collections::BTreeMap;

fn probe(source: &str) -> Bindings {
    let settings = ProbeSettings::default();
    let mut bindings = Bindings::new();
    Prober::new(&settings)
        .probe_source(source, &mut bindings)
        .unwrap();
    bindings
}

#[test]
fn test_equality_binds_the_literal() {
    assert_eq!(probe("x == 5").get("x"), Some(&Value::Int(5)));
    assert_eq!(
        probe("name == 'bob'").get("name"),
        Some(&Value::Str("bob".to_string()))
    );
    assert_eq!(probe("flag eq true").get("flag"), Some(&Value::Bool(true)));
}

#[test]
fn test_not_equal_numeric_is_literal_plus_one() {
    assert_eq!(probe("x != 3").get("x"), Some(&Value::Int(4)));
    assert_eq!(probe("3 != x").get("x"), Some(&Value::Int(4)));
}

#[test]
fn test_ordering_operators() {
    assert_eq!(probe("x > 7").get("x"), Some(&Value::Int(8)));
    assert_eq!(probe("x >= 7").get("x"), Some(&Value::Int(8)));
    assert_eq!(probe("x < 7").get("x"), Some(&Value::Int(6)));
    assert_eq!(probe("x <= 7").get("x"), Some(&Value::Int(6)));
}

#[test]
fn test_ordering_on_strings() {
    assert_eq!(
        probe("code > 'a'").get("code"),
        Some(&Value::Str("a_greater".to_string()))
    );
    assert_eq!(
        probe("code < 'a'").get("code"),
        Some(&Value::Str("a_less".to_string()))
    );
}

#[test]
fn test_bare_reference_under_connective_is_true() {
    let bindings = probe("enabled && count > 1");
    assert_eq!(bindings.get("enabled"), Some(&Value::Bool(true)));
    assert_eq!(bindings.get("count"), Some(&Value::Int(2)));

    assert_eq!(probe("enabled").get("enabled"), Some(&Value::Bool(true)));
}

#[test]
fn test_size_binds_a_sequence() {
    let bindings = probe("items.size > 0");
    assert!(matches!(bindings.get("items"), Some(Value::Seq(items)) if !items.is_empty()));

    let bindings = probe("items.size() != 1");
    assert!(matches!(bindings.get("items"), Some(Value::Seq(items)) if items.len() == 2));
}

#[test]
fn test_chain_builds_nested_mappings() {
    let bindings = probe("a.b.c == 1");

    let mut b = BTreeMap::new();
    b.insert("c".to_string(), Value::Int(1));
    let mut a = BTreeMap::new();
    a.insert("b".to_string(), Value::Map(b));

    assert_eq!(bindings.get("a"), Some(&Value::Map(a)));
    assert_eq!(bindings.get("a.b.c"), Some(&Value::Int(1)));
}

#[test]
fn test_not_empty_string_uses_sentinel() {
    let bindings = probe("name != null and name != ''");
    assert_eq!(
        bindings.get("name"),
        Some(&Value::Str("str_placeholder".to_string()))
    );
}

#[test]
fn test_status_scenario() {
    let bindings = probe("status != null and status != '' or status == 0 && status > 100");
    match bindings.get("status") {
        Some(Value::Int(n)) => assert!(*n > 100, "status bound to {n}"),
        other => panic!("status bound to {other:?}"),
    }
}

#[test]
fn test_two_comparisons_under_and() {
    let bindings = probe("x > 0 && y < 1");
    assert_eq!(bindings.get("x"), Some(&Value::Int(1)));
    assert_eq!(bindings.get("y"), Some(&Value::Int(0)));
}

#[test]
fn test_probing_is_deterministic() {
    let expr = parse("user.age >= 18 and (role == 'admin' or tags.size > 0)").unwrap();
    let settings = ProbeSettings::default();
    let prober = Prober::new(&settings);

    let mut first = Bindings::new();
    let mut second = Bindings::new();
    prober.probe(&expr, &mut first);
    prober.probe(&expr, &mut second);

    assert_eq!(first, second);
}

#[test]
fn test_probed_guards_hold() {
    for source in [
        "x == 5",
        "x != 3",
        "x > 0 && y < 1",
        "name != null and name != ''",
        "a.b.c == 1",
        "items.size > 0",
        "enabled",
        "!deleted",
        "status != null and status != '' or status == 0 && status > 100",
    ] {
        let bindings = probe(source);
        let expr = parse(source).unwrap();
        assert!(expr.holds(&bindings), "{source} does not hold under {bindings:?}");
    }
}

#[test]
fn test_custom_sentinel() {
    let settings = ProbeSettings {
        not_empty_sentinel: "filled".to_string(),
        ..ProbeSettings::default()
    };
    let mut bindings = Bindings::new();
    Prober::new(&settings)
        .probe_source("title != ''", &mut bindings)
        .unwrap();
    assert_eq!(bindings.get("title"), Some(&Value::Str("filled".to_string())));
}

#[test]
fn test_malformed_expression_is_rejected() {
    let settings = ProbeSettings::default();
    let mut bindings = Bindings::new();
    assert!(Prober::new(&settings)
        .probe_source("x == (1", &mut bindings)
        .is_err());
    assert!(bindings.is_empty());
}

#[test]
fn test_not_equal_on_boolean_and_text() {
    assert_eq!(probe("flag != true").get("flag"), Some(&Value::Bool(false)));
    assert_eq!(probe("flag neq false").get("flag"), Some(&Value::Bool(true)));
    assert_eq!(
        probe("code != 'x'").get("code"),
        Some(&Value::Str(String::new()))
    );
}

#[test]
fn test_not_equal_to_a_non_null_property_binds_null() {
    let bindings = probe("b != null and a != b");
    assert_eq!(bindings.get("b"), Some(&Value::NonNullUnknown));
    assert_eq!(bindings.get("a"), Some(&Value::Null));
}

#[test]
fn test_negated_literal_feeds_the_comparison() {
    assert_eq!(probe("x > -2").get("x"), Some(&Value::Int(-1)));
    assert_eq!(probe("x <= -2").get("x"), Some(&Value::Int(-3)));
    assert_eq!(probe("x != -1.5").get("x"), Some(&Value::Float(-0.5)));
}

#[test]
fn test_comparison_under_not_still_binds() {
    assert_eq!(probe("!(x == 1)").get("x"), Some(&Value::Int(1)));
    assert!(probe("!null").is_empty());
}
