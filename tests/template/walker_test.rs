// tests/template/walker_test.rs
use erdprobe::config::{ProbeSettings, TextSettings};
use erdprobe::template::{Segment, TemplateWalker, When};
use erdprobe::value::{Bindings, Value};

fn walk(template: &Segment) -> Bindings {
    let probe = ProbeSettings::default();
    let text = TextSettings::default();
    TemplateWalker::new(&probe, &text).bindings_for(template)
}

fn when(test: &str, body: Segment) -> When {
    When {
        test: test.to_string(),
        body,
    }
}

#[test]
fn test_conditionals_and_nested_bodies() {
    let template = Segment::sequence(vec![
        Segment::text("SELECT * FROM t_order"),
        Segment::where_clause(Segment::sequence(vec![
            Segment::when("userId != null", Segment::text("AND user_id = #{userId}")),
            Segment::when(
                "status != null",
                Segment::sequence(vec![
                    Segment::text("AND status = #{status}"),
                    Segment::when("minAmount > 100", Segment::text("AND amount > #{minAmount}")),
                ]),
            ),
        ])),
    ]);

    let bindings = walk(&template);

    assert_eq!(bindings.get("userId"), Some(&Value::NonNullUnknown));
    assert_eq!(bindings.get("status"), Some(&Value::NonNullUnknown));
    assert_eq!(bindings.get("minAmount"), Some(&Value::Int(101)));
}

#[test]
fn test_choice_set_visits_every_branch() {
    let template = Segment::ChoiceSet {
        whens: vec![
            when("kind == 1", Segment::text("AND a = 1")),
            when("vip", Segment::text("AND b = 1")),
            when("kind == 2", Segment::text("AND c = 1")),
        ],
        default: Some(Box::new(Segment::when(
            "fallback > 0",
            Segment::text("AND d = 1"),
        ))),
    };

    let bindings = walk(&template);

    assert_eq!(bindings.get("vip"), Some(&Value::Bool(true)));
    assert_eq!(bindings.get("fallback"), Some(&Value::Int(1)));
    // the last branch visited wins on conflicts
    assert_eq!(bindings.get("kind"), Some(&Value::Int(2)));
}

#[test]
fn test_repeat_binds_single_null_element() {
    let template = Segment::Repeat {
        collection: "query.ids".to_string(),
        item: "id".to_string(),
        index: None,
        open: "(".to_string(),
        close: ")".to_string(),
        separator: ",".to_string(),
        body: Box::new(Segment::when("id.code != null", Segment::text("#{id.code}"))),
    };

    let bindings = walk(&template);

    assert_eq!(bindings.get("query.ids"), Some(&Value::Seq(vec![Value::Null])));
    assert_eq!(bindings.get("id"), None);
}

#[test]
fn test_dynamic_text_cues() {
    let template = Segment::dynamic(
        "SELECT * FROM ${tableName} ORDER BY ${sortColumn} ${sortDir} LIMIT ${start}, ${size}",
    );

    let bindings = walk(&template);

    assert_eq!(
        bindings.get("tableName"),
        Some(&Value::Str("t_placeholder".to_string()))
    );
    assert_eq!(bindings.get("sortColumn"), Some(&Value::Str("id".to_string())));
    assert_eq!(bindings.get("sortDir"), Some(&Value::Str("asc".to_string())));
    assert_eq!(bindings.get("start"), Some(&Value::Int(0)));
    assert_eq!(bindings.get("size"), Some(&Value::Int(10)));
}

#[test]
fn test_guard_value_survives_later_text() {
    let template = Segment::sequence(vec![
        Segment::when("name != ''", Segment::text("AND name = #{name}")),
        Segment::dynamic("AND alias = ${name}"),
    ]);

    let bindings = walk(&template);

    assert_eq!(
        bindings.get("name"),
        Some(&Value::Str("str_placeholder".to_string()))
    );
}

#[test]
fn test_pass_through_and_static_text_bind_nothing() {
    let template = Segment::sequence(vec![
        Segment::text("SELECT ${notAPlaceholder} FROM t"),
        Segment::PassThrough {
            text: "<if test=\"x != null\">".to_string(),
        },
    ]);

    assert!(walk(&template).is_empty());
}

#[test]
fn test_unparseable_guard_still_walks_body() {
    let template = Segment::when(
        "a == (",
        Segment::when("b == 3", Segment::text("AND b = #{b}")),
    );

    let bindings = walk(&template);

    assert_eq!(bindings.get("a"), None);
    assert_eq!(bindings.get("b"), Some(&Value::Int(3)));
}

#[test]
fn test_walks_share_one_context() {
    let probe = ProbeSettings::default();
    let text = TextSettings::default();
    let walker = TemplateWalker::new(&probe, &text);

    let mut bindings = Bindings::new();
    walker.walk(&Segment::when("x > 1", Segment::text("")), &mut bindings);
    walker.walk(&Segment::when("y == 'a'", Segment::text("")), &mut bindings);

    assert_eq!(bindings.len(), 2);
    assert_eq!(bindings.get("x"), Some(&Value::Int(2)));
}
