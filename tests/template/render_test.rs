// tests/template/render_test.rs
use erdprobe::config::{ProbeSettings, TextSettings};
use erdprobe::sql::strip_comments;
use erdprobe::template::{LiteralRenderer, RenderError, Segment, SqlRenderer, TemplateWalker, When};
use erdprobe::value::{Bindings, Value};

fn order_query() -> Segment {
    Segment::sequence(vec![
        Segment::text("SELECT * FROM t_order o"),
        Segment::where_clause(Segment::sequence(vec![
            Segment::when("userId != null", Segment::text("AND o.user_id = #{userId}")),
            Segment::when("status == 2", Segment::text("AND o.status = #{status}")),
        ])),
    ])
}

fn render(template: &Segment, bindings: &Bindings) -> String {
    LiteralRenderer::default().render(template, bindings).unwrap()
}

#[test]
fn test_walked_bindings_switch_on_every_guard() {
    let probe = ProbeSettings::default();
    let text = TextSettings::default();
    let template = order_query();
    let bindings = TemplateWalker::new(&probe, &text).bindings_for(&template);

    assert_eq!(
        render(&template, &bindings),
        "SELECT * FROM t_order o WHERE o.user_id = ? AND o.status = ?"
    );
}

#[test]
fn test_empty_where_is_dropped() {
    assert_eq!(render(&order_query(), &Bindings::new()), "SELECT * FROM t_order o");
}

#[test]
fn test_set_clause_drops_trailing_comma() {
    let template = Segment::sequence(vec![
        Segment::text("UPDATE t_user"),
        Segment::set_clause(Segment::sequence(vec![
            Segment::when("name != null", Segment::text("name = #{name},")),
            Segment::when("age != null", Segment::text("age = #{age},")),
        ])),
        Segment::text("WHERE id = #{id}"),
    ]);
    let mut bindings = Bindings::new();
    bindings.put("name", Value::Str("n".to_string()));
    bindings.put("age", Value::Int(3));

    assert_eq!(
        render(&template, &bindings),
        "UPDATE t_user SET name = ?, age = ? WHERE id = ?"
    );
}

#[test]
fn test_choice_set_renders_first_true_branch() {
    let template = Segment::ChoiceSet {
        whens: vec![
            When {
                test: "kind == 1".to_string(),
                body: Segment::text("a"),
            },
            When {
                test: "kind > 0".to_string(),
                body: Segment::text("b"),
            },
        ],
        default: Some(Box::new(Segment::text("c"))),
    };

    let mut bindings = Bindings::new();
    bindings.put("kind", Value::Int(1));
    assert_eq!(render(&template, &bindings), "a");

    bindings.put("kind", Value::Int(5));
    assert_eq!(render(&template, &bindings), "b");

    assert_eq!(render(&template, &Bindings::new()), "c");
}

#[test]
fn test_repeat_binds_item_and_index_locally() {
    let template = Segment::sequence(vec![
        Segment::text("SELECT * FROM t WHERE id IN"),
        Segment::Repeat {
            collection: "ids".to_string(),
            item: "id".to_string(),
            index: Some("i".to_string()),
            open: "(".to_string(),
            close: ")".to_string(),
            separator: ", ".to_string(),
            body: Box::new(Segment::dynamic("${id}")),
        },
    ]);
    let mut bindings = Bindings::new();
    bindings.put("ids", Value::Seq(vec![Value::Int(1), Value::Int(2)]));

    let sql = render(&template, &bindings);

    assert_eq!(sql, "SELECT * FROM t WHERE id IN (1, 2)");
    assert_eq!(bindings.get("id"), None);
}

#[test]
fn test_non_null_marker() {
    let mut bindings = Bindings::new();
    bindings.put("table", Value::NonNullUnknown);
    let template = Segment::dynamic("SELECT * FROM ${table}");

    assert_eq!(render(&template, &bindings), "SELECT * FROM __non_null__");
    assert_eq!(
        LiteralRenderer::new("t_any").render(&template, &bindings).unwrap(),
        "SELECT * FROM t_any"
    );
}

#[test]
fn test_bad_guard_is_a_render_error() {
    let template = Segment::when("a == (", Segment::text("x"));
    let err = LiteralRenderer::default()
        .render(&template, &Bindings::new())
        .unwrap_err();

    assert!(matches!(err, RenderError::Expression { ref test, .. } if test == "a == ("));
}

#[test]
fn test_rendered_sql_normalizes() {
    let template = Segment::sequence(vec![
        Segment::text("SELECT a -- the key\n"),
        Segment::text("FROM   t /* main */ WHERE b = #{b}"),
    ]);

    let sql = strip_comments(&render(&template, &Bindings::new()));

    assert_eq!(sql, "SELECT a FROM t WHERE b = ?");
}
