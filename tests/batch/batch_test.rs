// tests/batch/batch_test.rs
use erdprobe::batch::{write_sql_dump, Batch, BatchError, SkipReason};
use erdprobe::catalog::{Catalog, StatementKind};
use erdprobe::config::Settings;
use erdprobe::join::Match;
use erdprobe::params::{FieldKind, FieldSpec, ParameterSynthesizer, ParameterType};
use erdprobe::value::Value;
use std::collections::{BTreeMap, BTreeSet};

const CATALOG: &str = r#"
[[statements]]
id = "OrderMapper.listByUser"
kind = "select"
result_type = "Order"

[statements.template]
type = "sequence"
children = [
    { type = "static_text", text = "SELECT o.* FROM t_order o, t_user u" },
    { type = "trimmed", prefix = "WHERE", prefix_overrides = ["AND ", "OR "], body = { type = "conditional", test = "userId != null", body = { type = "static_text", text = "AND o.user_id = u.id" } } },
]

[[statements]]
id = "ItemMapper.page"
kind = "select"
template = { type = "dynamic_text", text = "SELECT * FROM t_item i ORDER BY ${sort} LIMIT ${rows}" }

[[statements]]
id = "UserMapper.insert"
kind = "insert"
parameter_type = "User"
template = { type = "dynamic_text", text = "INSERT INTO `t_user` (name, age, vip) VALUES ('${name}', ${age}, ${vip})" }

[[statements]]
id = "Proc.refresh"
kind = "callable"
template = { type = "pass_through", text = "{call refresh()}" }

[[statements]]
id = "UserMapper.update"
kind = "update"
template = { type = "static_text", text = "UPDATE t_user SET name = #{name}" }

[[statements]]
id = "AuditMapper.insert"
kind = "insert"
parameter_type = "Audit"
template = { type = "static_text", text = "INSERT INTO t_audit (msg) VALUES (#{msg})" }

[[statements]]
id = "BaseMapper.insert"
kind = "insert"
parameter_type = "Base"
template = { type = "static_text", text = "INSERT INTO t_base (id) VALUES (#{id})" }

[types.User]
fields = [
    { name = "name", kind = "string" },
    { name = "age", kind = "integer" },
    { name = "vip", kind = "boolean" },
    { name = "SERIAL", kind = "long", static = true },
]

[types.Base]
instantiable = false
fields = [{ name = "id", kind = "long" }]
"#;

fn run() -> erdprobe::BatchReport {
    let settings = Settings::default();
    let catalog = Catalog::from_toml_str(CATALOG).unwrap();
    let report = Batch::new(&settings).run(&catalog).unwrap();
    report
}

#[test]
fn test_rendered_statements_in_catalog_order() {
    let report = run();

    let rendered: Vec<_> = report
        .rendered
        .iter()
        .map(|s| (s.id.as_str(), s.kind))
        .collect();
    assert_eq!(
        rendered,
        vec![
            ("OrderMapper.listByUser", StatementKind::Select),
            ("ItemMapper.page", StatementKind::Select),
            ("UserMapper.insert", StatementKind::Insert),
        ]
    );
    assert_eq!(
        report.rendered[0].sql,
        "SELECT o.* FROM t_order o, t_user u WHERE o.user_id = u.id"
    );
    assert_eq!(
        report.rendered[1].sql,
        "SELECT * FROM t_item i ORDER BY id LIMIT 0"
    );
    assert_eq!(
        report.rendered[2].sql,
        "INSERT INTO `t_user` (name, age, vip) VALUES ('_for_g_only', 0, true)"
    );
}

#[test]
fn test_skipped_statements_carry_reasons() {
    let report = run();

    let skipped: Vec<_> = report
        .skipped
        .iter()
        .map(|s| (s.id.as_str(), s.reason.clone()))
        .collect();
    assert_eq!(
        skipped,
        vec![
            ("Proc.refresh", SkipReason::Callable),
            (
                "UserMapper.update",
                SkipReason::NotAnalysed(StatementKind::Update)
            ),
            (
                "AuditMapper.insert",
                SkipReason::UnknownParameterType("Audit".to_string())
            ),
            (
                "BaseMapper.insert",
                SkipReason::NotInstantiable("Base".to_string())
            ),
        ]
    );
}

#[test]
fn test_matches_types_and_diagram() {
    let report = run();

    assert_eq!(
        report.matches,
        BTreeSet::from([Match::new("t_order", "user_id", "t_user", "id")])
    );

    let mut type_tables = BTreeMap::new();
    type_tables.insert("Order".to_string(), BTreeSet::from(["t_order".to_string()]));
    type_tables.insert("User".to_string(), BTreeSet::from(["t_user".to_string()]));
    assert_eq!(report.type_tables, type_tables);

    assert_eq!(report.diagram.nodes.len(), 2);
    assert_eq!(report.diagram.edges.len(), 1);
}

#[test]
fn test_sql_dump_holds_selects_only() {
    let report = run();
    let mut out = Vec::new();
    write_sql_dump(&report, &mut out).unwrap();

    assert_eq!(
        String::from_utf8(out).unwrap(),
        "SELECT o.* FROM t_order o, t_user u WHERE o.user_id = u.id;\n\
         SELECT * FROM t_item i ORDER BY id LIMIT 0;\n"
    );
}

#[test]
fn test_empty_catalog_is_fatal() {
    let settings = Settings::default();
    let result = Batch::new(&settings).run(&Catalog::default());
    assert!(matches!(result, Err(BatchError::NoStatements)));
}

#[test]
fn test_parameter_object_defaults() {
    let settings = Settings::default();
    let ty = ParameterType::new(
        "User",
        vec![
            FieldSpec::new("name", FieldKind::String),
            FieldSpec::new("age", FieldKind::Integer),
        ],
    );

    let object = ParameterSynthesizer::new(&settings.params)
        .synthesize(&ty)
        .unwrap();

    let mut expected = BTreeMap::new();
    expected.insert("name".to_string(), Value::Str("_for_g_only".to_string()));
    expected.insert("age".to_string(), Value::Int(0));
    assert_eq!(object, Value::Map(expected));
}

#[test]
fn test_unparseable_select_is_skipped_and_not_dumped() {
    let settings = Settings::default();
    let catalog = Catalog::from_toml_str(
        r#"
[[statements]]
id = "BrokenMapper.list"
kind = "select"
template = { type = "static_text", text = "SELECT * FROM t_a a WHERE a.id = = 1" }

[[statements]]
id = "GoodMapper.list"
kind = "select"
template = { type = "static_text", text = "SELECT * FROM t_b b WHERE b.id = 1" }
"#,
    )
    .unwrap();

    let report = Batch::new(&settings).run(&catalog).unwrap();

    assert_eq!(report.rendered.len(), 1);
    assert_eq!(report.rendered[0].id, "GoodMapper.list");
    assert_eq!(report.skipped.len(), 1);
    assert_eq!(report.skipped[0].id, "BrokenMapper.list");
    assert!(matches!(report.skipped[0].reason, SkipReason::InvalidSql(_)));

    let mut out = Vec::new();
    write_sql_dump(&report, &mut out).unwrap();
    assert_eq!(
        String::from_utf8(out).unwrap(),
        "SELECT * FROM t_b b WHERE b.id = 1;\n"
    );
}
