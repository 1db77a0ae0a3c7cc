// tests/join/join_finder_test.rs
use erdprobe::config::SqlDialect;
use erdprobe::join::{JoinFinder, Match};
use erdprobe::sql::{
    ColumnRef, SelectShape, SqlAstProvider, SqlError, SqlParserProvider, SqlResult, TableRef,
};
use std::collections::BTreeSet;

fn analyse(sql: &str) -> BTreeSet<Match> {
    let provider = SqlParserProvider::new(SqlDialect::Mysql);
    JoinFinder::new(&provider).analyse(sql)
}

#[test]
fn test_aliased_join_resolves_tables() {
    let matches = analyse("SELECT a.id, b.aid FROM ta a, tb b WHERE a.id = b.aid");
    assert_eq!(matches, BTreeSet::from([Match::new("ta", "id", "tb", "aid")]));
}

#[test]
fn test_explicit_joins_pair_from_the_end() {
    let matches = analyse(
        "SELECT * FROM ta a JOIN tb b ON a.id = b.aid JOIN tc c ON c.bid = b.id",
    );
    assert_eq!(
        matches,
        BTreeSet::from([
            Match::new("ta", "id", "tb", "aid"),
            Match::new("tc", "bid", "tb", "id"),
        ])
    );
}

#[test]
fn test_unaliased_tables_qualify_themselves() {
    let matches = analyse("SELECT * FROM `t_user`, t_order WHERE t_user.id = t_order.user_id");
    assert_eq!(
        matches,
        BTreeSet::from([Match::new("t_user", "id", "t_order", "user_id")])
    );
}

#[test]
fn test_odd_column_count_yields_nothing() {
    assert!(analyse("SELECT * FROM ta a, tb b WHERE a.id = b.aid AND a.flag = 1").is_empty());
}

#[test]
fn test_under_qualified_yields_nothing() {
    assert!(analyse("SELECT * FROM ta a, tb b WHERE a.id = 1").is_empty());
    assert!(analyse("SELECT * FROM ta WHERE id = 1").is_empty());
    assert!(analyse("SELECT * FROM ta a, tb b").is_empty());
}

#[test]
fn test_unusable_sql_yields_nothing() {
    assert!(analyse("SELEC * FORM nothing").is_empty());
    assert!(analyse("DELETE FROM ta WHERE ta.id = 1").is_empty());
    assert!(analyse("").is_empty());
}

#[test]
fn test_analyse_all_merges_statements() {
    let provider = SqlParserProvider::default();
    let finder = JoinFinder::new(&provider);
    let statements = [
        "SELECT * FROM ta a, tb b WHERE a.id = b.aid",
        "SELECT * FROM tb x, ta y WHERE y.id = x.aid",
        "SELECT * FROM tb b, tc c WHERE b.id = c.bid",
        "SELECT * FROM ta",
    ];

    let matches = finder.analyse_all(statements);

    assert_eq!(
        matches,
        BTreeSet::from([
            Match::new("ta", "id", "tb", "aid"),
            Match::new("tb", "id", "tc", "bid"),
        ])
    );
}

/// Provider returning a fixed shape, independent of any SQL grammar.
struct FixedShape(SelectShape);

impl SqlAstProvider for FixedShape {
    fn select_shape(&self, _sql: &str) -> SqlResult<SelectShape> {
        if self.0.tables.is_empty() {
            return Err(SqlError::Empty);
        }
        Ok(self.0.clone())
    }
}

fn column(qualifier: &str, name: &str) -> ColumnRef {
    ColumnRef {
        qualifier: Some(qualifier.to_string()),
        name: name.to_string(),
    }
}

#[test]
fn test_custom_provider_and_quoted_names() {
    let provider = FixedShape(SelectShape {
        tables: vec![
            TableRef {
                name: "`orders`".to_string(),
                alias: Some("o".to_string()),
            },
            TableRef {
                name: "customers".to_string(),
                alias: Some("c".to_string()),
            },
        ],
        columns: vec![column("o", "`customer_id`"), column("c", "id")],
    });

    let matches = JoinFinder::new(&provider).analyse("ignored");

    assert_eq!(
        matches,
        BTreeSet::from([Match::new("orders", "customer_id", "customers", "id")])
    );
}

#[test]
fn test_provider_error_yields_nothing() {
    let provider = FixedShape(SelectShape::default());
    assert!(JoinFinder::new(&provider).analyse("ignored").is_empty());
}
