// tests/join/graph_test.rs
use erdprobe::graph::{to_dot, AssociationGraph, DiagramSink, DotSink};
use erdprobe::join::{Match, TableColumn};

#[test]
fn test_mirrored_matches_draw_one_edge() {
    let matches = [
        Match::new("ta", "id", "tb", "aid"),
        Match::new("tb", "aid", "ta", "id"),
    ];
    let graph = AssociationGraph::from_matches(&matches);
    let diagram = graph.diagram();

    assert_eq!(graph.partners(&TableColumn::new("ta", "id")).len(), 2);
    assert_eq!(diagram.nodes.len(), 2);
    assert_eq!(diagram.edges.len(), 1);
    assert_eq!(diagram.edges[0].left, TableColumn::new("ta", "id"));
    assert_eq!(diagram.edges[0].right, TableColumn::new("tb", "aid"));
}

#[test]
fn test_nodes_list_matched_columns_per_table() {
    let matches = [
        Match::new("t_order", "user_id", "t_user", "id"),
        Match::new("t_order", "id", "t_item", "order_id"),
    ];
    let diagram = AssociationGraph::from_matches(&matches).diagram();

    let tables: Vec<_> = diagram
        .nodes
        .iter()
        .map(|node| (node.table.as_str(), node.columns.join(",")))
        .collect();
    assert_eq!(
        tables,
        vec![
            ("t_item", "order_id".to_string()),
            ("t_order", "id,user_id".to_string()),
            ("t_user", "id".to_string()),
        ]
    );
    assert_eq!(diagram.edges.len(), 2);
}

#[test]
fn test_self_reference() {
    let diagram = AssociationGraph::from_matches(&[Match::new("t_dept", "parent_id", "t_dept", "id")])
        .diagram();

    assert_eq!(diagram.nodes.len(), 1);
    assert_eq!(diagram.nodes[0].columns, vec!["id", "parent_id"]);
    assert_eq!(diagram.edges.len(), 1);
}

#[test]
fn test_empty_graph() {
    let diagram = AssociationGraph::new().diagram();
    assert!(diagram.nodes.is_empty());
    assert!(diagram.edges.is_empty());
}

#[test]
fn test_dot_output() {
    let matches = [
        Match::new("ta", "id", "tb", "aid"),
        Match::new("tb", "id", "tc", "bid"),
        Match::new("tc", "bid", "tb", "id"),
    ];
    let diagram = AssociationGraph::from_matches(&matches).diagram();

    insta::assert_snapshot!(to_dot(&diagram), @r#"
    graph ERD {
    ta [shape=plain label=<<table border="0" cellborder="1" cellspacing="0"><tr><td><b>ta</b></td></tr><tr><td port="id">id</td></tr></table>>];
    tb [shape=plain label=<<table border="0" cellborder="1" cellspacing="0"><tr><td><b>tb</b></td></tr><tr><td port="aid">aid</td></tr><tr><td port="id">id</td></tr></table>>];
    tc [shape=plain label=<<table border="0" cellborder="1" cellspacing="0"><tr><td><b>tc</b></td></tr><tr><td port="bid">bid</td></tr></table>>];
    ta:id -- tb:aid;
    tb:id -- tc:bid;
    }
    "#);
}

#[test]
fn test_dot_sink_matches_to_dot() {
    let diagram =
        AssociationGraph::from_matches(&[Match::new("ta", "id", "tb", "aid")]).diagram();

    let mut sink = DotSink::new(Vec::new());
    sink.write_diagram(&diagram).unwrap();

    assert_eq!(String::from_utf8(sink.into_inner()).unwrap(), to_dot(&diagram));
}
