use cypherlite_api::PropertyValue;
use cypherlite_query::ast::Query;
use cypherlite_query::{AtomicFact, Error, ExecutionOptions, extract, parse, run_match, run_match_with};
use cypherlite_storage::MemGraph;
use proptest::prelude::*;
use std::collections::BTreeMap;

fn chain_graph(len: usize) -> MemGraph {
    let mut g = MemGraph::new();
    for i in 0..len {
        let mut props = BTreeMap::new();
        props.insert("i".to_string(), PropertyValue::Int(i as i64));
        g.add_node(format!("n{i:03}"), Some("N"), props).unwrap();
    }
    for i in 1..len {
        g.add_edge(&format!("n{:03}", i - 1), &format!("n{i:03}"), Some("NEXT"))
            .unwrap();
    }
    g
}

fn match_query(text: &str) -> cypherlite_query::ast::MatchQuery {
    match parse(text).unwrap() {
        Query::Match(q) => q,
        other => panic!("expected MATCH, got {other:?}"),
    }
}

#[test]
fn take_one_stops_the_search() {
    let g = chain_graph(60);
    let query = match_query("MATCH (a), (b), (c) RETURN a, b, c");
    let mut iter = run_match(&g, &query).unwrap();
    assert_eq!(iter.designations(), ["a", "b", "c"]);

    let first = iter.next().unwrap().unwrap();
    assert_eq!(first.values().len(), 3);
    assert_eq!(iter.candidates_examined(), 1);
}

#[test]
fn rejected_candidates_are_counted_until_the_first_match() {
    let g = chain_graph(10);
    let query = match_query("MATCH (a)-[:NEXT]->(b) WHERE a.i = 3 RETURN b.i");
    let mut iter = run_match(&g, &query).unwrap();
    let row = iter.next().unwrap().unwrap();
    assert_eq!(row.get("b.i"), Some(&cypherlite_query::Value::Int(4)));
    // (n003, n004) is candidate 3 * 10 + 4, zero-based.
    assert_eq!(iter.candidates_examined(), 35);
    assert!(iter.next().is_none());
    assert_eq!(iter.candidates_examined(), 100);
}

#[test]
fn unbound_designations_fail_before_any_candidate() {
    let g = chain_graph(5);
    let query = match_query("MATCH (a) RETURN b");
    let err = run_match(&g, &query).err().unwrap();
    assert!(matches!(err, Error::UnresolvedDesignation(name) if name == "b"));
}

#[test]
fn limits_apply_before_enumeration() {
    let g = chain_graph(5);
    let query = match_query("MATCH (a), (b) RETURN a");
    let options = ExecutionOptions::unbounded().with_max_variables(1);
    assert!(matches!(
        run_match_with(&g, &query, &options).err(),
        Some(Error::LimitExceeded(_))
    ));
}

#[test]
fn anonymous_names_are_stable_across_parses() {
    let text = "MATCH (:A)-[:R]->()<-[:S]-(:C), ()-->(x) WHERE x.k = 1 RETURN x";
    let first = extract(&parse(text).unwrap()).unwrap();
    let second = extract(&parse(text).unwrap()).unwrap();
    assert_eq!(first, second);
    assert_eq!(
        first.designations(),
        vec!["_v0", "_v1", "_v2", "_v3", "x"]
    );

    let parsed = parse(text).unwrap();
    assert_eq!(extract(&parsed).unwrap(), extract(&parsed).unwrap());
    assert!(matches!(first.facts.last(), Some(AtomicFact::FilterClause(_))));
}

/// Node ids with their class and a `k` attribute, plus labeled edges by index.
fn arb_graph() -> impl Strategy<Value = (Vec<(Option<&'static str>, i64)>, Vec<(usize, usize, &'static str)>)> {
    let node = (prop_oneof![Just(None), Just(Some("A")), Just(Some("B"))], 0i64..3);
    prop::collection::vec(node, 1..6).prop_flat_map(|nodes| {
        let n = nodes.len();
        let edge = (0..n, 0..n, prop_oneof![Just("R"), Just("S")]);
        (Just(nodes), prop::collection::vec(edge, 0..8))
    })
}

fn build(
    nodes: &[(Option<&'static str>, i64)],
    edges: &[(usize, usize, &'static str)],
    order: &[usize],
) -> MemGraph {
    let mut g = MemGraph::new();
    for &i in order {
        let (class, k) = nodes[i];
        let mut props = BTreeMap::new();
        props.insert("k".to_string(), PropertyValue::Int(k));
        g.add_node(format!("n{i}"), class, props).unwrap();
    }
    for &(src, dst, label) in edges {
        g.add_edge(&format!("n{src}"), &format!("n{dst}"), Some(label))
            .unwrap();
    }
    g
}

const QUERIES: &[&str] = &[
    "MATCH (a)-[:R]->(b) RETURN a, b",
    "MATCH (a:A)-->(b) WHERE NOT b.k = 1 RETURN a, b",
    "MATCH (a)<-[:S]-(b:B), (a)-->(c) WHERE a.k = 0 OR c.k = 2 RETURN a, b, c",
    "MATCH (a {k: 2}), (b) WHERE b.k = 2 RETURN a, b",
];

fn result_ids(g: &MemGraph, text: &str) -> Vec<Vec<String>> {
    let query = match_query(text);
    run_match(g, &query)
        .unwrap()
        .map(|row| {
            row.unwrap()
                .into_values()
                .into_iter()
                .map(|v| v.as_node_id().unwrap().to_string())
                .collect()
        })
        .collect()
}

proptest! {
    #![proptest_config(ProptestConfig {
        cases: 64,
        failure_persistence: None,
        ..ProptestConfig::default()
    })]

    #[test]
    fn result_set_ignores_domain_order(
        (nodes, edges) in arb_graph(),
        seed in any::<u64>(),
        query_index in 0..QUERIES.len(),
    ) {
        let forward: Vec<usize> = (0..nodes.len()).collect();
        let mut shuffled = forward.clone();
        // Deterministic rotation plus reversal; enough to change the order.
        shuffled.rotate_left((seed as usize) % nodes.len());
        if seed % 2 == 0 {
            shuffled.reverse();
        }

        let text = QUERIES[query_index];
        let mut left = result_ids(&build(&nodes, &edges, &forward), text);
        let mut right = result_ids(&build(&nodes, &edges, &shuffled), text);
        left.sort();
        right.sort();
        prop_assert_eq!(left, right);
    }

    #[test]
    fn repeated_runs_agree(
        (nodes, edges) in arb_graph(),
        query_index in 0..QUERIES.len(),
    ) {
        let forward: Vec<usize> = (0..nodes.len()).collect();
        let g = build(&nodes, &edges, &forward);
        let text = QUERIES[query_index];
        prop_assert_eq!(result_ids(&g, text), result_ids(&g, text));
    }
}
