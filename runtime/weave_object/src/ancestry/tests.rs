use super::*;
use crate::value::Value;
use pretty_assertions::assert_eq;

fn graph_with(count: usize) -> (ModuleGraph, Vec<ModuleId>) {
    let mut graph = ModuleGraph::new();
    let ids = (0..count).map(|_| graph.alloc(None, None)).collect();
    (graph, ids)
}

fn returning(s: &'static str) -> Method {
    Method::new(move |_, _| Ok(Value::str(s)))
}

#[test]
fn test_chain_is_post_order() {
    let (mut graph, ids) = graph_with(3);
    let (a, b, c) = (ids[0], ids[1], ids[2]);
    graph.add_edge(a, b);
    graph.add_edge(b, c);

    assert_eq!(graph.ancestors(a), vec![c, b, a]);
    assert!(graph.includes(a, c));
    assert!(!graph.includes(c, a));
}

#[test]
fn test_diamond_keeps_first_occurrence() {
    let (mut graph, ids) = graph_with(4);
    let (a, b, c, d) = (ids[0], ids[1], ids[2], ids[3]);
    graph.add_edge(a, b);
    graph.add_edge(a, c);
    graph.add_edge(b, d);
    graph.add_edge(c, d);

    assert_eq!(graph.ancestors(a), vec![d, b, c, a]);
}

#[test]
fn test_double_include_does_not_duplicate() {
    let (mut graph, ids) = graph_with(2);
    graph.add_edge(ids[0], ids[1]);
    graph.add_edge(ids[0], ids[1]);
    assert_eq!(graph.ancestors(ids[0]), vec![ids[1], ids[0]]);
}

#[test]
fn test_indirect_self_inclusion_terminates() {
    let (mut graph, ids) = graph_with(3);
    let (a, b, c) = (ids[0], ids[1], ids[2]);
    graph.add_edge(a, b);
    graph.add_edge(b, c);
    graph.add_edge(c, a);

    assert_eq!(graph.ancestors(a), vec![c, b, a]);
    assert_eq!(graph.ancestors(b), vec![a, c, b]);
    assert!(graph.includes(c, b));
}

#[test]
fn test_self_inclusion_is_deduplicated() {
    let (mut graph, ids) = graph_with(1);
    graph.add_edge(ids[0], ids[0]);
    assert_eq!(graph.ancestors(ids[0]), vec![ids[0]]);
    assert_eq!(graph.dependents_closure(ids[0]), vec![ids[0]]);
}

#[test]
fn test_hidden_modules_are_skipped_unless_requested() {
    let (mut graph, ids) = graph_with(2);
    let (owner, hidden) = (ids[0], ids[1]);
    graph.set_hidden(hidden);
    graph.add_edge(owner, hidden);

    assert_eq!(graph.ancestors(owner), vec![owner]);
    assert_eq!(
        AncestryResolver::new(&graph).with_hidden().linearize(owner),
        vec![hidden, owner]
    );
    // Reachability still sees it.
    assert!(graph.includes(owner, hidden));
}

#[test]
fn test_lookup_lists_definers_in_ancestry_order() {
    let (mut graph, ids) = graph_with(3);
    let (a, b, c) = (ids[0], ids[1], ids[2]);
    let greet = Name::from_raw(1);
    let in_c = returning("c");
    let in_a = returning("a");
    graph.set_method(c, greet, in_c.clone());
    graph.set_method(a, greet, in_a.clone());
    graph.add_edge(a, b);
    graph.add_edge(b, c);

    let chain = graph.lookup(a, greet);
    assert_eq!(chain.len(), 2);
    assert!(chain[0].same_body(&in_c));
    assert!(chain[1].same_body(&in_a));
    assert!(graph
        .instance_method(a, greet)
        .is_some_and(|m| m.same_body(&in_a)));
    assert!(graph.instance_method(b, Name::from_raw(99)).is_none());
}

#[test]
fn test_instance_methods_own_and_inherited() {
    let (mut graph, ids) = graph_with(2);
    let (a, b) = (ids[0], ids[1]);
    let (x, y) = (Name::from_raw(1), Name::from_raw(2));
    graph.set_method(a, x, returning("ax"));
    graph.set_method(b, x, returning("bx"));
    graph.set_method(b, y, returning("by"));
    graph.add_edge(a, b);

    assert_eq!(graph.instance_methods(a, false), vec![x]);
    assert_eq!(graph.instance_methods(a, true), vec![x, y]);
}

#[test]
fn test_dependents_closure_walks_outward() {
    let (mut graph, ids) = graph_with(4);
    let (base, mid, top, other) = (ids[0], ids[1], ids[2], ids[3]);
    graph.add_edge(mid, base);
    graph.add_edge(top, mid);
    graph.add_edge(other, base);

    assert_eq!(graph.dependents_closure(base), vec![base, mid, other, top]);
    assert_eq!(graph.dependents_closure(top), vec![top]);
}
