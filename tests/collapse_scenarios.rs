mod common;

use std::cell::RefCell;
use std::rc::Rc;

use collapsible_graph_canvas::components::force_graph::{
	Connection, GraphCallbacks, NodeId, get_target_leaf_connections, is_leaf, is_node_visible,
};
use pretty_assertions::assert_eq;
use serde_json::json;

use common::{TestEngine, engine, graph};

fn hidden(state: &TestEngine) -> Vec<bool> {
	state.model().links.iter().map(|l| l.is_hidden).collect()
}

#[test]
fn undirected_root_click_collapses_and_expands_leaves() {
	let (mut state, _) = engine(
		graph(&["A", "B", "C"], &[("A", "B"), ("A", "C")]),
		&json!({ "collapsible": true }),
	);
	let leaves = get_target_leaf_connections(&NodeId::from("A"), &state.model().matrix, false);
	assert_eq!(
		leaves,
		vec![
			Connection {
				source: "A".into(),
				target: "B".into()
			},
			Connection {
				source: "A".into(),
				target: "C".into()
			},
		]
	);

	state.on_click_node(&"A".into());
	assert_eq!(hidden(&state), vec![true, true]);
	assert_eq!(state.view().links.len(), 0);

	state.on_click_node(&"A".into());
	assert_eq!(hidden(&state), vec![false, false]);
	assert_eq!(state.view().links.len(), 2);
}

#[test]
fn directed_root_click_hides_the_same_edges() {
	let (mut state, _) = engine(
		graph(&["A", "B", "C"], &[("A", "B"), ("A", "C")]),
		&json!({ "collapsible": true, "directed": true }),
	);
	assert!(is_leaf("B", &state.model().matrix, true));
	assert!(is_leaf("C", &state.model().matrix, true));
	assert!(!is_leaf("A", &state.model().matrix, true));

	state.on_click_node(&"A".into());
	assert_eq!(hidden(&state), vec![true, true]);
	state.on_click_node(&"A".into());
	assert_eq!(hidden(&state), vec![false, false]);
}

#[test]
fn orphan_is_always_visible() {
	let (mut state, _) = engine(
		graph(&["A", "B", "C", "D"], &[("A", "B"), ("A", "C")]),
		&json!({ "collapsible": true }),
	);
	let visible =
		|state: &TestEngine| is_node_visible("D", &state.model().nodes, &state.model().matrix);

	assert!(visible(&state));
	state.on_click_node(&"A".into());
	assert!(visible(&state));
	assert!(!is_node_visible("B", &state.model().nodes, &state.model().matrix));
	let drawn: Vec<_> = state
		.view()
		.nodes
		.iter()
		.map(|n| n.node.id.to_string())
		.collect();
	assert_eq!(drawn, vec!["D".to_string()]);
}

#[test]
fn clicking_a_node_without_leaves_only_fires_the_callback() {
	let clicked = Rc::new(RefCell::new(Vec::new()));
	let sink = clicked.clone();
	let (state, _) = engine(
		graph(&["A", "B", "C", "D"], &[("A", "B"), ("B", "C"), ("C", "D"), ("D", "A")]),
		&json!({ "collapsible": true }),
	);
	let mut state = state.with_callbacks(
		GraphCallbacks::default().on_click_node(move |id| sink.borrow_mut().push(id.clone())),
	);
	let before = state.model().matrix.clone();
	state.on_click_node(&"A".into());
	assert_eq!(state.model().matrix, before);
	assert_eq!(hidden(&state), vec![false; 4]);
	assert_eq!(*clicked.borrow(), vec![NodeId::from("A")]);
}

#[test]
fn click_without_collapsible_leaves_links_alone() {
	let (mut state, _) = engine(graph(&["A", "B"], &[("A", "B")]), &json!({}));
	state.on_click_node(&"A".into());
	assert_eq!(hidden(&state), vec![false]);
}
