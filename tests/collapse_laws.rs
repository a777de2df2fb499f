//! Laws of the collapse engine over arbitrary small graphs.

use collapsible_graph_canvas::components::force_graph::{
	Connection, GraphConfig, GraphData, GraphLink, GraphNode, NodeId, build_model,
	compute_node_degree, get_target_leaf_connections, is_leaf_directed, is_leaf_not_directed,
	toggle_links_connections, toggle_links_matrix_connections,
};
use proptest::prelude::*;

fn payload(nodes: usize, edges: &[(usize, usize)]) -> GraphData {
	GraphData {
		nodes: (0..nodes).map(|i| GraphNode::new(i as u64)).collect(),
		links: edges
			.iter()
			.map(|&(s, t)| GraphLink::new((s % nodes) as u64, (t % nodes) as u64))
			.collect(),
		focused_node_id: None,
	}
}

fn config(directed: bool) -> GraphConfig {
	GraphConfig {
		directed,
		collapsible: true,
		..GraphConfig::default()
	}
}

fn graph_strategy() -> impl Strategy<Value = (usize, Vec<(usize, usize)>)> {
	(2usize..9).prop_flat_map(|n| (Just(n), prop::collection::vec((0..n, 0..n), 0..16)))
}

proptest! {
	#[test]
	fn leaf_predicates_match_their_definitions(in_degree in 0u32..6, out_degree in 0u32..6) {
		prop_assert_eq!(is_leaf_directed(in_degree, out_degree), in_degree <= 1 && out_degree == 0);
		prop_assert_eq!(is_leaf_not_directed(in_degree, out_degree), in_degree <= 1 && out_degree <= 1);
		// Every directed leaf is also an undirected one.
		prop_assert!(!is_leaf_directed(in_degree, out_degree) || is_leaf_not_directed(in_degree, out_degree));
	}

	#[test]
	fn undirected_in_degree_equals_out_degree((n, edges) in graph_strategy()) {
		let model = build_model(&payload(n, &edges), &config(false)).unwrap();
		for node in model.nodes.iter() {
			let degree = compute_node_degree(node.id.as_str(), &model.matrix);
			prop_assert_eq!(degree.in_degree, degree.out_degree);
		}
	}

	#[test]
	fn toggling_leaf_connections_twice_is_identity(
		(n, edges) in graph_strategy(),
		root in 0usize..9,
		directed in any::<bool>(),
	) {
		let model = build_model(&payload(n, &edges), &config(directed)).unwrap();
		let root = NodeId::from((root % n) as u64);
		let connections = get_target_leaf_connections(&root, &model.matrix, directed);

		let once = toggle_links_matrix_connections(&model.matrix, &connections, directed);
		let twice = toggle_links_matrix_connections(&once, &connections, directed);
		prop_assert_eq!(&twice, &model.matrix);

		let links = toggle_links_connections(&model.links, &twice);
		prop_assert!(links.iter().all(|l| !l.is_hidden));
	}

	#[test]
	fn toggling_any_connection_set_twice_is_identity(
		(n, edges) in graph_strategy(),
		picks in prop::collection::vec((0usize..9, 0usize..9), 0..6),
		directed in any::<bool>(),
	) {
		let model = build_model(&payload(n, &edges), &config(directed)).unwrap();
		let mut connections: Vec<Connection> = Vec::new();
		for (s, t) in picks {
			let connection = Connection {
				source: NodeId::from((s % n) as u64),
				target: NodeId::from((t % n) as u64),
			};
			let mirrored = Connection {
				source: connection.target.clone(),
				target: connection.source.clone(),
			};
			// A pair and its mirror in one batch would flip twice.
			if !connections.contains(&connection) && (directed || !connections.contains(&mirrored)) {
				connections.push(connection);
			}
		}

		let once = toggle_links_matrix_connections(&model.matrix, &connections, directed);
		let twice = toggle_links_matrix_connections(&once, &connections, directed);
		prop_assert_eq!(&twice, &model.matrix);
	}

	#[test]
	fn toggling_never_mutates_its_input((n, edges) in graph_strategy(), root in 0usize..9) {
		let model = build_model(&payload(n, &edges), &config(false)).unwrap();
		let snapshot = model.matrix.clone();
		let root = NodeId::from((root % n) as u64);
		let connections = get_target_leaf_connections(&root, &model.matrix, false);
		let _ = toggle_links_matrix_connections(&model.matrix, &connections, false);
		prop_assert_eq!(&model.matrix, &snapshot);
	}
}
