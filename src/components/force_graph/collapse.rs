//! Collapsible behavior over the connections matrix.
//!
//! Clicking a node hides the links to its leaf neighbors; clicking it again
//! shows them. Nothing is removed from the model: the matrix weights are
//! flipped between 0 and 1 and the link list is recomputed from the matrix,
//! so a second toggle of the same connections is an exact undo.

use super::model::{Link, LinksMatrix, NodeMap};
use super::types::NodeId;

/// Incoming and outgoing weight of a node.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct NodeDegree {
	/// Sum of the weights pointing at the node.
	pub in_degree: u32,
	/// Sum of the node's own row.
	pub out_degree: u32,
}

/// A (source, target) pair to toggle in the matrix.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Connection {
	/// The clicked root.
	pub source: NodeId,
	/// The leaf neighbor.
	pub target: NodeId,
}

/// A directed leaf has at most one parent and no children.
pub fn is_leaf_directed(in_degree: u32, out_degree: u32) -> bool {
	in_degree <= 1 && out_degree < 1
}

/// An undirected leaf has at most one neighbor.
pub fn is_leaf_not_directed(in_degree: u32, out_degree: u32) -> bool {
	in_degree <= 1 && out_degree <= 1
}

/// Scans every row; only called on click, never per tick.
pub fn compute_node_degree(node_id: &str, matrix: &LinksMatrix) -> NodeDegree {
	matrix
		.rows()
		.fold(NodeDegree::default(), |mut degree, (source, row)| {
			if source.as_str() == node_id {
				degree.out_degree += row.iter().map(|(_, w)| w).sum::<u32>();
			}
			degree.in_degree += row.weight(node_id);
			degree
		})
}

/// Leaf test for `node_id` under the current matrix.
pub fn is_leaf(node_id: &str, matrix: &LinksMatrix, directed: bool) -> bool {
	let NodeDegree {
		in_degree,
		out_degree,
	} = compute_node_degree(node_id, matrix);
	if directed {
		is_leaf_directed(in_degree, out_degree)
	} else {
		is_leaf_not_directed(in_degree, out_degree)
	}
}

/// Links from `root` to each neighbor that is a leaf, in the row's insertion
/// order. A root without a row has no leaf connections.
pub fn get_target_leaf_connections(
	root: &NodeId,
	matrix: &LinksMatrix,
	directed: bool,
) -> Vec<Connection> {
	let Some(row) = matrix.row(root.as_str()) else {
		return Vec::new();
	};
	row.iter()
		.filter(|(target, _)| is_leaf(target.as_str(), matrix, directed))
		.map(|(target, _)| Connection {
			source: root.clone(),
			target: target.clone(),
		})
		.collect()
}

/// Flip each connection between 0 and 1, mirrored for undirected graphs.
/// `matrix` is left untouched; rows not named by `connections` stay shared.
pub fn toggle_links_matrix_connections(
	matrix: &LinksMatrix,
	connections: &[Connection],
	directed: bool,
) -> LinksMatrix {
	let mut next = matrix.clone();
	for Connection { source, target } in connections {
		let value = if next.weight(source.as_str(), target.as_str()) == 0 {
			1
		} else {
			0
		};
		next.set(source, target, value);
		if !directed {
			next.set(target, source, value);
		}
	}
	next
}

/// New link list whose hidden flags follow `matrix`.
pub fn toggle_links_connections(links: &[Link], matrix: &LinksMatrix) -> Vec<Link> {
	links
		.iter()
		.map(|link| Link {
			is_hidden: matrix.weight(link.source.as_str(), link.target.as_str()) == 0,
			..link.clone()
		})
		.collect()
}

/// Whether a node should be drawn in a collapsible graph. A leaf can be
/// visible or hidden over time; orphans are always visible.
pub fn is_node_visible(node_id: &str, nodes: &NodeMap, matrix: &LinksMatrix) -> bool {
	let NodeDegree {
		in_degree,
		out_degree,
	} = compute_node_degree(node_id, matrix);
	let orphan = nodes.get(node_id).is_some_and(|node| node.orphan);
	in_degree > 0 || out_degree > 0 || orphan
}

#[cfg(test)]
mod tests {
	use std::rc::Rc;

	use pretty_assertions::assert_eq;

	use super::*;
	use crate::components::force_graph::config::GraphConfig;
	use crate::components::force_graph::model::build_model;
	use crate::components::force_graph::types::{GraphData, GraphLink, GraphNode};

	fn star(directed: bool) -> (GraphData, GraphConfig) {
		let data = GraphData {
			nodes: ["A", "B", "C", "D", "E"]
				.iter()
				.map(|&id| GraphNode::new(id))
				.collect(),
			links: vec![
				GraphLink::new("A", "B"),
				GraphLink::new("A", "C"),
				GraphLink::new("C", "D"),
			],
			focused_node_id: None,
		};
		let config = GraphConfig {
			directed,
			collapsible: true,
			..GraphConfig::default()
		};
		(data, config)
	}

	#[test]
	fn degree_counts_both_directions() {
		let (data, config) = star(true);
		let model = build_model(&data, &config).unwrap();
		assert_eq!(
			compute_node_degree("C", &model.matrix),
			NodeDegree {
				in_degree: 1,
				out_degree: 1
			}
		);
		assert_eq!(compute_node_degree("E", &model.matrix), NodeDegree::default());
	}

	#[test]
	fn only_leaf_neighbors_are_collected() {
		let (data, config) = star(false);
		let model = build_model(&data, &config).unwrap();
		let leaves = get_target_leaf_connections(&NodeId::from("A"), &model.matrix, false);
		// C also links to D, so it is not a leaf of A.
		assert_eq!(
			leaves,
			vec![Connection {
				source: "A".into(),
				target: "B".into()
			}]
		);
	}

	#[test]
	fn directed_leaf_needs_zero_out_degree() {
		let (data, config) = star(true);
		let model = build_model(&data, &config).unwrap();
		assert!(is_leaf("B", &model.matrix, true));
		assert!(!is_leaf("C", &model.matrix, true));
		assert!(is_leaf("D", &model.matrix, true));
	}

	#[test]
	fn node_without_row_has_no_leaf_connections() {
		let (data, config) = star(false);
		let model = build_model(&data, &config).unwrap();
		assert!(get_target_leaf_connections(&NodeId::from("E"), &model.matrix, false).is_empty());
	}

	#[test]
	fn toggle_is_copy_on_write() {
		let (data, config) = star(false);
		let model = build_model(&data, &config).unwrap();
		let connections = get_target_leaf_connections(&NodeId::from("A"), &model.matrix, false);
		let toggled = toggle_links_matrix_connections(&model.matrix, &connections, false);

		assert_eq!(model.matrix.weight("A", "B"), 1);
		assert_eq!(toggled.weight("A", "B"), 0);
		assert_eq!(toggled.weight("B", "A"), 0);
		assert!(Rc::ptr_eq(
			model.matrix.row_handle("D").unwrap(),
			toggled.row_handle("D").unwrap()
		));
		assert!(!Rc::ptr_eq(
			model.matrix.row_handle("A").unwrap(),
			toggled.row_handle("A").unwrap()
		));
	}

	#[test]
	fn first_toggle_of_missing_entry_sets_it() {
		let matrix = LinksMatrix::new();
		let toggled = toggle_links_matrix_connections(
			&matrix,
			&[Connection {
				source: "X".into(),
				target: "Y".into(),
			}],
			true,
		);
		assert_eq!(toggled.weight("X", "Y"), 1);
		assert_eq!(toggled.weight("Y", "X"), 0);
	}

	#[test]
	fn hidden_flags_follow_matrix() {
		let (data, config) = star(false);
		let model = build_model(&data, &config).unwrap();
		let connections = get_target_leaf_connections(&NodeId::from("A"), &model.matrix, false);
		let toggled = toggle_links_matrix_connections(&model.matrix, &connections, false);
		let links = toggle_links_connections(&model.links, &toggled);
		let hidden: Vec<_> = links.iter().map(|l| l.is_hidden).collect();
		assert_eq!(hidden, vec![true, false, false]);
		assert!(!is_node_visible("B", &model.nodes, &toggled));
		assert!(is_node_visible("E", &model.nodes, &toggled));
	}
}
