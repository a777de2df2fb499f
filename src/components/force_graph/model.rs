//! Simulation-ready graph model built from a [`GraphData`] payload.

use std::collections::{HashMap, HashSet};
use std::f64::consts::PI;
use std::rc::Rc;

use super::collapse::toggle_links_connections;
use super::config::GraphConfig;
use super::error::{GraphError, GraphResult};
use super::types::{GraphData, GraphLink, GraphNode, NodeId};

/// Radius of the ring that unpositioned nodes are seeded on.
const SEED_RADIUS: f64 = 100.0;

/// A node as the engine tracks it.
#[derive(Clone, Debug, PartialEq)]
pub struct Node {
	/// Stable identity.
	pub id: NodeId,
	/// Current position.
	pub x: f64,
	/// See `x`.
	pub y: f64,
	/// Fixed position, set by a drag or the payload.
	pub fx: Option<f64>,
	/// See `fx`.
	pub fy: Option<f64>,
	/// Fixed by the payload rather than by a drag.
	pub pinned: bool,
	/// Drawn as highlighted.
	pub highlighted: bool,
	/// No link referenced this node when the model was built.
	pub orphan: bool,
	/// Payload label.
	pub label: Option<String>,
	/// Payload color.
	pub color: Option<String>,
	/// Payload palette group.
	pub group: Option<u32>,
	/// Payload symbol area.
	pub size: Option<f64>,
}

impl Node {
	fn from_payload(raw: &GraphNode, seed: (f64, f64)) -> Self {
		let pinned = raw.fx.is_some() && raw.fy.is_some();
		let (x, y) = match (raw.fx, raw.fy) {
			(Some(fx), Some(fy)) => (fx, fy),
			_ => (raw.x.unwrap_or(seed.0), raw.y.unwrap_or(seed.1)),
		};
		Self {
			id: raw.id.clone(),
			x,
			y,
			fx: raw.fx.filter(|_| pinned),
			fy: raw.fy.filter(|_| pinned),
			pinned,
			highlighted: false,
			orphan: false,
			label: raw.label.clone(),
			color: raw.color.clone(),
			group: raw.group,
			size: raw.size,
		}
	}

	/// Both fixed coordinates are set.
	pub fn is_fixed(&self) -> bool {
		self.fx.is_some() && self.fy.is_some()
	}

	/// Pin the node where it currently is.
	pub fn fix_at_current(&mut self) {
		self.fx = Some(self.x);
		self.fy = Some(self.y);
	}

	/// Clear the fixed position.
	pub fn release(&mut self) {
		self.fx = None;
		self.fy = None;
	}
}

/// Insertion-ordered id -> node map. The ordered slice doubles as the node
/// array handed to the physics integrator.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct NodeMap {
	nodes: Vec<Node>,
	index_by_id: HashMap<NodeId, usize>,
}

impl NodeMap {
	/// Number of nodes.
	pub fn len(&self) -> usize {
		self.nodes.len()
	}

	/// No nodes.
	pub fn is_empty(&self) -> bool {
		self.nodes.is_empty()
	}

	/// Node by id.
	pub fn get(&self, id: &str) -> Option<&Node> {
		self.index_by_id.get(id).map(|&i| &self.nodes[i])
	}

	/// Node by id, mutably.
	pub fn get_mut(&mut self, id: &str) -> Option<&mut Node> {
		self.index_by_id.get(id).map(|&i| &mut self.nodes[i])
	}

	/// `id` names a node.
	pub fn contains(&self, id: &str) -> bool {
		self.index_by_id.contains_key(id)
	}

	/// Position of `id` in the node array.
	pub fn index_of(&self, id: &str) -> Option<usize> {
		self.index_by_id.get(id).copied()
	}

	/// Node at `index` in the node array.
	pub fn by_index(&self, index: usize) -> Option<&Node> {
		self.nodes.get(index)
	}

	/// Node at `index`, mutably.
	pub fn by_index_mut(&mut self, index: usize) -> Option<&mut Node> {
		self.nodes.get_mut(index)
	}

	/// Nodes in insertion order.
	pub fn iter(&self) -> impl Iterator<Item = &Node> {
		self.nodes.iter()
	}

	/// Nodes in insertion order, mutably.
	pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut Node> {
		self.nodes.iter_mut()
	}

	/// The node array.
	pub fn as_slice(&self) -> &[Node] {
		&self.nodes
	}

	fn insert(&mut self, node: Node) -> GraphResult<()> {
		if self.index_by_id.contains_key(&node.id) {
			return Err(GraphError::DuplicateNodeId(node.id));
		}
		self.index_by_id.insert(node.id.clone(), self.nodes.len());
		self.nodes.push(node);
		Ok(())
	}
}

/// A link as the engine tracks it.
#[derive(Clone, Debug, PartialEq)]
pub struct Link {
	/// Source id.
	pub source: NodeId,
	/// Target id.
	pub target: NodeId,
	/// Collapsed: the matrix weight for this pair is 0.
	pub is_hidden: bool,
	/// Payload label.
	pub label: Option<String>,
	/// Payload color.
	pub color: Option<String>,
	/// Payload line width.
	pub stroke_width: Option<f64>,
}

impl Link {
	fn from_payload(raw: &GraphLink) -> Self {
		Self {
			source: raw.source.clone(),
			target: raw.target.clone(),
			is_hidden: false,
			label: raw.label.clone(),
			color: raw.color.clone(),
			stroke_width: raw.stroke_width,
		}
	}
}

/// Neighbor weights of a single source, in insertion order.
#[derive(Clone, Debug, Default)]
pub struct MatrixRow {
	entries: Vec<(NodeId, u32)>,
	index: HashMap<NodeId, usize>,
}

impl MatrixRow {
	/// Weight of `target`, 0 when absent.
	pub fn weight(&self, target: &str) -> u32 {
		self.get(target).unwrap_or(0)
	}

	/// Weight of `target`, or `None` when the pair was never connected.
	pub fn get(&self, target: &str) -> Option<u32> {
		self.index.get(target).map(|&i| self.entries[i].1)
	}

	/// Entries in insertion order.
	pub fn iter(&self) -> impl Iterator<Item = (&NodeId, u32)> {
		self.entries.iter().map(|(id, w)| (id, *w))
	}

	/// Insert or overwrite one entry.
	pub fn set(&mut self, target: &NodeId, weight: u32) {
		match self.index.get(target) {
			Some(&i) => self.entries[i].1 = weight,
			None => {
				self.index.insert(target.clone(), self.entries.len());
				self.entries.push((target.clone(), weight));
			}
		}
	}
}

/// Connections matrix: source -> target -> weight.
///
/// Rows are shared behind `Rc`, so cloning the matrix and editing one row
/// leaves every other row shared with the original.
#[derive(Clone, Debug, Default)]
pub struct LinksMatrix {
	rows: Vec<(NodeId, Rc<MatrixRow>)>,
	index: HashMap<NodeId, usize>,
}

impl LinksMatrix {
	/// An empty matrix.
	pub fn new() -> Self {
		Self::default()
	}

	/// Weight of the pair, 0 when absent.
	pub fn weight(&self, source: &str, target: &str) -> u32 {
		self.row(source).map_or(0, |row| row.weight(target))
	}

	/// Row of `source`, if it has one.
	pub fn row(&self, source: &str) -> Option<&MatrixRow> {
		self.index.get(source).map(|&i| self.rows[i].1.as_ref())
	}

	/// Shared handle to a row, for checking structural sharing.
	pub fn row_handle(&self, source: &str) -> Option<&Rc<MatrixRow>> {
		self.index.get(source).map(|&i| &self.rows[i].1)
	}

	/// Rows in insertion order.
	pub fn rows(&self) -> impl Iterator<Item = (&NodeId, &MatrixRow)> {
		self.rows.iter().map(|(id, row)| (id, row.as_ref()))
	}

	/// Set one weight, copying the row first if it is shared.
	pub fn set(&mut self, source: &NodeId, target: &NodeId, weight: u32) {
		Rc::make_mut(self.row_entry(source)).set(target, weight);
	}

	/// Make sure `source` owns a (possibly empty) row.
	pub fn ensure_row(&mut self, source: &NodeId) {
		self.row_entry(source);
	}

	fn row_entry(&mut self, source: &NodeId) -> &mut Rc<MatrixRow> {
		let i = match self.index.get(source) {
			Some(&i) => i,
			None => {
				self.index.insert(source.clone(), self.rows.len());
				self.rows.push((source.clone(), Rc::new(MatrixRow::default())));
				self.rows.len() - 1
			}
		};
		&mut self.rows[i].1
	}
}

/// Equal when every pair has the same weight, a missing entry counting as 0.
impl PartialEq for LinksMatrix {
	fn eq(&self, other: &Self) -> bool {
		let covers = |a: &LinksMatrix, b: &LinksMatrix| {
			a.rows
				.iter()
				.all(|(source, row)| {
					row.iter()
						.all(|(target, w)| b.weight(source.as_str(), target.as_str()) == w)
				})
		};
		covers(self, other) && covers(other, self)
	}
}

/// Everything the engine owns about the graph's structure.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct GraphModel {
	/// Nodes by id, in payload order.
	pub nodes: NodeMap,
	/// Links in payload order.
	pub links: Vec<Link>,
	/// Connection weights; 0 marks a collapsed pair.
	pub matrix: LinksMatrix,
}

impl GraphModel {
	/// Ordered node array handed to the physics integrator.
	pub fn sim_nodes(&self) -> &[Node] {
		self.nodes.as_slice()
	}

	/// Link array handed to the physics integrator.
	pub fn sim_links(&self) -> &[Link] {
		&self.links
	}

	/// Build a fresh model and carry position state over from `self` for
	/// every id present in both.
	pub fn rebuild(&self, data: &GraphData, config: &GraphConfig) -> GraphResult<GraphModel> {
		let mut next = build_model(data, config)?;
		// In a static graph, coordinates from the payload are authoritative.
		let supplied: HashSet<&NodeId> = if config.static_graph {
			data.nodes
				.iter()
				.filter(|raw| raw.x.is_some() && raw.y.is_some())
				.map(|raw| &raw.id)
				.collect()
		} else {
			HashSet::new()
		};
		for node in next.nodes.iter_mut() {
			let Some(old) = self.nodes.get(node.id.as_str()) else {
				continue;
			};
			if node.pinned || supplied.contains(&node.id) {
				continue;
			}
			node.x = old.x;
			node.y = old.y;
			if !old.pinned {
				node.fx = old.fx;
				node.fy = old.fy;
			}
		}
		Ok(next)
	}

	/// Take the collapse state of `previous`: every pair present in both
	/// matrices gets its previous weight, then link visibility follows.
	/// Only meaningful when both models were built with the same direction.
	pub fn carry_collapse(&mut self, previous: &GraphModel) {
		let carried: Vec<(NodeId, NodeId, u32)> = self
			.matrix
			.rows()
			.filter_map(|(source, row)| {
				let before = previous.matrix.row(source.as_str())?;
				Some(row.iter().filter_map(move |(target, weight)| {
					before
						.get(target.as_str())
						.filter(|&w| w != weight)
						.map(|w| (source.clone(), target.clone(), w))
				}))
			})
			.flatten()
			.collect();
		for (source, target, weight) in &carried {
			self.matrix.set(source, target, *weight);
		}
		self.links = toggle_links_connections(&self.links, &self.matrix);
	}
}

/// Build the model for `data`. Pure; the caller owns the result.
pub fn build_model(data: &GraphData, config: &GraphConfig) -> GraphResult<GraphModel> {
	let mut nodes = NodeMap::default();
	let count = data.nodes.len().max(1) as f64;
	let (cx, cy) = (config.width / 2.0, config.height / 2.0);
	for (i, raw) in data.nodes.iter().enumerate() {
		let angle = (i as f64) * 2.0 * PI / count;
		let seed = (cx + SEED_RADIUS * angle.cos(), cy + SEED_RADIUS * angle.sin());
		nodes.insert(Node::from_payload(raw, seed))?;
	}

	let mut matrix = LinksMatrix::new();
	let mut linked: HashSet<&NodeId> = HashSet::new();
	let mut links = Vec::with_capacity(data.links.len());
	for raw in &data.links {
		if !nodes.contains(raw.source.as_str()) || !nodes.contains(raw.target.as_str()) {
			return Err(GraphError::DanglingLinkReference {
				source_id: raw.source.clone(),
				target_id: raw.target.clone(),
			});
		}
		matrix.ensure_row(&raw.source);
		matrix.ensure_row(&raw.target);
		matrix.set(&raw.source, &raw.target, 1);
		if !config.directed {
			matrix.set(&raw.target, &raw.source, 1);
		}
		linked.insert(&raw.source);
		linked.insert(&raw.target);
		links.push(Link::from_payload(raw));
	}

	for node in nodes.iter_mut() {
		node.orphan = !linked.contains(&node.id);
	}

	Ok(GraphModel {
		nodes,
		links,
		matrix,
	})
}

#[cfg(test)]
mod tests {
	use pretty_assertions::assert_eq;

	use super::*;

	fn data(nodes: &[&str], links: &[(&str, &str)]) -> GraphData {
		GraphData {
			nodes: nodes.iter().map(|&id| GraphNode::new(id)).collect(),
			links: links.iter().map(|&(s, t)| GraphLink::new(s, t)).collect(),
			focused_node_id: None,
		}
	}

	#[test]
	fn duplicate_node_id_is_rejected() {
		let err = build_model(&data(&["A", "B", "A"], &[]), &GraphConfig::default()).unwrap_err();
		assert!(matches!(err, GraphError::DuplicateNodeId(id) if id.as_str() == "A"));
	}

	#[test]
	fn dangling_link_is_rejected() {
		let err =
			build_model(&data(&["A"], &[("A", "Z")]), &GraphConfig::default()).unwrap_err();
		assert!(matches!(
			err,
			GraphError::DanglingLinkReference { ref target_id, .. } if target_id.as_str() == "Z"
		));
	}

	#[test]
	fn undirected_matrix_is_mirrored() {
		let model =
			build_model(&data(&["A", "B"], &[("A", "B")]), &GraphConfig::default()).unwrap();
		assert_eq!(model.matrix.weight("A", "B"), 1);
		assert_eq!(model.matrix.weight("B", "A"), 1);
	}

	#[test]
	fn directed_matrix_keeps_direction_but_creates_target_row() {
		let config = GraphConfig {
			directed: true,
			..GraphConfig::default()
		};
		let model = build_model(&data(&["A", "B"], &[("A", "B")]), &config).unwrap();
		assert_eq!(model.matrix.weight("A", "B"), 1);
		assert_eq!(model.matrix.weight("B", "A"), 0);
		assert!(model.matrix.row("B").is_some());
	}

	#[test]
	fn orphans_are_marked() {
		let model = build_model(&data(&["A", "B", "D"], &[("A", "B")]), &GraphConfig::default())
			.unwrap();
		let orphans: Vec<_> = model
			.nodes
			.iter()
			.filter(|n| n.orphan)
			.map(|n| n.id.as_str())
			.collect();
		assert_eq!(orphans, vec!["D"]);
	}

	#[test]
	fn duplicate_links_do_not_add_multiplicity() {
		let model = build_model(
			&data(&["A", "B"], &[("A", "B"), ("B", "A"), ("A", "B")]),
			&GraphConfig::default(),
		)
		.unwrap();
		assert_eq!(model.matrix.weight("A", "B"), 1);
		assert_eq!(model.links.len(), 3);
	}

	#[test]
	fn unpositioned_nodes_are_seeded_apart() {
		let model = build_model(&data(&["A", "B", "C"], &[]), &GraphConfig::default()).unwrap();
		let a = model.nodes.get("A").unwrap();
		let b = model.nodes.get("B").unwrap();
		assert!((a.x - b.x).abs() + (a.y - b.y).abs() > 1.0);
	}

	#[test]
	fn payload_fixed_position_pins_the_node() {
		let mut raw = data(&["A"], &[]);
		raw.nodes[0].fx = Some(10.0);
		raw.nodes[0].fy = Some(20.0);
		let model = build_model(&raw, &GraphConfig::default()).unwrap();
		let a = model.nodes.get("A").unwrap();
		assert!(a.pinned);
		assert_eq!((a.x, a.y), (10.0, 20.0));
	}

	#[test]
	fn rebuild_carries_positions_for_surviving_ids() {
		let config = GraphConfig::default();
		let mut model = build_model(&data(&["A", "B"], &[("A", "B")]), &config).unwrap();
		{
			let b = model.nodes.get_mut("B").unwrap();
			b.x = 42.0;
			b.y = -7.0;
			b.fix_at_current();
		}
		let next = model
			.rebuild(&data(&["A", "B", "C"], &[("A", "B"), ("B", "C")]), &config)
			.unwrap();
		let b = next.nodes.get("B").unwrap();
		assert_eq!((b.x, b.y, b.fx, b.fy), (42.0, -7.0, Some(42.0), Some(-7.0)));
		assert!(!next.nodes.get("C").unwrap().is_fixed());
	}

	#[test]
	fn matrix_equality_treats_missing_as_zero() {
		let mut a = LinksMatrix::new();
		let b = LinksMatrix::new();
		a.set(&NodeId::from("X"), &NodeId::from("Y"), 0);
		assert_eq!(a, b);
		a.set(&NodeId::from("X"), &NodeId::from("Y"), 1);
		assert!(a != b);
	}
}
