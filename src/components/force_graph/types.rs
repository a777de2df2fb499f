use std::borrow::Borrow;
use std::fmt;

use serde::{Deserialize, Deserializer, Serialize};

use super::error::GraphResult;

/// Stable identity of a node. Numeric ids in a payload are kept as their
/// decimal string so `1` and `"1"` name the same node.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct NodeId(String);

impl NodeId {
	/// Wrap a string id.
	pub fn new(id: impl Into<String>) -> Self {
		Self(id.into())
	}

	/// The id as text.
	pub fn as_str(&self) -> &str {
		&self.0
	}
}

impl fmt::Display for NodeId {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(&self.0)
	}
}

impl Borrow<str> for NodeId {
	fn borrow(&self) -> &str {
		&self.0
	}
}

impl From<&str> for NodeId {
	fn from(id: &str) -> Self {
		Self(id.to_owned())
	}
}

impl From<String> for NodeId {
	fn from(id: String) -> Self {
		Self(id)
	}
}

impl From<u64> for NodeId {
	fn from(id: u64) -> Self {
		Self(id.to_string())
	}
}

impl<'de> Deserialize<'de> for NodeId {
	fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
		#[derive(Deserialize)]
		#[serde(untagged)]
		enum RawId {
			Text(String),
			Unsigned(u64),
			Signed(i64),
			Float(f64),
		}

		Ok(match RawId::deserialize(deserializer)? {
			RawId::Text(s) => NodeId(s),
			RawId::Unsigned(n) => NodeId(n.to_string()),
			RawId::Signed(n) => NodeId(n.to_string()),
			RawId::Float(n) => NodeId(n.to_string()),
		})
	}
}

/// A node as supplied by the caller.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct GraphNode {
	/// Unique within the payload.
	pub id: NodeId,
	/// Text drawn next to the node.
	#[serde(default)]
	pub label: Option<String>,
	/// Fill color.
	#[serde(default)]
	pub color: Option<String>,
	/// Palette index used when no color is given.
	#[serde(default)]
	pub group: Option<u32>,
	/// Symbol area; overrides the config default.
	#[serde(default)]
	pub size: Option<f64>,
	/// Initial position. Authoritative in a static graph.
	#[serde(default)]
	pub x: Option<f64>,
	/// See `x`.
	#[serde(default)]
	pub y: Option<f64>,
	/// Fixed position. Both `fx` and `fy` pin the node.
	#[serde(default)]
	pub fx: Option<f64>,
	/// See `fx`.
	#[serde(default)]
	pub fy: Option<f64>,
}

impl GraphNode {
	/// A bare node with every optional field unset.
	pub fn new(id: impl Into<NodeId>) -> Self {
		Self {
			id: id.into(),
			label: None,
			color: None,
			group: None,
			size: None,
			x: None,
			y: None,
			fx: None,
			fy: None,
		}
	}

	/// Set the initial position.
	pub fn with_position(mut self, x: f64, y: f64) -> Self {
		self.x = Some(x);
		self.y = Some(y);
		self
	}

	/// Set the label.
	pub fn with_label(mut self, label: impl Into<String>) -> Self {
		self.label = Some(label.into());
		self
	}
}

/// A link as supplied by the caller.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct GraphLink {
	/// Id of the source node.
	pub source: NodeId,
	/// Id of the target node.
	pub target: NodeId,
	/// Drawn at the midpoint when link labels are on.
	#[serde(default)]
	pub label: Option<String>,
	/// Stroke color.
	#[serde(default)]
	pub color: Option<String>,
	/// Line width in pixels.
	#[serde(default)]
	pub stroke_width: Option<f64>,
}

impl GraphLink {
	/// A plain link between two ids.
	pub fn new(source: impl Into<NodeId>, target: impl Into<NodeId>) -> Self {
		Self {
			source: source.into(),
			target: target.into(),
			label: None,
			color: None,
			stroke_width: None,
		}
	}
}

/// Caller-supplied graph payload.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct GraphData {
	/// Nodes, in drawing order.
	pub nodes: Vec<GraphNode>,
	/// Links between ids in `nodes`.
	#[serde(default)]
	pub links: Vec<GraphLink>,
	/// Node to center and zoom on, if any.
	#[serde(default)]
	pub focused_node_id: Option<NodeId>,
}

impl GraphData {
	/// Parse a JSON payload. A node without `id` or a link without
	/// `source`/`target` is rejected here, before any model is built.
	pub fn from_json(payload: &str) -> GraphResult<Self> {
		Ok(serde_json::from_str(payload)?)
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn numeric_and_string_ids_normalise_to_same_key() {
		let data = GraphData::from_json(
			r#"{"nodes":[{"id":1},{"id":"2"}],"links":[{"source":1,"target":"2"}]}"#,
		)
		.unwrap();
		assert_eq!(data.nodes[0].id, NodeId::from("1"));
		assert_eq!(data.links[0].source, NodeId::from(1u64));
		assert_eq!(data.links[0].target.as_str(), "2");
	}

	#[test]
	fn node_without_id_is_rejected() {
		let err = GraphData::from_json(r#"{"nodes":[{"label":"nameless"}]}"#).unwrap_err();
		assert!(err.to_string().contains("payload"));
	}

	#[test]
	fn focused_node_id_is_optional() {
		let data = GraphData::from_json(r#"{"nodes":[],"focused_node_id":"A"}"#).unwrap();
		assert_eq!(data.focused_node_id, Some(NodeId::from("A")));
		let data = GraphData::from_json(r#"{"nodes":[]}"#).unwrap();
		assert_eq!(data.focused_node_id, None);
	}
}
