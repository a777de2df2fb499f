//! Classifies an incoming (data, config) pair against the current one.
//!
//! Comparisons short-circuit on the first difference, so an unchanged update
//! costs a single linear pass and never touches the model.

use std::collections::HashSet;

use super::config::GraphConfig;
use super::types::{GraphData, GraphLink, GraphNode, NodeId};

/// What an update changed, one flag per concern.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct UpdateVerdict {
	/// Node or link payloads differ by value; the model is rebuilt.
	pub graph_elements_updated: bool,
	/// The node-id set or link endpoint set differs; forces are re-registered
	/// and the simulation restarted.
	pub new_graph_elements: bool,
	/// The merged config differs.
	pub config_updated: bool,
	/// Integrator parameters changed; forces are re-registered.
	pub force_config_updated: bool,
	/// The requested focus target differs.
	pub focus_changed: bool,
	/// `pan_and_zoom` was toggled, so the persisted zoom scale resets.
	pub pan_and_zoom_toggled: bool,
}

/// Coarse classification of an update.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum UpdateKind {
	/// Nothing to do.
	NoOp,
	/// Nodes or links changed.
	DataChanged,
	/// Only configuration changed.
	ConfigChanged,
	/// Only the focus target changed.
	FocusChanged,
}

impl UpdateVerdict {
	/// Nothing changed; the update can be dropped.
	pub fn is_noop(&self) -> bool {
		*self == Self::default()
	}

	/// Data changes dominate config changes, which dominate focus changes.
	pub fn kind(&self) -> UpdateKind {
		if self.graph_elements_updated {
			UpdateKind::DataChanged
		} else if self.config_updated {
			UpdateKind::ConfigChanged
		} else if self.focus_changed {
			UpdateKind::FocusChanged
		} else {
			UpdateKind::NoOp
		}
	}
}

/// Compare `next` against `current`. Pure and infallible.
pub fn classify(
	current_data: &GraphData,
	current_config: &GraphConfig,
	next_data: &GraphData,
	next_config: &GraphConfig,
) -> UpdateVerdict {
	let graph_elements_updated = current_data.nodes != next_data.nodes
		|| current_data.links != next_data.links;
	let new_graph_elements = graph_elements_updated
		&& (!same_node_ids(&current_data.nodes, &next_data.nodes)
			|| !same_link_endpoints(&current_data.links, &next_data.links));
	let config_updated = current_config != next_config;
	let force_config_updated = config_updated && current_config.forces != next_config.forces;

	UpdateVerdict {
		graph_elements_updated,
		new_graph_elements,
		config_updated,
		force_config_updated,
		focus_changed: current_data.focused_node_id != next_data.focused_node_id,
		pan_and_zoom_toggled: current_config.pan_and_zoom != next_config.pan_and_zoom,
	}
}

fn same_node_ids(current: &[GraphNode], next: &[GraphNode]) -> bool {
	if current.len() != next.len() {
		return false;
	}
	if current.iter().zip(next).all(|(a, b)| a.id == b.id) {
		return true;
	}
	let ids: HashSet<&NodeId> = current.iter().map(|n| &n.id).collect();
	next.iter().all(|n| ids.contains(&n.id))
}

fn same_link_endpoints(current: &[GraphLink], next: &[GraphLink]) -> bool {
	if current.len() != next.len() {
		return false;
	}
	if current
		.iter()
		.zip(next)
		.all(|(a, b)| a.source == b.source && a.target == b.target)
	{
		return true;
	}
	let pairs: HashSet<(&NodeId, &NodeId)> =
		current.iter().map(|l| (&l.source, &l.target)).collect();
	next.iter().all(|l| pairs.contains(&(&l.source, &l.target)))
}
