//! Graph configuration and the explicit override merge.
//!
//! Every graph instance derives its own [`GraphConfig`] by merging a caller
//! override (a JSON object) over the process-wide defaults. The merge is
//! key-by-key, last-write-wins and recursive for nested sections. Unknown keys
//! and values whose JSON type does not match the default are ignored, so a
//! malformed override degrades to defaults instead of failing.

use std::sync::LazyLock;

use log::{debug, warn};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Parameters handed to the physics integrator.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ForceConfig {
	/// Energy the simulation settles toward after a restart.
	pub alpha_target: f64,
	/// Per-step approach rate toward `alpha_target`.
	pub alpha_decay: f64,
	/// Energy below which the simulation stops.
	pub alpha_min: f64,
	/// Charge between every pair of nodes; negative repels.
	pub gravity: f64,
	/// Preferred link length, in graph units.
	pub link_length: f64,
	/// Spring stiffness multiplier.
	pub link_strength: f64,
}

impl Default for ForceConfig {
	fn default() -> Self {
		Self {
			alpha_target: 0.05,
			alpha_decay: 0.0228,
			alpha_min: 0.001,
			gravity: -100.0,
			link_length: 100.0,
			link_strength: 1.0,
		}
	}
}

/// Node rendering defaults; a payload node's own values win.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NodeConfig {
	/// Fill color.
	pub color: String,
	/// Label color.
	pub font_color: String,
	/// Label size in pixels.
	pub font_size: f64,
	/// `"SAME"` keeps the node's own color when highlighted.
	pub highlight_color: String,
	/// `"SAME"` keeps the regular stroke.
	pub highlight_stroke_color: String,
	/// Opacity when nothing is highlighted.
	pub opacity: f64,
	/// Draw labels, falling back to the id.
	pub render_label: bool,
	/// Symbol area.
	pub size: f64,
	/// `"none"` draws no outline.
	pub stroke_color: String,
	/// Line width in pixels.
	pub stroke_width: f64,
}

impl Default for NodeConfig {
	fn default() -> Self {
		Self {
			color: "#d3d3d3".into(),
			font_color: "black".into(),
			font_size: 8.0,
			highlight_color: "SAME".into(),
			highlight_stroke_color: "SAME".into(),
			opacity: 1.0,
			render_label: true,
			size: 200.0,
			stroke_color: "none".into(),
			stroke_width: 1.5,
		}
	}
}

/// Link rendering defaults.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LinkConfig {
	/// Stroke color.
	pub color: String,
	/// Label color.
	pub font_color: String,
	/// Label size in pixels.
	pub font_size: f64,
	/// CSS font weight for link labels.
	pub font_weight: String,
	/// Stroke color while highlighted.
	pub highlight_color: String,
	/// Opacity when nothing is highlighted.
	pub opacity: f64,
	/// Draw link labels at the segment midpoint.
	pub render_label: bool,
	/// Line width in pixels.
	pub stroke_width: f64,
}

impl Default for LinkConfig {
	fn default() -> Self {
		Self {
			color: "#d3d3d3".into(),
			font_color: "black".into(),
			font_size: 8.0,
			font_weight: "normal".into(),
			highlight_color: "#d3d3d3".into(),
			opacity: 1.0,
			render_label: false,
			stroke_width: 1.5,
		}
	}
}

/// Per-instance configuration. Keys are snake_case; see [`merge_overrides`].
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GraphConfig {
	/// Restart the simulation when a drag ends.
	pub automatic_rearrange_after_drop_node: bool,
	/// Clicking a node hides or shows its leaf neighbors.
	pub collapsible: bool,
	/// Links point from source to target; arrowheads are drawn.
	pub directed: bool,
	/// Seconds.
	pub focus_animation_duration: f64,
	/// Zoom scale applied around a focused node.
	pub focus_zoom: f64,
	/// Viewport height in pixels.
	pub height: f64,
	/// 0 highlights only the hovered node, 1 adds its neighbors.
	pub highlight_degree: u32,
	/// Opacity of everything not highlighted while something is.
	pub highlight_opacity: f64,
	/// Hovering a link highlights it.
	pub link_highlight_behavior: bool,
	/// Upper zoom bound.
	pub max_zoom: f64,
	/// Lower zoom bound.
	pub min_zoom: f64,
	/// Hovering a node highlights it and its neighbors.
	pub node_highlight_behavior: bool,
	/// Persist the zoom scale so sizes stay constant on screen.
	pub pan_and_zoom: bool,
	/// No physics; nodes stay where the payload puts them.
	pub static_graph: bool,
	/// Viewport width in pixels.
	pub width: f64,
	/// Integrator parameters.
	pub forces: ForceConfig,
	/// Node defaults.
	pub node: NodeConfig,
	/// Link defaults.
	pub link: LinkConfig,
}

impl Default for GraphConfig {
	fn default() -> Self {
		Self {
			automatic_rearrange_after_drop_node: false,
			collapsible: false,
			directed: false,
			focus_animation_duration: 0.75,
			focus_zoom: 1.0,
			height: 400.0,
			highlight_degree: 1,
			highlight_opacity: 1.0,
			link_highlight_behavior: false,
			max_zoom: 8.0,
			min_zoom: 0.1,
			node_highlight_behavior: false,
			pan_and_zoom: false,
			static_graph: false,
			width: 800.0,
			forces: ForceConfig::default(),
			node: NodeConfig::default(),
			link: LinkConfig::default(),
		}
	}
}

static DEFAULT_CONFIG: LazyLock<Value> = LazyLock::new(|| {
	serde_json::to_value(GraphConfig::default()).unwrap_or_else(|_| Value::Object(Map::new()))
});

impl GraphConfig {
	/// Merge `overrides` over the defaults. Never fails.
	pub fn from_overrides(overrides: &Value) -> Self {
		let mut merged = DEFAULT_CONFIG.clone();
		merge_overrides(&mut merged, overrides, "");
		match serde_json::from_value(merged) {
			Ok(config) => config,
			Err(err) => {
				warn!("config override rejected, falling back to defaults: {err}");
				Self::default()
			}
		}
	}

	/// Zoom scale clamped to the configured bounds.
	pub fn clamp_zoom(&self, k: f64) -> f64 {
		let (lo, hi) = if self.min_zoom <= self.max_zoom {
			(self.min_zoom, self.max_zoom)
		} else {
			(self.max_zoom, self.min_zoom)
		};
		k.clamp(lo, hi)
	}
}

/// Overlay `patch` onto `base` key by key. Objects recurse; scalars replace
/// only when the JSON kind matches what `base` already holds.
pub fn merge_overrides(base: &mut Value, patch: &Value, path: &str) {
	let (Value::Object(base_map), Value::Object(patch_map)) = (&mut *base, patch) else {
		if !patch.is_null() && !patch.is_object() {
			warn!("ignoring non-object config override at `{path}`");
		}
		return;
	};

	for (key, value) in patch_map {
		let key_path = if path.is_empty() {
			key.clone()
		} else {
			format!("{path}.{key}")
		};
		let Some(slot) = base_map.get_mut(key) else {
			debug!("ignoring unknown config key `{key_path}`");
			continue;
		};
		if value.is_null() {
			continue;
		}
		if slot.is_object() {
			merge_overrides(slot, value, &key_path);
		} else if same_kind(slot, value) {
			*slot = value.clone();
		} else {
			warn!("ignoring config key `{key_path}`: expected {}, got {value}", kind_name(slot));
		}
	}
}

fn same_kind(current: &Value, candidate: &Value) -> bool {
	match current {
		Value::Bool(_) => candidate.is_boolean(),
		Value::String(_) => candidate.is_string(),
		Value::Number(n) if n.is_u64() => candidate.is_u64(),
		Value::Number(_) => candidate.is_number(),
		Value::Array(_) => candidate.is_array(),
		Value::Object(_) => candidate.is_object(),
		Value::Null => false,
	}
}

fn kind_name(value: &Value) -> &'static str {
	match value {
		Value::Bool(_) => "a boolean",
		Value::String(_) => "a string",
		Value::Number(n) if n.is_u64() => "an unsigned integer",
		Value::Number(_) => "a number",
		Value::Array(_) => "an array",
		Value::Object(_) => "an object",
		Value::Null => "null",
	}
}

#[cfg(test)]
mod tests {
	use pretty_assertions::assert_eq;
	use serde_json::json;

	use super::*;

	#[test]
	fn empty_override_yields_defaults() {
		assert_eq!(GraphConfig::from_overrides(&json!({})), GraphConfig::default());
		assert_eq!(GraphConfig::from_overrides(&Value::Null), GraphConfig::default());
	}

	#[test]
	fn nested_override_keeps_sibling_defaults() {
		let config = GraphConfig::from_overrides(&json!({
			"collapsible": true,
			"node": { "color": "lightgreen" },
			"link": { "render_label": true, "font_size": 12 },
			"forces": { "link_length": 50 }
		}));
		assert!(config.link.render_label);
		assert_eq!(config.link.font_size, 12.0);
		assert_eq!(config.link.font_weight, "normal");
		assert!(config.collapsible);
		assert_eq!(config.node.color, "lightgreen");
		assert_eq!(config.node.size, 200.0);
		assert_eq!(config.forces.link_length, 50.0);
		assert_eq!(config.forces.alpha_target, 0.05);
	}

	#[test]
	fn mismatched_and_unknown_keys_are_ignored() {
		let config = GraphConfig::from_overrides(&json!({
			"directed": "yes",
			"highlight_degree": 1.5,
			"not_a_key": 3,
			"width": 1024
		}));
		assert!(!config.directed);
		assert_eq!(config.highlight_degree, 1);
		assert_eq!(config.width, 1024.0);
	}

	#[test]
	fn non_object_override_falls_back_to_defaults() {
		assert_eq!(GraphConfig::from_overrides(&json!([1, 2])), GraphConfig::default());
		assert_eq!(
			GraphConfig::from_overrides(&json!({ "forces": 3 })).forces,
			ForceConfig::default()
		);
	}

	#[test]
	fn clamp_zoom_respects_bounds() {
		let config = GraphConfig::default();
		assert_eq!(config.clamp_zoom(100.0), 8.0);
		assert_eq!(config.clamp_zoom(0.0), 0.1);
		assert_eq!(config.clamp_zoom(2.0), 2.0);
	}
}
