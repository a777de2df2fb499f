//! Transient interaction state: highlight, zoom, focus and its animation.

use log::debug;

use super::config::GraphConfig;
use super::model::{GraphModel, Node};
use super::types::NodeId;

/// Pan/zoom transform applied to the rendered container.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ViewTransform {
	/// Horizontal translation in screen pixels.
	pub x: f64,
	/// Vertical translation in screen pixels.
	pub y: f64,
	/// Scale.
	pub k: f64,
}

impl Default for ViewTransform {
	fn default() -> Self {
		Self {
			x: 0.0,
			y: 0.0,
			k: 1.0,
		}
	}
}

impl ViewTransform {
	/// Map a screen point into graph coordinates.
	pub fn screen_to_graph(&self, sx: f64, sy: f64) -> (f64, f64) {
		((sx - self.x) / self.k, (sy - self.y) / self.k)
	}
}

/// `translate(w/2, h/2) scale(k) translate(-x, -y)`, flattened.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FocusTransformation {
	/// Horizontal translation after scaling.
	pub translate_x: f64,
	/// Vertical translation after scaling.
	pub translate_y: f64,
	/// Clamped focus zoom.
	pub scale: f64,
}

impl FocusTransformation {
	/// Center `node` in the viewport at the configured focus zoom.
	pub fn centered_on(node: &Node, viewport: (f64, f64), config: &GraphConfig) -> Self {
		let scale = config.clamp_zoom(config.focus_zoom);
		Self {
			translate_x: viewport.0 / 2.0 - scale * node.x,
			translate_y: viewport.1 / 2.0 - scale * node.y,
			scale,
		}
	}

	/// Map a graph point to the screen.
	pub fn apply(&self, x: f64, y: f64) -> (f64, f64) {
		(
			self.translate_x + self.scale * x,
			self.translate_y + self.scale * y,
		)
	}
}

/// Pending disarm of the focus animation, advanced by ticks.
#[derive(Clone, Copy, Debug, PartialEq)]
struct DisarmTimer {
	elapsed: f64,
	duration: f64,
}

/// Hover, zoom and focus state of one graph instance.
#[derive(Clone, Debug, PartialEq)]
pub struct InteractionState {
	highlighted_node: Option<NodeId>,
	highlighted_link: Option<(NodeId, NodeId)>,
	/// Zoom scale kept for the renderer when pan and zoom is enabled.
	transform: f64,
	view: ViewTransform,
	viewport: (f64, f64),
	focused_node_id: Option<NodeId>,
	focus_transformation: Option<FocusTransformation>,
	enable_focus_animation: bool,
	/// At most one pending disarm; arming replaces it.
	disarm: Option<DisarmTimer>,
}

impl InteractionState {
	/// Nothing highlighted or focused, identity zoom.
	pub fn new(config: &GraphConfig) -> Self {
		Self {
			highlighted_node: None,
			highlighted_link: None,
			transform: 1.0,
			view: ViewTransform::default(),
			viewport: (config.width, config.height),
			focused_node_id: None,
			focus_transformation: None,
			enable_focus_animation: false,
			disarm: None,
		}
	}

	/// Node under the pointer, when highlighting is on.
	pub fn highlighted_node(&self) -> Option<&NodeId> {
		self.highlighted_node.as_ref()
	}

	/// Link under the pointer as (source, target).
	pub fn highlighted_link(&self) -> Option<(&NodeId, &NodeId)> {
		self.highlighted_link.as_ref().map(|(s, t)| (s, t))
	}

	/// Persisted zoom scale, 1 unless pan and zoom is on.
	pub fn transform(&self) -> f64 {
		self.transform
	}

	/// Transform from the last zoom gesture.
	pub fn view(&self) -> ViewTransform {
		self.view
	}

	/// The transform the container is drawn with: the focus transformation
	/// while a focus target is set, else the gesture transform.
	pub fn effective_view(&self) -> ViewTransform {
		self.focus_transformation
			.map_or(self.view, |focus| ViewTransform {
				x: focus.translate_x,
				y: focus.translate_y,
				k: focus.scale,
			})
	}

	/// (width, height) in pixels.
	pub fn viewport(&self) -> (f64, f64) {
		self.viewport
	}

	/// Requested focus target, whether or not it exists.
	pub fn focused_node_id(&self) -> Option<&NodeId> {
		self.focused_node_id.as_ref()
	}

	/// Set while a focus target exists in the model.
	pub fn focus_transformation(&self) -> Option<FocusTransformation> {
		self.focus_transformation
	}

	/// The renderer should ease toward the focus transformation.
	pub fn focus_animation_enabled(&self) -> bool {
		self.enable_focus_animation
	}

	/// Seconds the renderer should take to move to the focus transformation.
	pub fn transition_duration(&self, config: &GraphConfig) -> f64 {
		if self.enable_focus_animation {
			config.focus_animation_duration
		} else {
			0.0
		}
	}

	/// New viewport size, in pixels.
	pub fn resize(&mut self, width: f64, height: f64) {
		self.viewport = (width, height);
	}

	/// Highlight `id` (and its neighbors, per `highlight_degree`) or clear it.
	pub fn set_node_highlighted(
		&mut self,
		model: &mut GraphModel,
		config: &GraphConfig,
		id: &NodeId,
		value: bool,
	) {
		self.highlighted_node = value.then(|| id.clone());
		if let Some(node) = model.nodes.get_mut(id.as_str()) {
			node.highlighted = value;
		}
		if config.highlight_degree == 0 {
			return;
		}
		let neighbors: Vec<NodeId> = model
			.matrix
			.row(id.as_str())
			.map(|row| row.iter().map(|(target, _)| target.clone()).collect())
			.unwrap_or_default();
		for neighbor in neighbors {
			if let Some(node) = model.nodes.get_mut(neighbor.as_str()) {
				node.highlighted = value;
			}
		}
	}

	/// Highlight a link, or clear with `None`.
	pub fn set_link_highlighted(&mut self, link: Option<(NodeId, NodeId)>) {
		self.highlighted_link = link;
	}

	/// Apply a zoom gesture. The container always follows the gesture; the
	/// scale is only persisted for the renderer when pan and zoom is on.
	pub fn zoom(&mut self, transform: ViewTransform, config: &GraphConfig) {
		self.view = ViewTransform {
			k: config.clamp_zoom(transform.k),
			..transform
		};
		if config.pan_and_zoom {
			self.transform = self.view.k;
		}
	}

	/// Back to scale 1, as when pan and zoom is toggled.
	pub fn reset_transform(&mut self) {
		self.transform = 1.0;
	}

	/// Record the requested focus target and arm the animation when it moved.
	pub fn set_focus(&mut self, target: Option<NodeId>, model: &GraphModel, config: &GraphConfig) {
		let changed = target != self.focused_node_id;
		self.focused_node_id = target;
		self.refresh_focus(model, config);
		if changed {
			self.arm_focus_animation(config);
		}
	}

	/// Recompute the focus transformation from the target's current position.
	pub fn refresh_focus(&mut self, model: &GraphModel, config: &GraphConfig) {
		self.focus_transformation = self
			.focused_node_id
			.as_ref()
			.and_then(|id| model.nodes.get(id.as_str()))
			.map(|node| FocusTransformation::centered_on(node, self.viewport, config));
	}

	/// Arm the focus animation. The pending disarm, if any, is replaced so a
	/// stale timer can never clear the newer animation.
	pub fn arm_focus_animation(&mut self, config: &GraphConfig) {
		self.enable_focus_animation = true;
		self.disarm = Some(DisarmTimer {
			elapsed: 0.0,
			duration: config.focus_animation_duration.max(0.0),
		});
		debug!("focus animation armed for {}s", config.focus_animation_duration);
	}

	/// Disarm now and drop any pending timer.
	pub fn cancel_focus_animation(&mut self) {
		self.enable_focus_animation = false;
		self.disarm = None;
	}

	/// Advance the pending disarm timer by `dt` seconds.
	pub fn advance(&mut self, dt: f64) {
		let Some(timer) = self.disarm.as_mut() else {
			return;
		};
		timer.elapsed += dt;
		if timer.elapsed >= timer.duration {
			self.cancel_focus_animation();
		}
	}

	/// A disarm timer is counting down.
	pub fn has_pending_disarm(&self) -> bool {
		self.disarm.is_some()
	}
}

#[cfg(test)]
mod tests {
	use pretty_assertions::assert_eq;

	use super::*;
	use crate::components::force_graph::model::build_model;
	use crate::components::force_graph::types::{GraphData, GraphLink, GraphNode};

	fn model(config: &GraphConfig) -> GraphModel {
		let data = GraphData {
			nodes: vec![
				GraphNode::new("A").with_position(10.0, 20.0),
				GraphNode::new("B").with_position(0.0, 0.0),
				GraphNode::new("C").with_position(5.0, 5.0),
			],
			links: vec![GraphLink::new("A", "B")],
			focused_node_id: None,
		};
		build_model(&data, config).unwrap()
	}

	#[test]
	fn focus_transformation_centers_the_node() {
		let config = GraphConfig {
			focus_zoom: 2.0,
			..GraphConfig::default()
		};
		let model = model(&config);
		let mut state = InteractionState::new(&config);
		state.set_focus(Some("A".into()), &model, &config);

		let focus = state.focus_transformation().unwrap();
		assert_eq!(focus.scale, 2.0);
		assert_eq!(focus.apply(10.0, 20.0), (400.0, 200.0));
		assert!(state.focus_animation_enabled());
	}

	#[test]
	fn focus_zoom_is_clamped() {
		let config = GraphConfig {
			focus_zoom: 50.0,
			..GraphConfig::default()
		};
		let model = model(&config);
		let mut state = InteractionState::new(&config);
		state.set_focus(Some("A".into()), &model, &config);
		assert_eq!(state.focus_transformation().unwrap().scale, 8.0);
	}

	#[test]
	fn unknown_focus_target_has_no_transformation() {
		let config = GraphConfig::default();
		let model = model(&config);
		let mut state = InteractionState::new(&config);
		state.set_focus(Some("nope".into()), &model, &config);
		assert_eq!(state.focus_transformation(), None);
	}

	#[test]
	fn rearming_restarts_the_disarm_timer() {
		let config = GraphConfig {
			focus_animation_duration: 1.0,
			..GraphConfig::default()
		};
		let model = model(&config);
		let mut state = InteractionState::new(&config);
		state.set_focus(Some("A".into()), &model, &config);
		state.advance(0.75);
		state.set_focus(Some("B".into()), &model, &config);
		state.advance(0.5);
		assert!(state.focus_animation_enabled());
		state.advance(0.25);
		assert!(state.focus_animation_enabled());
		state.advance(0.25);
		assert!(!state.focus_animation_enabled());
		assert!(!state.has_pending_disarm());
		assert_eq!(state.transition_duration(&config), 0.0);
	}

	#[test]
	fn highlight_marks_neighbors_unless_degree_zero() {
		let config = GraphConfig::default();
		let mut model = model(&config);
		let mut state = InteractionState::new(&config);
		state.set_node_highlighted(&mut model, &config, &"A".into(), true);
		assert_eq!(state.highlighted_node().map(NodeId::as_str), Some("A"));
		assert!(model.nodes.get("B").unwrap().highlighted);
		assert!(!model.nodes.get("C").unwrap().highlighted);

		state.set_node_highlighted(&mut model, &config, &"A".into(), false);
		assert_eq!(state.highlighted_node(), None);
		assert!(!model.nodes.get("B").unwrap().highlighted);

		let solo = GraphConfig {
			highlight_degree: 0,
			..GraphConfig::default()
		};
		state.set_node_highlighted(&mut model, &solo, &"A".into(), true);
		assert!(!model.nodes.get("B").unwrap().highlighted);
	}

	#[test]
	fn zoom_scale_persists_only_with_pan_and_zoom() {
		let config = GraphConfig::default();
		let mut state = InteractionState::new(&config);
		let gesture = ViewTransform {
			x: 3.0,
			y: 4.0,
			k: 20.0,
		};
		state.zoom(gesture, &config);
		assert_eq!(state.view().k, 8.0);
		assert_eq!(state.transform(), 1.0);

		let pan = GraphConfig {
			pan_and_zoom: true,
			..GraphConfig::default()
		};
		state.zoom(gesture, &pan);
		assert_eq!(state.transform(), 8.0);
	}
}
