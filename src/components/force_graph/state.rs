use log::{debug, info};
use serde_json::Value;

use super::collapse::{
	get_target_leaf_connections, is_node_visible, toggle_links_connections,
	toggle_links_matrix_connections,
};
use super::config::GraphConfig;
use super::diff::{UpdateVerdict, classify};
use super::error::{GraphError, GraphResult};
use super::interaction::{InteractionState, ViewTransform};
use super::model::{GraphModel, Link, build_model};
use super::simulation::{ForceGraphIntegrator, PhysicsIntegrator, SimulationController};
use super::types::{GraphData, NodeId};
use super::view::GraphView;

/// World-space radius used for hit testing, scales with zoom like nodes.
pub const HIT_RADIUS: f64 = 12.0;

type NodeCallback = Box<dyn FnMut(&NodeId)>;
type LinkCallback = Box<dyn FnMut(&NodeId, &NodeId)>;

/// Outward events. Callbacks receive ids, never internal records.
#[derive(Default)]
pub struct GraphCallbacks {
	/// Background click.
	pub on_click_graph: Option<Box<dyn FnMut()>>,
	/// Node click, after any collapse toggle.
	pub on_click_node: Option<NodeCallback>,
	/// Node right click.
	pub on_right_click_node: Option<NodeCallback>,
	/// Pointer entered a node.
	pub on_mouse_over_node: Option<NodeCallback>,
	/// Pointer left a node.
	pub on_mouse_out_node: Option<NodeCallback>,
	/// Link click.
	pub on_click_link: Option<LinkCallback>,
	/// Link right click.
	pub on_right_click_link: Option<LinkCallback>,
	/// Pointer entered a link.
	pub on_mouse_over_link: Option<LinkCallback>,
	/// Pointer left a link.
	pub on_mouse_out_link: Option<LinkCallback>,
}

impl GraphCallbacks {
	/// Set the background click handler.
	pub fn on_click_graph(mut self, f: impl FnMut() + 'static) -> Self {
		self.on_click_graph = Some(Box::new(f));
		self
	}

	/// Set the node click handler.
	pub fn on_click_node(mut self, f: impl FnMut(&NodeId) + 'static) -> Self {
		self.on_click_node = Some(Box::new(f));
		self
	}

	/// Set the node right click handler.
	pub fn on_right_click_node(mut self, f: impl FnMut(&NodeId) + 'static) -> Self {
		self.on_right_click_node = Some(Box::new(f));
		self
	}

	/// Set the node enter handler.
	pub fn on_mouse_over_node(mut self, f: impl FnMut(&NodeId) + 'static) -> Self {
		self.on_mouse_over_node = Some(Box::new(f));
		self
	}

	/// Set the node leave handler.
	pub fn on_mouse_out_node(mut self, f: impl FnMut(&NodeId) + 'static) -> Self {
		self.on_mouse_out_node = Some(Box::new(f));
		self
	}

	/// Set the link click handler.
	pub fn on_click_link(mut self, f: impl FnMut(&NodeId, &NodeId) + 'static) -> Self {
		self.on_click_link = Some(Box::new(f));
		self
	}

	/// Set the link right click handler.
	pub fn on_right_click_link(mut self, f: impl FnMut(&NodeId, &NodeId) + 'static) -> Self {
		self.on_right_click_link = Some(Box::new(f));
		self
	}

	/// Set the link enter handler.
	pub fn on_mouse_over_link(mut self, f: impl FnMut(&NodeId, &NodeId) + 'static) -> Self {
		self.on_mouse_over_link = Some(Box::new(f));
		self
	}

	/// Set the link leave handler.
	pub fn on_mouse_out_link(mut self, f: impl FnMut(&NodeId, &NodeId) + 'static) -> Self {
		self.on_mouse_out_link = Some(Box::new(f));
		self
	}
}

fn fire_node(callback: &mut Option<NodeCallback>, id: &NodeId) {
	if let Some(cb) = callback.as_mut() {
		cb(id);
	}
}

fn fire_link(callback: &mut Option<LinkCallback>, source: &NodeId, target: &NodeId) {
	if let Some(cb) = callback.as_mut() {
		cb(source, target);
	}
}

/// The graph-state engine: model, collapse, diffing, simulation lifecycle
/// and interaction state behind one owner.
///
/// Every method leaves the state self-consistent when it returns, so ticks
/// and gesture callbacks may interleave freely on the event loop.
pub struct ForceGraphState<P: PhysicsIntegrator = ForceGraphIntegrator> {
	id: String,
	data: GraphData,
	config: GraphConfig,
	model: GraphModel,
	simulation: SimulationController<P>,
	interaction: InteractionState,
	callbacks: GraphCallbacks,
	torn_down: bool,
}

impl ForceGraphState<ForceGraphIntegrator> {
	/// Engine backed by the `force_graph` integrator.
	pub fn with_force_graph(id: &str, data: GraphData, overrides: &Value) -> GraphResult<Self> {
		let config = GraphConfig::from_overrides(overrides);
		let integrator = ForceGraphIntegrator::new(&config.forces);
		Self::new(id, data, overrides, integrator)
	}
}

impl<P: PhysicsIntegrator> ForceGraphState<P> {
	/// Build the model and start the simulation. Fails on an empty id or an
	/// invalid payload; nothing is left running on failure.
	pub fn new(id: &str, data: GraphData, overrides: &Value, integrator: P) -> GraphResult<Self> {
		if id.trim().is_empty() {
			return Err(GraphError::Configuration(
				"a graph needs a non-empty id".into(),
			));
		}
		let config = GraphConfig::from_overrides(overrides);
		let model = build_model(&data, &config)?;
		let mut interaction = InteractionState::new(&config);
		interaction.set_focus(data.focused_node_id.clone(), &model, &config);
		// A focus present at construction is not a change, nothing to animate.
		interaction.cancel_focus_animation();

		let mut simulation = SimulationController::new(integrator);
		simulation.start(&model, &config);
		info!(
			"graph `{id}` ready: {} nodes, {} links",
			model.nodes.len(),
			model.links.len()
		);

		Ok(Self {
			id: id.to_owned(),
			data,
			config,
			model,
			simulation,
			interaction,
			callbacks: GraphCallbacks::default(),
			torn_down: false,
		})
	}

	/// Attach outward event handlers.
	pub fn with_callbacks(mut self, callbacks: GraphCallbacks) -> Self {
		self.callbacks = callbacks;
		self
	}

	/// Instance id.
	pub fn id(&self) -> &str {
		&self.id
	}

	/// Merged configuration.
	pub fn config(&self) -> &GraphConfig {
		&self.config
	}

	/// The payload the model was last built from.
	pub fn data(&self) -> &GraphData {
		&self.data
	}

	/// Current graph model.
	pub fn model(&self) -> &GraphModel {
		&self.model
	}

	/// Hover, zoom and focus state.
	pub fn interaction(&self) -> &InteractionState {
		&self.interaction
	}

	/// The physics integrator.
	pub fn integrator(&self) -> &P {
		self.simulation.integrator()
	}

	/// The integrator is stepping.
	pub fn is_simulation_running(&self) -> bool {
		self.simulation.is_running()
	}

	/// Apply a new payload and config override. On error nothing changes.
	pub fn update(&mut self, data: GraphData, overrides: &Value) -> GraphResult<UpdateVerdict> {
		if self.torn_down {
			debug!("graph `{}` is torn down, update ignored", self.id);
			return Ok(UpdateVerdict::default());
		}
		let next_config = GraphConfig::from_overrides(overrides);
		let verdict = classify(&self.data, &self.config, &data, &next_config);
		if verdict.is_noop() {
			return Ok(verdict);
		}
		debug!("graph `{}` update: {verdict:?}", self.id);

		// Direction and collapsibility shape the matrix, so they rebuild too.
		let restructured = verdict.graph_elements_updated
			|| self.config.directed != next_config.directed
			|| self.config.collapsible != next_config.collapsible;
		if restructured {
			let mut model = self.model.rebuild(&data, &next_config)?;
			// Collapsed subtrees stay collapsed while the matrix keeps its shape.
			if self.config.collapsible
				&& next_config.collapsible
				&& self.config.directed == next_config.directed
			{
				model.carry_collapse(&self.model);
			}
			if verdict.new_graph_elements {
				self.simulation.pause();
			}
			self.model = model;
		}
		if verdict.pan_and_zoom_toggled {
			self.interaction.reset_transform();
		}
		let was_static = self.config.static_graph;
		if verdict.config_updated {
			if (self.config.width, self.config.height) != (next_config.width, next_config.height) {
				self.interaction.resize(next_config.width, next_config.height);
			}
			self.config = next_config;
		}
		if restructured {
			self.restore_highlight();
		}
		self.data = data;

		let resumed = was_static && !self.config.static_graph;
		if verdict.new_graph_elements || resumed {
			self.simulation.start(&self.model, &self.config);
			self.simulation.restart(&self.config);
		} else {
			if restructured {
				// Same ids, possibly new order or props: rebind without a restart.
				self.simulation.rebind(&self.model, &self.config);
			} else if verdict.force_config_updated {
				self.simulation.configure_forces(&self.model, &self.config);
			}
			if verdict.force_config_updated {
				self.simulation.restart(&self.config);
			}
		}
		if self.config.static_graph {
			self.simulation.pause();
		}

		self.interaction.set_focus(
			self.data.focused_node_id.clone(),
			&self.model,
			&self.config,
		);
		Ok(verdict)
	}

	/// Re-apply hover state to a rebuilt model, dropping what no longer exists.
	fn restore_highlight(&mut self) {
		if let Some(id) = self.interaction.highlighted_node().cloned() {
			let present = self.model.nodes.contains(id.as_str());
			self.interaction
				.set_node_highlighted(&mut self.model, &self.config, &id, present);
		}
		let nodes = &self.model.nodes;
		let stale_link = self
			.interaction
			.highlighted_link()
			.is_some_and(|(s, t)| !nodes.contains(s.as_str()) || !nodes.contains(t.as_str()));
		if stale_link {
			self.interaction.set_link_highlighted(None);
		}
	}

	/// One frame of the host loop: step the physics, follow the focus target
	/// and advance the focus animation timer.
	pub fn tick(&mut self, dt: f32) -> bool {
		if self.torn_down {
			return false;
		}
		let moved = self.simulation.tick(&mut self.model, dt, &self.config);
		if moved {
			self.interaction.refresh_focus(&self.model, &self.config);
		}
		self.interaction.advance(dt as f64);
		moved
	}

	/// Stop the physics without touching positions.
	pub fn pause_simulation(&mut self) {
		self.simulation.pause();
	}

	/// Resume the physics toward `alpha_target`.
	pub fn restart_simulation(&mut self) {
		self.simulation.restart(&self.config);
	}

	/// Release drag fixes and let the layout settle again.
	pub fn reset_nodes_positions(&mut self) {
		self.simulation
			.reset_nodes_positions(&mut self.model, &self.config);
	}

	/// Begin dragging the node at `index`; cancels the focus animation.
	pub fn on_drag_start(&mut self, index: usize) {
		if self.simulation.drag_start(index, &self.config).is_some() {
			self.interaction.cancel_focus_animation();
		}
	}

	/// Returns whether the node moved and a render is due.
	pub fn on_drag_move(&mut self, index: usize, dx: f64, dy: f64) -> bool {
		let moved = self
			.simulation
			.drag_move(&mut self.model, index, dx, dy, &self.config);
		if moved {
			self.interaction.refresh_focus(&self.model, &self.config);
		}
		moved
	}

	/// Drop the dragged node; it stays fixed where it was left.
	pub fn on_drag_end(&mut self) {
		self.simulation.drag_end(&self.config);
	}

	/// Apply a pan or zoom gesture transform.
	pub fn on_zoom(&mut self, transform: ViewTransform) {
		self.interaction.zoom(transform, &self.config);
	}

	/// Viewport changed; the focus transformation follows.
	pub fn resize(&mut self, width: f64, height: f64) {
		self.interaction.resize(width, height);
		self.interaction.refresh_focus(&self.model, &self.config);
	}

	/// Background click: cancels the focus animation.
	pub fn on_click_graph(&mut self) {
		self.interaction.cancel_focus_animation();
		if let Some(cb) = self.callbacks.on_click_graph.as_mut() {
			cb();
		}
	}

	/// Collapse or expand the leaf neighbors of `id`, then fire the callback.
	pub fn on_click_node(&mut self, id: &NodeId) {
		if self.config.collapsible && self.model.nodes.contains(id.as_str()) {
			let directed = self.config.directed;
			let connections = get_target_leaf_connections(id, &self.model.matrix, directed);
			if !connections.is_empty() {
				let matrix =
					toggle_links_matrix_connections(&self.model.matrix, &connections, directed);
				let links = toggle_links_connections(&self.model.links, &matrix);
				self.model.matrix = matrix;
				self.model.links = links;
				debug!("toggled {} leaf connections of `{id}`", connections.len());
			}
		}
		fire_node(&mut self.callbacks.on_click_node, id);
	}

	/// Fire the node right click callback.
	pub fn on_right_click_node(&mut self, id: &NodeId) {
		fire_node(&mut self.callbacks.on_right_click_node, id);
	}

	/// Pointer entered a node.
	pub fn on_mouse_over_node(&mut self, id: &NodeId) {
		fire_node(&mut self.callbacks.on_mouse_over_node, id);
		if self.config.node_highlight_behavior {
			self.interaction
				.set_node_highlighted(&mut self.model, &self.config, id, true);
		}
	}

	/// Pointer left a node.
	pub fn on_mouse_out_node(&mut self, id: &NodeId) {
		fire_node(&mut self.callbacks.on_mouse_out_node, id);
		if self.config.node_highlight_behavior {
			self.interaction
				.set_node_highlighted(&mut self.model, &self.config, id, false);
		}
	}

	/// Fire the link click callback.
	pub fn on_click_link(&mut self, source: &NodeId, target: &NodeId) {
		fire_link(&mut self.callbacks.on_click_link, source, target);
	}

	/// Fire the link right click callback.
	pub fn on_right_click_link(&mut self, source: &NodeId, target: &NodeId) {
		fire_link(&mut self.callbacks.on_right_click_link, source, target);
	}

	/// Pointer entered a link.
	pub fn on_mouse_over_link(&mut self, source: &NodeId, target: &NodeId) {
		fire_link(&mut self.callbacks.on_mouse_over_link, source, target);
		if self.config.link_highlight_behavior {
			self.interaction
				.set_link_highlighted(Some((source.clone(), target.clone())));
		}
	}

	/// Pointer left a link.
	pub fn on_mouse_out_link(&mut self, source: &NodeId, target: &NodeId) {
		fire_link(&mut self.callbacks.on_mouse_out_link, source, target);
		if self.config.link_highlight_behavior {
			self.interaction.set_link_highlighted(None);
		}
	}

	/// Snapshot for the renderer.
	pub fn view(&self) -> GraphView<'_> {
		GraphView::new(&self.model, &self.config, &self.interaction)
	}

	/// Whether `id` is drawn: always, unless the graph is collapsible and the
	/// node lost every link.
	fn is_drawn(&self, id: &NodeId) -> bool {
		!self.config.collapsible
			|| is_node_visible(id.as_str(), &self.model.nodes, &self.model.matrix)
	}

	/// Index of the visible node under a screen point, if any.
	pub fn node_at_position(&self, sx: f64, sy: f64) -> Option<usize> {
		let (gx, gy) = self.interaction.effective_view().screen_to_graph(sx, sy);
		self.model
			.nodes
			.as_slice()
			.iter()
			.enumerate()
			.rev()
			.filter(|(_, n)| (n.x - gx).hypot(n.y - gy) < HIT_RADIUS)
			.find(|(_, n)| self.is_drawn(&n.id))
			.map(|(index, _)| index)
	}

	/// The visible link passing closest to a screen point, within the hit
	/// radius.
	pub fn link_at_position(&self, sx: f64, sy: f64) -> Option<(NodeId, NodeId)> {
		let (gx, gy) = self.interaction.effective_view().screen_to_graph(sx, sy);
		let nodes = &self.model.nodes;
		let mut candidates: Vec<(&Link, f64)> = self
			.model
			.links
			.iter()
			.filter(|l| !l.is_hidden)
			.filter_map(|l| {
				let (s, t) = (nodes.get(l.source.as_str())?, nodes.get(l.target.as_str())?);
				let d = segment_distance((gx, gy), (s.x, s.y), (t.x, t.y));
				(d < HIT_RADIUS / 2.0).then_some((l, d))
			})
			.collect();
		candidates.sort_by(|a, b| a.1.total_cmp(&b.1));
		candidates
			.into_iter()
			.find(|(l, _)| self.is_drawn(&l.source) && self.is_drawn(&l.target))
			.map(|(l, _)| (l.source.clone(), l.target.clone()))
	}

	/// Pause the integrator and cancel the focus timer. Idempotent; also run
	/// on drop.
	pub fn teardown(&mut self) {
		if self.torn_down {
			return;
		}
		self.simulation.pause();
		self.interaction.cancel_focus_animation();
		self.torn_down = true;
		debug!("graph `{}` torn down", self.id);
	}
}

impl<P: PhysicsIntegrator> Drop for ForceGraphState<P> {
	fn drop(&mut self) {
		self.teardown();
	}
}

fn segment_distance(p: (f64, f64), a: (f64, f64), b: (f64, f64)) -> f64 {
	let (abx, aby) = (b.0 - a.0, b.1 - a.1);
	let len_sq = abx * abx + aby * aby;
	let t = if len_sq < f64::EPSILON {
		0.0
	} else {
		(((p.0 - a.0) * abx + (p.1 - a.1) * aby) / len_sq).clamp(0.0, 1.0)
	};
	let (cx, cy) = (a.0 + t * abx, a.1 + t * aby);
	((p.0 - cx).powi(2) + (p.1 - cy).powi(2)).sqrt()
}
