//! Simulation lifecycle: the physics integrator contract, the `force_graph`
//! backed integrator, and the controller that starts, pauses and restarts it
//! around drags and data updates.

use std::collections::HashMap;

use force_graph::{DefaultNodeIdx, EdgeData, ForceGraph, NodeData, SimulationParameters};
use log::{debug, warn};

use super::config::{ForceConfig, GraphConfig};
use super::error::TickError;
use super::model::{GraphModel, Node};
use super::types::NodeId;

/// Name under which the link force is registered.
pub const LINK_FORCE: &str = "link";
/// Name under which the many-body charge is registered.
pub const CHARGE_FORCE: &str = "charge";

/// A force as registered with the integrator.
#[derive(Clone, Debug, PartialEq)]
pub enum ForceSpec {
	/// Springs along the visible links.
	Link {
		/// (source, target) pairs.
		links: Vec<(NodeId, NodeId)>,
		/// Preferred length.
		distance: f64,
		/// Stiffness multiplier.
		strength: f64,
	},
	/// Many-body charge between every node pair.
	Charge {
		/// Negative repels.
		strength: f64,
	},
}

/// What the engine needs from a force solver. The engine's own `tick` is the
/// tick callback: the host loop calls it, and it calls [`step`](Self::step)
/// while the integrator is running.
pub trait PhysicsIntegrator {
	/// Replace the node set. Positions are read from `nodes`.
	fn register_nodes(&mut self, nodes: &[Node]);

	/// Add or replace the force called `name`.
	fn register_force(&mut self, name: &'static str, force: ForceSpec);

	/// Start from full energy.
	fn start(&mut self);

	/// Stop stepping; positions are kept.
	fn stop(&mut self);

	/// Resume, settling toward `alpha_target`.
	fn restart(&mut self, alpha_target: f64);

	/// Steps are being taken.
	fn is_running(&self) -> bool;

	/// How fast the energy settles toward the target, and the energy below
	/// which the integrator stops on its own.
	fn set_cooling(&mut self, _alpha_decay: f64, _alpha_min: f64) {}

	/// Advance by `dt` seconds and return one position per node, in the order
	/// of `nodes`. Must not touch anything but positions.
	fn step(&mut self, dt: f32, nodes: &[Node]) -> Result<Vec<(f64, f64)>, TickError>;
}

const BASE_CHARGE: f64 = 1.5;
const BASE_SPRING: f64 = 0.05;
const NODE_MASS: f32 = 10.0;

fn simulation_parameters(charge: f64, link_distance: f64, link_strength: f64) -> SimulationParameters {
	let distance_scale = (link_distance / 100.0).max(0.1);
	SimulationParameters {
		force_charge: (-charge * BASE_CHARGE * distance_scale) as f32,
		force_spring: (BASE_SPRING * link_strength) as f32,
		force_max: 100.0,
		node_speed: 3000.0,
		damping_factor: 0.9,
	}
}

/// [`PhysicsIntegrator`] over the `force_graph` crate.
///
/// `force_graph` has no rest length for springs, so `link_length` scales the
/// charge instead: longer links mean stronger repulsion.
pub struct ForceGraphIntegrator {
	graph: ForceGraph<usize, ()>,
	slots: Vec<DefaultNodeIdx>,
	links: Vec<(NodeId, NodeId)>,
	charge: f64,
	link_distance: f64,
	link_strength: f64,
	dirty: bool,
	running: bool,
	alpha: f64,
	alpha_target: f64,
	alpha_decay: f64,
	alpha_min: f64,
}

impl ForceGraphIntegrator {
	/// Integrator with no nodes yet, at full energy.
	pub fn new(forces: &ForceConfig) -> Self {
		Self {
			graph: ForceGraph::new(simulation_parameters(
				forces.gravity,
				forces.link_length,
				forces.link_strength,
			)),
			slots: Vec::new(),
			links: Vec::new(),
			charge: forces.gravity,
			link_distance: forces.link_length,
			link_strength: forces.link_strength,
			dirty: true,
			running: false,
			alpha: 1.0,
			alpha_target: 0.0,
			alpha_decay: forces.alpha_decay,
			alpha_min: forces.alpha_min,
		}
	}

	/// Current energy.
	pub fn alpha(&self) -> f64 {
		self.alpha
	}

	fn rebuild(&mut self, nodes: &[Node]) {
		let mut graph = ForceGraph::new(simulation_parameters(
			self.charge,
			self.link_distance,
			self.link_strength,
		));
		let mut idx_by_id: HashMap<&NodeId, DefaultNodeIdx> = HashMap::new();
		self.slots.clear();
		for (slot, node) in nodes.iter().enumerate() {
			let idx = graph.add_node(NodeData {
				x: node.x as f32,
				y: node.y as f32,
				mass: NODE_MASS,
				is_anchor: node.is_fixed(),
				user_data: slot,
			});
			idx_by_id.insert(&node.id, idx);
			self.slots.push(idx);
		}
		for (source, target) in &self.links {
			if let (Some(&src), Some(&tgt)) = (idx_by_id.get(source), idx_by_id.get(target)) {
				graph.add_edge(src, tgt, EdgeData::default());
			}
		}
		self.graph = graph;
		self.dirty = false;
	}
}

impl PhysicsIntegrator for ForceGraphIntegrator {
	fn register_nodes(&mut self, nodes: &[Node]) {
		self.rebuild(nodes);
	}

	fn register_force(&mut self, name: &'static str, force: ForceSpec) {
		match force {
			ForceSpec::Link {
				links,
				distance,
				strength,
			} => {
				self.links = links;
				self.link_distance = distance;
				self.link_strength = strength;
			}
			ForceSpec::Charge { strength } => self.charge = strength,
		}
		debug!("registered {name} force");
		self.dirty = true;
	}

	fn start(&mut self) {
		self.alpha = 1.0;
		self.running = true;
	}

	fn stop(&mut self) {
		self.running = false;
	}

	fn restart(&mut self, alpha_target: f64) {
		self.alpha_target = alpha_target;
		self.running = true;
	}

	fn is_running(&self) -> bool {
		self.running
	}

	fn set_cooling(&mut self, alpha_decay: f64, alpha_min: f64) {
		self.alpha_decay = alpha_decay;
		self.alpha_min = alpha_min;
	}

	fn step(&mut self, dt: f32, nodes: &[Node]) -> Result<Vec<(f64, f64)>, TickError> {
		if self.dirty || self.slots.len() != nodes.len() {
			self.rebuild(nodes);
		}

		self.graph.visit_nodes_mut(|node| {
			let model = &nodes[node.data.user_data];
			node.data.x = model.x as f32;
			node.data.y = model.y as f32;
			node.data.is_anchor = model.is_fixed();
		});

		self.graph.update(dt * self.alpha as f32);
		self.alpha += (self.alpha_target - self.alpha) * self.alpha_decay;
		if self.alpha < self.alpha_min {
			self.running = false;
		}

		let mut positions = vec![(0.0, 0.0); nodes.len()];
		self.graph.visit_nodes(|node| {
			positions[node.data.user_data] = (node.x() as f64, node.y() as f64);
		});
		Ok(positions)
	}
}

/// Owns the integrator and the drag bindings for the current node set.
pub struct SimulationController<P: PhysicsIntegrator> {
	integrator: P,
	/// Drag target per node index, refreshed whenever the node set is bound.
	drag_targets: Vec<NodeId>,
	dragging: Option<NodeId>,
}

impl<P: PhysicsIntegrator> SimulationController<P> {
	/// Wrap `integrator`; nothing is bound until [`start`](Self::start).
	pub fn new(integrator: P) -> Self {
		Self {
			integrator,
			drag_targets: Vec::new(),
			dragging: None,
		}
	}

	/// The wrapped integrator.
	pub fn integrator(&self) -> &P {
		&self.integrator
	}

	/// The integrator is stepping.
	pub fn is_running(&self) -> bool {
		self.integrator.is_running()
	}

	/// Id of the node being dragged.
	pub fn dragging(&self) -> Option<&NodeId> {
		self.dragging.as_ref()
	}

	/// Bind nodes, forces and drag targets, then start. Static graphs are
	/// only bound for dragging lookups and never started.
	pub fn start(&mut self, model: &GraphModel, config: &GraphConfig) {
		self.bind_drag_targets(model);
		if config.static_graph {
			self.integrator.stop();
			return;
		}
		self.integrator.register_nodes(model.sim_nodes());
		self.configure_forces(model, config);
		self.integrator.start();
		debug!("simulation started with {} nodes", model.nodes.len());
	}

	/// Refresh node registration, forces and drag targets after a rebuild
	/// that kept the id set, leaving the running state alone.
	pub fn rebind(&mut self, model: &GraphModel, config: &GraphConfig) {
		self.bind_drag_targets(model);
		if config.static_graph {
			return;
		}
		self.integrator.register_nodes(model.sim_nodes());
		self.configure_forces(model, config);
	}

	/// Re-register forces, e.g. after link distance or strength changed.
	pub fn configure_forces(&mut self, model: &GraphModel, config: &GraphConfig) {
		let forces = &config.forces;
		self.integrator.set_cooling(forces.alpha_decay, forces.alpha_min);
		self.integrator.register_force(
			CHARGE_FORCE,
			ForceSpec::Charge {
				strength: forces.gravity,
			},
		);
		self.integrator.register_force(
			LINK_FORCE,
			ForceSpec::Link {
				links: model
					.sim_links()
					.iter()
					.map(|l| (l.source.clone(), l.target.clone()))
					.collect(),
				distance: forces.link_length,
				strength: forces.link_strength,
			},
		);
	}

	/// Stop stepping, keeping positions.
	pub fn pause(&mut self) {
		self.integrator.stop();
	}

	/// Resume toward `alpha_target`. Static graphs stay stopped.
	pub fn restart(&mut self, config: &GraphConfig) {
		if !config.static_graph {
			self.integrator.restart(config.forces.alpha_target);
		}
	}

	fn bind_drag_targets(&mut self, model: &GraphModel) {
		self.drag_targets = model.sim_nodes().iter().map(|n| n.id.clone()).collect();
		self.dragging = None;
	}

	/// Returns the id bound to `index` when a drag may begin.
	pub fn drag_start(&mut self, index: usize, config: &GraphConfig) -> Option<NodeId> {
		if config.static_graph {
			return None;
		}
		let id = self.drag_targets.get(index)?.clone();
		self.pause();
		self.dragging = Some(id.clone());
		Some(id)
	}

	/// Move the node bound to `index` by the gesture delta and pin it there.
	pub fn drag_move(
		&mut self,
		model: &mut GraphModel,
		index: usize,
		dx: f64,
		dy: f64,
		config: &GraphConfig,
	) -> bool {
		if config.static_graph {
			return false;
		}
		let Some(id) = self.drag_targets.get(index) else {
			return false;
		};
		let Some(node) = model.nodes.get_mut(id.as_str()) else {
			return false;
		};
		node.x += dx;
		node.y += dy;
		node.fix_at_current();
		true
	}

	/// End the drag; restart when automatic rearrange is on.
	pub fn drag_end(&mut self, config: &GraphConfig) {
		self.dragging = None;
		if !config.static_graph && config.automatic_rearrange_after_drop_node {
			self.integrator.restart(config.forces.alpha_target);
		}
	}

	/// Release every drag fix so nodes rejoin the free layout. Nodes pinned
	/// by the payload keep their fixed position.
	pub fn reset_nodes_positions(&mut self, model: &mut GraphModel, config: &GraphConfig) -> bool {
		if config.static_graph {
			return false;
		}
		for node in model.nodes.iter_mut().filter(|n| !n.pinned) {
			node.release();
		}
		self.integrator.restart(config.forces.alpha_target);
		true
	}

	/// Step the integrator once and commit the new positions atomically.
	/// Returns whether positions changed.
	pub fn tick(&mut self, model: &mut GraphModel, dt: f32, config: &GraphConfig) -> bool {
		if config.static_graph || !self.integrator.is_running() {
			return false;
		}
		let positions = match self.integrator.step(dt, model.sim_nodes()) {
			Ok(positions) => positions,
			Err(err) => {
				warn!("skipping frame: {err}");
				return false;
			}
		};
		if let Err(err) = validate_positions(&positions, model.nodes.len()) {
			warn!("skipping frame: {err}");
			return false;
		}
		for (node, (x, y)) in model.nodes.iter_mut().zip(positions) {
			match (node.fx, node.fy) {
				(Some(fx), Some(fy)) => {
					node.x = fx;
					node.y = fy;
				}
				_ => {
					node.x = x;
					node.y = y;
				}
			}
		}
		true
	}
}

fn validate_positions(positions: &[(f64, f64)], expected: usize) -> Result<(), TickError> {
	if positions.len() != expected {
		return Err(TickError::PositionCountMismatch {
			expected,
			got: positions.len(),
		});
	}
	match positions
		.iter()
		.position(|(x, y)| !x.is_finite() || !y.is_finite())
	{
		Some(index) => {
			let (x, y) = positions[index];
			Err(TickError::NonFinitePosition { index, x, y })
		}
		None => Ok(()),
	}
}
