//! Shared fixtures: a recording physics integrator and small payload helpers.

#![allow(dead_code)]

use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;

use collapsible_graph_canvas::components::force_graph::{
	ForceGraphState, ForceSpec, GraphData, GraphLink, GraphNode, Node, PhysicsIntegrator,
	TickError,
};
use serde_json::Value;

#[derive(Clone, Debug, PartialEq)]
pub enum Call {
	RegisterNodes(Vec<String>),
	RegisterForce(&'static str),
	Start,
	Stop,
	Restart(f64),
	Step,
}

#[derive(Debug, Default)]
pub struct Recording {
	pub calls: Vec<Call>,
	/// Results handed out by the next steps, before falling back to drift.
	pub scripted: VecDeque<Result<Vec<(f64, f64)>, TickError>>,
	pub forces: Vec<ForceSpec>,
}

impl Recording {
	pub fn restarts(&self) -> usize {
		self.calls
			.iter()
			.filter(|c| matches!(c, Call::Restart(_)))
			.count()
	}

	pub fn starts(&self) -> usize {
		self.calls.iter().filter(|c| **c == Call::Start).count()
	}
}

/// Integrator double: records every call and moves each node one unit to the
/// right per step unless a result was scripted.
pub struct RecordingIntegrator {
	recording: Rc<RefCell<Recording>>,
	running: bool,
}

impl RecordingIntegrator {
	pub fn new() -> (Self, Rc<RefCell<Recording>>) {
		let recording = Rc::new(RefCell::new(Recording::default()));
		(
			Self {
				recording: recording.clone(),
				running: false,
			},
			recording,
		)
	}

	fn record(&self, call: Call) {
		self.recording.borrow_mut().calls.push(call);
	}
}

impl PhysicsIntegrator for RecordingIntegrator {
	fn register_nodes(&mut self, nodes: &[Node]) {
		self.record(Call::RegisterNodes(
			nodes.iter().map(|n| n.id.to_string()).collect(),
		));
	}

	fn register_force(&mut self, name: &'static str, force: ForceSpec) {
		self.record(Call::RegisterForce(name));
		self.recording.borrow_mut().forces.push(force);
	}

	fn start(&mut self) {
		self.record(Call::Start);
		self.running = true;
	}

	fn stop(&mut self) {
		self.record(Call::Stop);
		self.running = false;
	}

	fn restart(&mut self, alpha_target: f64) {
		self.record(Call::Restart(alpha_target));
		self.running = true;
	}

	fn is_running(&self) -> bool {
		self.running
	}

	fn step(&mut self, _dt: f32, nodes: &[Node]) -> Result<Vec<(f64, f64)>, TickError> {
		self.record(Call::Step);
		if let Some(result) = self.recording.borrow_mut().scripted.pop_front() {
			return result;
		}
		Ok(nodes.iter().map(|n| (n.x + 1.0, n.y)).collect())
	}
}

pub type TestEngine = ForceGraphState<RecordingIntegrator>;

pub fn graph(nodes: &[&str], links: &[(&str, &str)]) -> GraphData {
	GraphData {
		nodes: nodes
			.iter()
			.enumerate()
			.map(|(i, &id)| GraphNode::new(id).with_position(10.0 * i as f64, 0.0))
			.collect(),
		links: links.iter().map(|&(s, t)| GraphLink::new(s, t)).collect(),
		focused_node_id: None,
	}
}

pub fn engine(
	data: GraphData,
	overrides: &Value,
) -> (TestEngine, Rc<RefCell<Recording>>) {
	let (integrator, recording) = RecordingIntegrator::new();
	let state = ForceGraphState::new("test-graph", data, overrides, integrator)
		.expect("test graph builds");
	(state, recording)
}
