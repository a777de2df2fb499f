//! Pointer-to-gesture translation, independent of any DOM type.
//!
//! The component feeds canvas-local pointer coordinates in; the engine gets
//! drag, pan, zoom, click and hover calls out. A press that travels less
//! than [`CLICK_TOLERANCE`] pixels before release is a click.

use super::interaction::ViewTransform;
use super::simulation::PhysicsIntegrator;
use super::state::ForceGraphState;
use super::types::NodeId;

/// Screen pixels a press may travel and still count as a click.
pub const CLICK_TOLERANCE: f64 = 3.0;

const ZOOM_STEP: f64 = 1.1;

#[derive(Clone, Debug, Default, PartialEq)]
enum Gesture {
	#[default]
	Idle,
	Drag {
		index: usize,
		id: NodeId,
		down: (f64, f64),
		last: (f64, f64),
		moved: bool,
	},
	Pan {
		down: (f64, f64),
		origin: ViewTransform,
		moved: bool,
	},
}

fn travelled(from: (f64, f64), to: (f64, f64)) -> bool {
	(to.0 - from.0).hypot(to.1 - from.1) > CLICK_TOLERANCE
}

/// Pointer gesture in progress plus what the pointer currently hovers.
#[derive(Clone, Debug, Default)]
pub struct PointerState {
	gesture: Gesture,
	hovered_node: Option<NodeId>,
	hovered_link: Option<(NodeId, NodeId)>,
}

impl PointerState {
	/// A node is being dragged.
	pub fn is_dragging(&self) -> bool {
		matches!(self.gesture, Gesture::Drag { .. })
	}

	/// Node under the pointer.
	pub fn hovered_node(&self) -> Option<&NodeId> {
		self.hovered_node.as_ref()
	}

	/// Primary button pressed: grab the node under the pointer, or start
	/// panning the background.
	pub fn down<P: PhysicsIntegrator>(&mut self, state: &mut ForceGraphState<P>, x: f64, y: f64) {
		let hit = state.node_at_position(x, y).and_then(|index| {
			state
				.model()
				.nodes
				.by_index(index)
				.map(|node| (index, node.id.clone()))
		});
		self.gesture = match hit {
			Some((index, id)) => {
				state.on_drag_start(index);
				Gesture::Drag {
					index,
					id,
					down: (x, y),
					last: (x, y),
					moved: false,
				}
			}
			None => Gesture::Pan {
				down: (x, y),
				origin: state.interaction().view(),
				moved: false,
			},
		};
	}

	/// Returns whether something moved and a render is due.
	pub fn moved<P: PhysicsIntegrator>(
		&mut self,
		state: &mut ForceGraphState<P>,
		x: f64,
		y: f64,
	) -> bool {
		if self.gesture == Gesture::Idle {
			self.hover(state, x, y);
			return false;
		}
		match &mut self.gesture {
			Gesture::Drag {
				index,
				down,
				last,
				moved,
				..
			} => {
				let k = state.interaction().effective_view().k;
				let (dx, dy) = ((x - last.0) / k, (y - last.1) / k);
				*last = (x, y);
				*moved |= travelled(*down, (x, y));
				state.on_drag_move(*index, dx, dy)
			}
			Gesture::Pan {
				down,
				origin,
				moved,
			} => {
				*moved |= travelled(*down, (x, y));
				state.on_zoom(ViewTransform {
					x: origin.x + (x - down.0),
					y: origin.y + (y - down.1),
					k: origin.k,
				});
				true
			}
			Gesture::Idle => false,
		}
	}

	/// Button released: finish the drag or pan, or click when the pointer
	/// stayed put.
	pub fn up<P: PhysicsIntegrator>(&mut self, state: &mut ForceGraphState<P>) {
		match std::mem::take(&mut self.gesture) {
			Gesture::Drag { id, moved, .. } => {
				state.on_drag_end();
				if !moved {
					state.on_click_node(&id);
				}
			}
			Gesture::Pan {
				down, moved: false, ..
			} => match state.link_at_position(down.0, down.1) {
				Some((source, target)) => state.on_click_link(&source, &target),
				None => state.on_click_graph(),
			},
			Gesture::Pan { .. } | Gesture::Idle => {}
		}
	}

	/// Pointer left the surface: end any gesture without clicking and clear
	/// hover.
	pub fn leave<P: PhysicsIntegrator>(&mut self, state: &mut ForceGraphState<P>) {
		if let Gesture::Drag { .. } = std::mem::take(&mut self.gesture) {
			state.on_drag_end();
		}
		if let Some(id) = self.hovered_node.take() {
			state.on_mouse_out_node(&id);
		}
		if let Some((source, target)) = self.hovered_link.take() {
			state.on_mouse_out_link(&source, &target);
		}
	}

	/// Right click on a node or, failing that, a link.
	pub fn context_menu<P: PhysicsIntegrator>(
		&mut self,
		state: &mut ForceGraphState<P>,
		x: f64,
		y: f64,
	) {
		let node = state
			.node_at_position(x, y)
			.and_then(|index| state.model().nodes.by_index(index))
			.map(|node| node.id.clone());
		if let Some(id) = node {
			state.on_right_click_node(&id);
		} else if let Some((source, target)) = state.link_at_position(x, y) {
			state.on_right_click_link(&source, &target);
		}
	}

	/// Zoom one step around the pointer; `delta_y > 0` zooms out.
	pub fn wheel<P: PhysicsIntegrator>(
		&mut self,
		state: &mut ForceGraphState<P>,
		x: f64,
		y: f64,
		delta_y: f64,
	) {
		let current = state.interaction().view();
		let factor = if delta_y > 0.0 { 1.0 / ZOOM_STEP } else { ZOOM_STEP };
		let k = state.config().clamp_zoom(current.k * factor);
		let ratio = k / current.k;
		state.on_zoom(ViewTransform {
			x: x - (x - current.x) * ratio,
			y: y - (y - current.y) * ratio,
			k,
		});
	}

	fn hover<P: PhysicsIntegrator>(&mut self, state: &mut ForceGraphState<P>, x: f64, y: f64) {
		let node = state
			.node_at_position(x, y)
			.and_then(|index| state.model().nodes.by_index(index))
			.map(|node| node.id.clone());
		if node != self.hovered_node {
			if let Some(previous) = self.hovered_node.take() {
				state.on_mouse_out_node(&previous);
			}
			if let Some(next) = &node {
				state.on_mouse_over_node(next);
			}
			self.hovered_node = node;
		}

		let link = match self.hovered_node {
			Some(_) => None,
			None => state.link_at_position(x, y),
		};
		if link != self.hovered_link {
			if let Some((source, target)) = self.hovered_link.take() {
				state.on_mouse_out_link(&source, &target);
			}
			if let Some((source, target)) = &link {
				state.on_mouse_over_link(source, target);
			}
			self.hovered_link = link;
		}
	}
}
