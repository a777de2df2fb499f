use std::cell::{Cell, RefCell};
use std::rc::Rc;

use leptos::prelude::*;
use log::{debug, error, warn};
use send_wrapper::SendWrapper;
use serde_json::Value;
use wasm_bindgen::prelude::*;
use web_sys::{CanvasRenderingContext2d, HtmlCanvasElement, MouseEvent, WheelEvent, Window};

use super::gesture::PointerState;
use super::render::CanvasRenderer;
use super::state::{ForceGraphState, GraphCallbacks};
use super::types::{GraphData, NodeId};
use super::view::GraphRenderer;

/// Longest frame fed to the simulation, in seconds.
const MAX_FRAME_SECONDS: f64 = 0.1;

type Shared<T> = Rc<RefCell<Option<T>>>;
type FrameCallback = Shared<Closure<dyn FnMut()>>;

fn window_size(window: &Window) -> (f64, f64) {
	(
		window
			.inner_width()
			.ok()
			.and_then(|w| w.as_f64())
			.unwrap_or(800.0),
		window
			.inner_height()
			.ok()
			.and_then(|h| h.as_f64())
			.unwrap_or(600.0),
	)
}

fn request_frame(callback: &FrameCallback) {
	let Some(window) = web_sys::window() else {
		return;
	};
	if let Some(ref cb) = *callback.borrow() {
		let _ = window.request_animation_frame(cb.as_ref().unchecked_ref());
	}
}

fn local_point(canvas_ref: NodeRef<leptos::html::Canvas>, ev: &MouseEvent) -> Option<(f64, f64)> {
	let canvas: HtmlCanvasElement = canvas_ref.get()?;
	let rect = canvas.get_bounding_client_rect();
	Some((
		ev.client_x() as f64 - rect.left(),
		ev.client_y() as f64 - rect.top(),
	))
}

/// Outward events as Leptos callbacks, so they can cross reactive
/// boundaries. Turned into the engine's [`GraphCallbacks`] when the engine is
/// built.
#[derive(Clone, Default)]
pub struct GraphEvents {
	/// Background click.
	pub on_click_graph: Option<Callback<()>>,
	/// Node click, after any collapse toggle.
	pub on_click_node: Option<Callback<NodeId>>,
	/// Node right click.
	pub on_right_click_node: Option<Callback<NodeId>>,
	/// Pointer entered a node.
	pub on_mouse_over_node: Option<Callback<NodeId>>,
	/// Pointer left a node.
	pub on_mouse_out_node: Option<Callback<NodeId>>,
	/// Link click, as (source, target).
	pub on_click_link: Option<Callback<(NodeId, NodeId)>>,
	/// Link right click, as (source, target).
	pub on_right_click_link: Option<Callback<(NodeId, NodeId)>>,
	/// Pointer entered a link.
	pub on_mouse_over_link: Option<Callback<(NodeId, NodeId)>>,
	/// Pointer left a link.
	pub on_mouse_out_link: Option<Callback<(NodeId, NodeId)>>,
}

impl GraphEvents {
	/// Set the background click handler.
	pub fn on_click_graph(mut self, f: impl Fn(()) + Send + Sync + 'static) -> Self {
		self.on_click_graph = Some(Callback::new(f));
		self
	}

	/// Set the node click handler.
	pub fn on_click_node(mut self, f: impl Fn(NodeId) + Send + Sync + 'static) -> Self {
		self.on_click_node = Some(Callback::new(f));
		self
	}

	/// Set the node right click handler.
	pub fn on_right_click_node(mut self, f: impl Fn(NodeId) + Send + Sync + 'static) -> Self {
		self.on_right_click_node = Some(Callback::new(f));
		self
	}

	/// Set the link click handler.
	pub fn on_click_link(mut self, f: impl Fn((NodeId, NodeId)) + Send + Sync + 'static) -> Self {
		self.on_click_link = Some(Callback::new(f));
		self
	}
}

fn node_event(callback: Option<Callback<NodeId>>) -> Option<Box<dyn FnMut(&NodeId)>> {
	let callback = callback?;
	Some(Box::new(move |id: &NodeId| callback.run(id.clone())))
}

fn link_event(
	callback: Option<Callback<(NodeId, NodeId)>>,
) -> Option<Box<dyn FnMut(&NodeId, &NodeId)>> {
	let callback = callback?;
	Some(Box::new(move |source: &NodeId, target: &NodeId| {
		callback.run((source.clone(), target.clone()))
	}))
}

impl From<GraphEvents> for GraphCallbacks {
	fn from(events: GraphEvents) -> Self {
		GraphCallbacks {
			on_click_graph: events.on_click_graph.map(|callback| {
				Box::new(move || callback.run(())) as Box<dyn FnMut()>
			}),
			on_click_node: node_event(events.on_click_node),
			on_right_click_node: node_event(events.on_right_click_node),
			on_mouse_over_node: node_event(events.on_mouse_over_node),
			on_mouse_out_node: node_event(events.on_mouse_out_node),
			on_click_link: link_event(events.on_click_link),
			on_right_click_link: link_event(events.on_right_click_link),
			on_mouse_over_link: link_event(events.on_mouse_over_link),
			on_mouse_out_link: link_event(events.on_mouse_out_link),
		}
	}
}

/// Everything the event handlers share with the frame loop.
#[derive(Clone, Default)]
struct Handles {
	engine: Shared<ForceGraphState>,
	renderer: Shared<CanvasRenderer>,
	pointer: Rc<RefCell<PointerState>>,
}

impl Handles {
	/// Run a pointer gesture against the engine, if it has been built.
	fn with_pointer(&self, f: impl FnOnce(&mut PointerState, &mut ForceGraphState)) {
		if let Some(ref mut engine) = *self.engine.borrow_mut() {
			f(&mut self.pointer.borrow_mut(), engine);
		}
	}
}

/// A collapsible force-directed graph on a canvas.
///
/// `data` and `config` are tracked: every change is handed to the engine's
/// `update`, which decides what actually needs rebuilding or restarting.
#[component]
pub fn ForceGraphCanvas(
	/// Instance id, used in log lines.
	#[prop(into)]
	id: String,
	/// Graph payload.
	#[prop(into)]
	data: Signal<GraphData>,
	/// JSON override merged over the default configuration.
	#[prop(into)]
	config: Signal<Value>,
	/// Outward events.
	#[prop(optional)]
	events: GraphEvents,
	/// Fill the window and follow its size.
	#[prop(default = false)]
	fullscreen: bool,
	/// Canvas width; defaults to the parent's.
	#[prop(default = None)]
	width: Option<f64>,
	/// Canvas height; defaults to the parent's.
	#[prop(default = None)]
	height: Option<f64>,
) -> impl IntoView {
	let canvas_ref = NodeRef::<leptos::html::Canvas>::new();
	let handles = Handles::default();
	let animate: FrameCallback = Rc::new(RefCell::new(None));
	let resize_cb: FrameCallback = Rc::new(RefCell::new(None));
	let alive = Rc::new(Cell::new(true));

	let (handles_init, animate_init, resize_cb_init, alive_init) =
		(handles.clone(), animate.clone(), resize_cb.clone(), alive.clone());
	Effect::new(move |_| {
		let next_data = data.get();
		let overrides = config.get();
		let Some(canvas) = canvas_ref.get() else {
			return;
		};

		if let Some(ref mut engine) = *handles_init.engine.borrow_mut() {
			match engine.update(next_data, &overrides) {
				Ok(verdict) => debug!("graph `{}` updated: {:?}", engine.id(), verdict.kind()),
				Err(err) => warn!("graph `{}` kept its previous state: {err}", engine.id()),
			}
			return;
		}

		let Some(window) = web_sys::window() else {
			error!("graph `{id}` needs a browser window");
			return;
		};
		let (w, h) = if fullscreen {
			window_size(&window)
		} else {
			(
				width.unwrap_or_else(|| {
					canvas
						.parent_element()
						.map(|p| p.client_width() as f64)
						.unwrap_or(800.0)
				}),
				height.unwrap_or_else(|| {
					canvas
						.parent_element()
						.map(|p| p.client_height() as f64)
						.unwrap_or(600.0)
				}),
			)
		};
		canvas.set_width(w as u32);
		canvas.set_height(h as u32);

		let Some(ctx) = canvas
			.get_context("2d")
			.ok()
			.flatten()
			.and_then(|ctx| ctx.dyn_into::<CanvasRenderingContext2d>().ok())
		else {
			error!("graph `{id}`: canvas has no 2d context");
			return;
		};

		let mut engine = match ForceGraphState::with_force_graph(&id, next_data, &overrides) {
			Ok(engine) => engine.with_callbacks(events.clone().into()),
			Err(err) => {
				error!("graph `{id}` could not be built: {err}");
				return;
			}
		};
		engine.resize(w, h);
		*handles_init.engine.borrow_mut() = Some(engine);
		*handles_init.renderer.borrow_mut() = Some(CanvasRenderer::new(ctx, w, h));

		if fullscreen {
			let (handles_resize, canvas_resize) = (handles_init.clone(), canvas.clone());
			*resize_cb_init.borrow_mut() = Some(Closure::new(move || {
				let Some(win) = web_sys::window() else {
					return;
				};
				let (nw, nh) = window_size(&win);
				canvas_resize.set_width(nw as u32);
				canvas_resize.set_height(nh as u32);
				if let Some(ref mut engine) = *handles_resize.engine.borrow_mut() {
					engine.resize(nw, nh);
				}
				if let Some(ref mut renderer) = *handles_resize.renderer.borrow_mut() {
					renderer.resize(nw, nh);
				}
			}));
			if let Some(ref cb) = *resize_cb_init.borrow() {
				let _ =
					window.add_event_listener_with_callback("resize", cb.as_ref().unchecked_ref());
			}
		}

		let (handles_anim, animate_inner, alive_anim) =
			(handles_init.clone(), animate_init.clone(), alive_init.clone());
		let mut last_frame = js_sys::Date::now();
		*animate_init.borrow_mut() = Some(Closure::new(move || {
			if !alive_anim.get() {
				return;
			}
			let now = js_sys::Date::now();
			let dt = ((now - last_frame) / 1000.0).clamp(0.0, MAX_FRAME_SECONDS);
			last_frame = now;
			if let (Some(engine), Some(renderer)) = (
				handles_anim.engine.borrow_mut().as_mut(),
				handles_anim.renderer.borrow_mut().as_mut(),
			) {
				engine.tick(dt as f32);
				renderer.render(&engine.view(), engine.config());
			}
			request_frame(&animate_inner);
		}));
		request_frame(&animate_init);
	});

	let cleanup = SendWrapper::new((handles.engine.clone(), resize_cb, alive));
	on_cleanup(move || {
		let (engine, resize_cb, alive) = cleanup.take();
		alive.set(false);
		if let Some(ref mut engine) = *engine.borrow_mut() {
			engine.teardown();
		}
		if let (Some(window), Some(cb)) = (web_sys::window(), resize_cb.borrow().as_ref()) {
			let _ = window.remove_event_listener_with_callback("resize", cb.as_ref().unchecked_ref());
		}
	});

	let handles_md = handles.clone();
	let on_mousedown = move |ev: MouseEvent| {
		if ev.button() != 0 {
			return;
		}
		if let Some((x, y)) = local_point(canvas_ref, &ev) {
			handles_md.with_pointer(|pointer, engine| pointer.down(engine, x, y));
		}
	};

	let handles_mm = handles.clone();
	let on_mousemove = move |ev: MouseEvent| {
		if let Some((x, y)) = local_point(canvas_ref, &ev) {
			handles_mm.with_pointer(|pointer, engine| {
				pointer.moved(engine, x, y);
			});
		}
	};

	let handles_mu = handles.clone();
	let on_mouseup = move |_: MouseEvent| {
		handles_mu.with_pointer(|pointer, engine| pointer.up(engine));
	};

	let handles_ml = handles.clone();
	let on_mouseleave = move |_: MouseEvent| {
		handles_ml.with_pointer(|pointer, engine| pointer.leave(engine));
	};

	let handles_cm = handles.clone();
	let on_contextmenu = move |ev: MouseEvent| {
		ev.prevent_default();
		if let Some((x, y)) = local_point(canvas_ref, &ev) {
			handles_cm.with_pointer(|pointer, engine| pointer.context_menu(engine, x, y));
		}
	};

	let handles_wh = handles;
	let on_wheel = move |ev: WheelEvent| {
		ev.prevent_default();
		if let Some((x, y)) = local_point(canvas_ref, &ev) {
			handles_wh.with_pointer(|pointer, engine| pointer.wheel(engine, x, y, ev.delta_y()));
		}
	};

	view! {
		<canvas
			node_ref=canvas_ref
			class="force-graph-canvas"
			on:mousedown=on_mousedown
			on:mousemove=on_mousemove
			on:mouseup=on_mouseup
			on:mouseleave=on_mouseleave
			on:contextmenu=on_contextmenu
			on:wheel=on_wheel
			style="display: block; cursor: grab;"
		/>
	}
}

#[cfg(test)]
mod tests {
	use std::sync::{Arc, Mutex};

	use pretty_assertions::assert_eq;

	use super::*;

	#[test]
	fn events_become_engine_callbacks() {
		let seen = Arc::new(Mutex::new(Vec::<String>::new()));
		let (nodes, links, graph) = (seen.clone(), seen.clone(), seen.clone());
		let events = GraphEvents::default()
			.on_right_click_node(move |id| nodes.lock().unwrap().push(format!("node {id}")))
			.on_click_link(move |(s, t)| links.lock().unwrap().push(format!("link {s}-{t}")))
			.on_click_graph(move |_| graph.lock().unwrap().push("graph".into()));

		let mut callbacks = GraphCallbacks::from(events);
		assert!(callbacks.on_click_node.is_none());
		if let Some(cb) = callbacks.on_right_click_node.as_mut() {
			cb(&"A".into());
		}
		if let Some(cb) = callbacks.on_click_link.as_mut() {
			cb(&"A".into(), &"B".into());
		}
		if let Some(cb) = callbacks.on_click_graph.as_mut() {
			cb();
		}
		assert_eq!(
			*seen.lock().unwrap(),
			vec!["node A".to_string(), "link A-B".into(), "graph".into()]
		);
	}
}
