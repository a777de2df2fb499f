use std::collections::HashMap;
use std::f64::consts::PI;

use web_sys::CanvasRenderingContext2d;

use super::config::GraphConfig;
use super::interaction::ViewTransform;
use super::types::NodeId;
use super::view::{GraphRenderer, GraphView, LinkView, NodeView};

fn ease_out_cubic(t: f64) -> f64 {
	1.0 - (1.0 - t).powi(3)
}

fn lerp(a: ViewTransform, b: ViewTransform, t: f64) -> ViewTransform {
	ViewTransform {
		x: a.x + (b.x - a.x) * t,
		y: a.y + (b.y - a.y) * t,
		k: a.k + (b.k - a.k) * t,
	}
}

/// Transition toward the focus transformation, timed by the wall clock.
struct FocusTransition {
	target: Option<NodeId>,
	from: ViewTransform,
	started_at: f64,
}

/// [`GraphRenderer`] drawing onto a 2D canvas context.
pub struct CanvasRenderer {
	ctx: CanvasRenderingContext2d,
	width: f64,
	height: f64,
	/// Transform used for the last frame.
	current: ViewTransform,
	focus: FocusTransition,
}

impl CanvasRenderer {
	/// Renderer for a `width` x `height` canvas.
	pub fn new(ctx: CanvasRenderingContext2d, width: f64, height: f64) -> Self {
		Self {
			ctx,
			width,
			height,
			current: ViewTransform::default(),
			focus: FocusTransition {
				target: None,
				from: ViewTransform::default(),
				started_at: 0.0,
			},
		}
	}

	/// Canvas size changed.
	pub fn resize(&mut self, width: f64, height: f64) {
		self.width = width;
		self.height = height;
	}

	/// The transform for this frame: the focus transformation (eased in while
	/// the focus animation is armed) or the gesture transform.
	fn frame_transform(&mut self, view: &GraphView<'_>) -> ViewTransform {
		let Some(focus) = view.focus_transformation else {
			self.focus.target = None;
			return view.view_transform;
		};
		let target = ViewTransform {
			x: focus.translate_x,
			y: focus.translate_y,
			k: focus.scale,
		};
		let now = js_sys::Date::now();
		if self.focus.target.as_ref() != view.focused_node_id {
			self.focus = FocusTransition {
				target: view.focused_node_id.cloned(),
				from: self.current,
				started_at: now,
			};
		}
		if view.transition_duration <= 0.0 {
			return target;
		}
		let elapsed = now - self.focus.started_at;
		let t = (elapsed / (view.transition_duration * 1000.0)).clamp(0.0, 1.0);
		lerp(self.focus.from, target, ease_out_cubic(t))
	}

	fn draw_links(&self, view: &GraphView<'_>, config: &GraphConfig) {
		let ctx = &self.ctx;
		let radii: HashMap<&NodeId, f64> =
			view.nodes.iter().map(|n| (&n.node.id, n.radius)).collect();
		let radius_of = |id: &NodeId| radii.get(id).copied().unwrap_or(0.0);
		// Highlighted links on top.
		for highlighted in [false, true] {
			for link in view.links.iter().filter(|l| l.highlighted == highlighted) {
				draw_link(ctx, link, radius_of(&link.link.target), view.directed);
			}
		}

		ctx.set_fill_style_str(&config.link.font_color);
		ctx.set_text_align("center");
		for link in &view.links {
			if let Some(label) = link.label {
				ctx.set_global_alpha(link.opacity);
				ctx.set_font(&format!(
					"{} {}px sans-serif",
					config.link.font_weight, link.font_size
				));
				let (mx, my) = ((link.x1 + link.x2) / 2.0, (link.y1 + link.y2) / 2.0);
				let _ = ctx.fill_text(label, mx, my - 1.0);
			}
		}
		ctx.set_text_align("start");
		ctx.set_global_alpha(1.0);
	}

	fn draw_nodes(&self, view: &GraphView<'_>, config: &GraphConfig) {
		let ctx = &self.ctx;
		for highlighted in [false, true] {
			for node in view.nodes.iter().filter(|n| n.highlighted == highlighted) {
				draw_node(ctx, node);
			}
		}
		ctx.set_global_alpha(1.0);

		if !config.node.render_label {
			return;
		}
		ctx.set_fill_style_str(&config.node.font_color);
		for node in &view.nodes {
			if let Some(label) = node.label {
				ctx.set_global_alpha(node.opacity);
				ctx.set_font(&format!("{}px sans-serif", node.font_size));
				let _ = ctx.fill_text(label, node.node.x + node.radius + 3.0, node.node.y + 3.0);
			}
		}
		ctx.set_global_alpha(1.0);
	}
}

fn draw_link(ctx: &CanvasRenderingContext2d, link: &LinkView<'_>, target_radius: f64, directed: bool) {
	let (dx, dy) = (link.x2 - link.x1, link.y2 - link.y1);
	let dist = (dx * dx + dy * dy).sqrt();
	if dist < 0.001 {
		return;
	}
	let (ux, uy) = (dx / dist, dy / dist);
	let arrow_size = link.stroke_width * 4.0;

	ctx.set_global_alpha(link.opacity);
	ctx.set_stroke_style_str(link.color);
	ctx.set_line_width(link.stroke_width);
	ctx.begin_path();
	ctx.move_to(link.x1, link.y1);
	if directed {
		ctx.line_to(
			link.x2 - ux * (target_radius + arrow_size),
			link.y2 - uy * (target_radius + arrow_size),
		);
	} else {
		ctx.line_to(link.x2, link.y2);
	}
	ctx.stroke();

	if !directed {
		return;
	}
	ctx.set_fill_style_str(link.color);
	let (tip_x, tip_y) = (link.x2 - ux * target_radius, link.y2 - uy * target_radius);
	let (back_x, back_y) = (tip_x - ux * arrow_size, tip_y - uy * arrow_size);
	let (px, py) = (-uy * arrow_size * 0.5, ux * arrow_size * 0.5);
	ctx.begin_path();
	ctx.move_to(tip_x, tip_y);
	ctx.line_to(back_x + px, back_y + py);
	ctx.line_to(back_x - px, back_y - py);
	ctx.close_path();
	ctx.fill();
}

fn draw_node(ctx: &CanvasRenderingContext2d, node: &NodeView<'_>) {
	let (x, y) = (node.node.x, node.node.y);
	ctx.set_global_alpha(node.opacity);
	ctx.begin_path();
	let _ = ctx.arc(x, y, node.radius, 0.0, 2.0 * PI);
	ctx.set_fill_style_str(node.color);
	ctx.fill();
	if node.stroke_color != "none" {
		ctx.set_stroke_style_str(node.stroke_color);
		ctx.set_line_width(node.stroke_width);
		ctx.stroke();
	}
}

impl GraphRenderer for CanvasRenderer {
	fn render(&mut self, view: &GraphView<'_>, config: &GraphConfig) {
		let transform = self.frame_transform(view);
		self.current = transform;

		let ctx = &self.ctx;
		ctx.clear_rect(0.0, 0.0, self.width, self.height);
		ctx.save();
		let _ = ctx.translate(transform.x, transform.y);
		let _ = ctx.scale(transform.k, transform.k);
		self.draw_links(view, config);
		self.draw_nodes(view, config);
		self.ctx.restore();
	}
}
