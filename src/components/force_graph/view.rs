//! Immutable per-frame snapshot handed to a [`GraphRenderer`].

use std::collections::HashSet;
use std::f64::consts::PI;

use super::collapse::is_node_visible;
use super::config::GraphConfig;
use super::interaction::{FocusTransformation, InteractionState, ViewTransform};
use super::model::{GraphModel, Link, Node};
use super::types::NodeId;

/// Palette for nodes that carry a group but no color of their own.
const COLORS: &[&str] = &[
	"#1f77b4", "#ff7f0e", "#2ca02c", "#d62728", "#9467bd", "#8c564b", "#e377c2", "#7f7f7f",
	"#bcbd22", "#17becf",
];

/// Config value meaning "keep the regular color when highlighted".
const SAME: &str = "SAME";

/// A visible node with its resolved style.
pub struct NodeView<'a> {
	/// The model record.
	pub node: &'a Node,
	/// Hovered, or a neighbor of the hovered node.
	pub highlighted: bool,
	/// Dimmed while something else is highlighted.
	pub opacity: f64,
	/// Fill color.
	pub color: &'a str,
	/// Outline color, `"none"` for no outline.
	pub stroke_color: &'a str,
	/// World-space radius; `size` is an area, as for symbols.
	pub radius: f64,
	/// Outline width, divided by the persisted zoom.
	pub stroke_width: f64,
	/// Label size, divided by the persisted zoom.
	pub font_size: f64,
	/// Label to draw, if labels are on.
	pub label: Option<&'a str>,
}

/// A visible link with endpoint coordinates and resolved style.
pub struct LinkView<'a> {
	/// The model record.
	pub link: &'a Link,
	/// Source position.
	pub x1: f64,
	/// See `x1`.
	pub y1: f64,
	/// Target position.
	pub x2: f64,
	/// See `x2`.
	pub y2: f64,
	/// Touches the hovered node, or is the hovered link.
	pub highlighted: bool,
	/// Dimmed while something else is highlighted.
	pub opacity: f64,
	/// Stroke color.
	pub color: &'a str,
	/// Line width, divided by the persisted zoom.
	pub stroke_width: f64,
	/// Label size, divided by the persisted zoom.
	pub font_size: f64,
	/// Label to draw at the midpoint, if link labels are on.
	pub label: Option<&'a str>,
}

/// What a renderer may draw this frame. Links never reference a node that
/// is not in `nodes`.
pub struct GraphView<'a> {
	/// Visible nodes in model order.
	pub nodes: Vec<NodeView<'a>>,
	/// Visible links in model order.
	pub links: Vec<LinkView<'a>>,
	/// Hovered node.
	pub highlighted_node: Option<&'a NodeId>,
	/// Hovered link.
	pub highlighted_link: Option<(&'a NodeId, &'a NodeId)>,
	/// Requested focus target.
	pub focused_node_id: Option<&'a NodeId>,
	/// Persisted zoom scale.
	pub transform: f64,
	/// Transform from the last gesture.
	pub view_transform: ViewTransform,
	/// Set while a focus target exists; overrides `view_transform`.
	pub focus_transformation: Option<FocusTransformation>,
	/// Seconds; 0 when no focus animation is armed.
	pub transition_duration: f64,
	/// Draw arrowheads.
	pub directed: bool,
}

impl<'a> GraphView<'a> {
	/// Snapshot the drawable part of `model`.
	pub fn new(
		model: &'a GraphModel,
		config: &'a GraphConfig,
		interaction: &'a InteractionState,
	) -> Self {
		let highlighted_node = interaction.highlighted_node();
		let highlighted_link = interaction.highlighted_link();
		let something_highlighted = highlighted_node.is_some() || highlighted_link.is_some();
		// Divided by the persisted zoom, which stays 1 unless pan and zoom is on.
		let scale = 1.0 / interaction.transform().max(f64::EPSILON);

		let visible: HashSet<&NodeId> = model
			.nodes
			.iter()
			.filter(|n| {
				!config.collapsible || is_node_visible(n.id.as_str(), &model.nodes, &model.matrix)
			})
			.map(|n| &n.id)
			.collect();

		let nodes = model
			.nodes
			.iter()
			.filter(|n| visible.contains(&n.id))
			.map(|node| node_view(node, config, something_highlighted, scale))
			.collect();

		let links = model
			.links
			.iter()
			.filter(|l| !l.is_hidden && visible.contains(&l.source) && visible.contains(&l.target))
			.filter_map(|link| {
				let source = model.nodes.get(link.source.as_str())?;
				let target = model.nodes.get(link.target.as_str())?;
				let highlighted = highlighted_node
					.is_some_and(|id| *id == link.source || *id == link.target)
					|| highlighted_link
						.is_some_and(|(s, t)| *s == link.source && *t == link.target);
				Some(link_view(
					link,
					(source, target),
					highlighted,
					config,
					something_highlighted,
					scale,
				))
			})
			.collect();

		Self {
			nodes,
			links,
			highlighted_node,
			highlighted_link,
			focused_node_id: interaction.focused_node_id(),
			transform: interaction.transform(),
			view_transform: interaction.view(),
			focus_transformation: interaction.focus_transformation(),
			transition_duration: interaction.transition_duration(config),
			directed: config.directed,
		}
	}
}

fn node_view<'a>(
	node: &'a Node,
	config: &'a GraphConfig,
	something_highlighted: bool,
	scale: f64,
) -> NodeView<'a> {
	let own = node
		.color
		.as_deref()
		.or_else(|| node.group.map(|g| COLORS[g as usize % COLORS.len()]))
		.unwrap_or(config.node.color.as_str());
	let highlighted = node.highlighted;
	let color = if highlighted && config.node.highlight_color != SAME {
		config.node.highlight_color.as_str()
	} else {
		own
	};
	let stroke_color = if highlighted && config.node.highlight_stroke_color != SAME {
		config.node.highlight_stroke_color.as_str()
	} else {
		config.node.stroke_color.as_str()
	};
	let opacity = if highlighted || !something_highlighted {
		config.node.opacity
	} else {
		config.highlight_opacity
	};
	let size = node.size.unwrap_or(config.node.size).max(0.0) * scale;
	NodeView {
		node,
		highlighted,
		opacity,
		color,
		stroke_color,
		radius: (size / PI).sqrt(),
		stroke_width: config.node.stroke_width * scale,
		font_size: config.node.font_size * scale,
		label: node
			.label
			.as_deref()
			.filter(|_| config.node.render_label)
			.or(config.node.render_label.then(|| node.id.as_str())),
	}
}

fn link_view<'a>(
	link: &'a Link,
	(source, target): (&Node, &Node),
	highlighted: bool,
	config: &'a GraphConfig,
	something_highlighted: bool,
	scale: f64,
) -> LinkView<'a> {
	let color = if highlighted {
		config.link.highlight_color.as_str()
	} else {
		link.color.as_deref().unwrap_or(config.link.color.as_str())
	};
	let opacity = if highlighted || !something_highlighted {
		config.link.opacity
	} else {
		config.highlight_opacity
	};
	LinkView {
		link,
		x1: source.x,
		y1: source.y,
		x2: target.x,
		y2: target.y,
		highlighted,
		opacity,
		color,
		stroke_width: link.stroke_width.unwrap_or(config.link.stroke_width) * scale,
		font_size: config.link.font_size * scale,
		label: link.label.as_deref().filter(|_| config.link.render_label),
	}
}

/// Draws a [`GraphView`]. Implementations own their drawing surface.
pub trait GraphRenderer {
	/// Draw one frame.
	fn render(&mut self, view: &GraphView<'_>, config: &GraphConfig);
}
