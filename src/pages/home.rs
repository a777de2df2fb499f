use leptos::prelude::*;
use serde_json::json;

use crate::components::force_graph::{
	ForceGraphCanvas, GraphData, GraphEvents, GraphLink, GraphNode, NodeId,
};

/// A random tree: every node links to one earlier node, so most of the
/// outer nodes are leaves that collapse into their parent.
fn generate_sample_data(n: usize) -> GraphData {
	let nodes: Vec<GraphNode> = (0..n)
		.map(|i| {
			let node = GraphNode {
				group: Some((i % 10) as u32),
				..GraphNode::new(i as u64)
			};
			if i < 10 {
				node.with_label(format!("Node {i}"))
			} else {
				node
			}
		})
		.collect();

	let links: Vec<GraphLink> = (1..n)
		.map(|i| {
			let target = (rand_simple(i) * (i as f64)) as usize;
			GraphLink::new(target as u64, i as u64)
		})
		.collect();

	GraphData {
		nodes,
		links,
		focused_node_id: None,
	}
}

/// Simple pseudo-random number generator (deterministic for consistency).
fn rand_simple(seed: usize) -> f64 {
	let x = ((seed + 1) * 9301 + 49297) % 233280;
	(x as f64) / 233280.0
}

/// Default Home Page
#[component]
pub fn Home() -> impl IntoView {
	let base = generate_sample_data(100);
	let focus = RwSignal::new(None::<NodeId>);
	let collapsible = RwSignal::new(true);
	let directed = RwSignal::new(true);

	let graph_data = Signal::derive(move || GraphData {
		focused_node_id: focus.get(),
		..base.clone()
	});
	let graph_config = Signal::derive(move || {
		json!({
			"collapsible": collapsible.get(),
			"directed": directed.get(),
			"node_highlight_behavior": true,
			"link_highlight_behavior": true,
			"pan_and_zoom": true,
			"focus_zoom": 2.0,
			"automatic_rearrange_after_drop_node": true,
		})
	});
	let events = GraphEvents::default()
		.on_right_click_node(move |id| focus.set(Some(id)))
		.on_click_graph(move |_| focus.set(None));

	view! {
		<ErrorBoundary fallback=|errors| {
			view! {
				<h1>"Uh oh! Something went wrong!"</h1>

				<p>"Errors: "</p>
				<ul>
					{move || {
						errors
							.get()
							.into_iter()
							.map(|(_, e)| view! { <li>{e.to_string()}</li> })
							.collect_view()
					}}
				</ul>
			}
		}>

			<div class="fullscreen-graph">
				<ForceGraphCanvas
					id="demo-graph"
					data=graph_data
					config=graph_config
					events=events.clone()
					fullscreen=true
				/>
				<div class="graph-overlay">
					<h1>"Collapsible Force Graph"</h1>
					<p class="subtitle">
						"Click a node to collapse its leaves. Right-click to focus, click the background to release."
					</p>
					<label>
						<input
							type="checkbox"
							prop:checked=move || collapsible.get()
							on:change=move |_| collapsible.update(|c| *c = !*c)
						/>
						"Collapsible"
					</label>
					<label>
						<input
							type="checkbox"
							prop:checked=move || directed.get()
							on:change=move |_| directed.update(|d| *d = !*d)
						/>
						"Directed"
					</label>
				</div>
			</div>
		</ErrorBoundary>
	}
}
