//! Collapsible force-directed graph: the graph-state engine and the canvas
//! component that hosts it.

mod collapse;
mod component;
mod config;
mod diff;
mod error;
mod gesture;
mod interaction;
mod model;
mod render;
mod simulation;
mod state;
mod types;
mod view;

pub use collapse::{
	Connection, NodeDegree, compute_node_degree, get_target_leaf_connections, is_leaf,
	is_leaf_directed, is_leaf_not_directed, is_node_visible, toggle_links_connections,
	toggle_links_matrix_connections,
};
pub use component::{ForceGraphCanvas, GraphEvents};
pub use config::{ForceConfig, GraphConfig, LinkConfig, NodeConfig, merge_overrides};
pub use diff::{UpdateKind, UpdateVerdict, classify};
pub use error::{GraphError, GraphResult, TickError};
pub use gesture::{CLICK_TOLERANCE, PointerState};
pub use interaction::{FocusTransformation, InteractionState, ViewTransform};
pub use model::{GraphModel, Link, LinksMatrix, MatrixRow, Node, NodeMap, build_model};
pub use render::CanvasRenderer;
pub use simulation::{
	CHARGE_FORCE, ForceGraphIntegrator, ForceSpec, LINK_FORCE, PhysicsIntegrator,
	SimulationController,
};
pub use state::{ForceGraphState, GraphCallbacks, HIT_RADIUS};
pub use types::{GraphData, GraphLink, GraphNode, NodeId};
pub use view::{GraphRenderer, GraphView, LinkView, NodeView};
