use thiserror::Error;

use super::types::NodeId;

/// Errors raised while constructing or updating a graph.
#[derive(Debug, Error)]
pub enum GraphError {
	/// Fatal at construction, before anything is rendered.
	#[error("invalid graph configuration: {0}")]
	Configuration(String),

	/// Two payload nodes share an id.
	#[error("duplicate node id `{0}`")]
	DuplicateNodeId(NodeId),

	/// A link names a node the payload does not contain.
	#[error("link {source_id} -> {target_id} references an unknown node")]
	DanglingLinkReference {
		/// Link source.
		source_id: NodeId,
		/// Link target.
		target_id: NodeId,
	},

	/// The JSON payload did not parse.
	#[error("invalid graph payload: {0}")]
	InvalidPayload(#[from] serde_json::Error),
}

/// Result alias for graph construction and updates.
pub type GraphResult<T> = Result<T, GraphError>;

/// A failure inside a single physics step. Caught at the tick boundary; the
/// frame's position update is skipped and the integrator keeps running.
#[derive(Debug, Error, PartialEq)]
pub enum TickError {
	/// A position came back NaN or infinite.
	#[error("node {index} received a non-finite position ({x}, {y})")]
	NonFinitePosition {
		/// Index into the node array.
		index: usize,
		/// Proposed x.
		x: f64,
		/// Proposed y.
		y: f64,
	},

	/// The step returned a position list of the wrong length.
	#[error("integrator returned {got} positions for {expected} nodes")]
	PositionCountMismatch {
		/// Nodes registered.
		expected: usize,
		/// Positions returned.
		got: usize,
	},
}
