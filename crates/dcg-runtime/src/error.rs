//! Runtime errors.

/// Errors that can occur while executing a graph.
///
/// Any error aborts the whole call; results computed so far are discarded.
#[derive(Debug, thiserror::Error)]
pub enum RuntimeError {
  /// A compute function failed. The source is the function's own error.
  #[error("compute function of node '{node_id}' failed")]
  Compute {
    node_id: String,
    #[source]
    source: anyhow::Error,
  },

  /// Converting an upstream value to the parameter type failed.
  #[error("failed to convert argument {argindex} of node '{node_id}'")]
  Conversion {
    node_id: String,
    argindex: usize,
    #[source]
    source: anyhow::Error,
  },

  /// A context parameter has neither a context value nor a default.
  #[error("node '{node_id}' requires context value '{name}' which is not provided and has no default")]
  MissingContext { node_id: String, name: String },

  /// The context provider or a lazy context value failed.
  #[error("failed to resolve context")]
  Context {
    #[source]
    source: anyhow::Error,
  },

  /// A seed or output names a node that is not in the graph.
  #[error("node '{node_id}' not found in graph")]
  NodeNotFound { node_id: String },

  /// A seed tuple does not fit the node's parameters.
  #[error("invalid input for node '{node_id}': {message}")]
  InvalidInput { node_id: String, message: String },

  /// The synchronous engine reached an asynchronous compute function.
  #[error("node '{node_id}' has an async compute function; use execute_async")]
  AsyncNode { node_id: String },

  /// An upstream value was delivered to a slot the node does not have.
  #[error("slot {slot} out of range for node '{node_id}' with {slots} slot(s)")]
  SlotOutOfRange {
    node_id: String,
    slot: usize,
    slots: usize,
  },
}

impl RuntimeError {
  /// The node this error is attributed to, if any.
  pub fn node_id(&self) -> Option<&str> {
    match self {
      Self::Compute { node_id, .. }
      | Self::Conversion { node_id, .. }
      | Self::MissingContext { node_id, .. }
      | Self::NodeNotFound { node_id }
      | Self::InvalidInput { node_id, .. }
      | Self::AsyncNode { node_id }
      | Self::SlotOutOfRange { node_id, .. } => Some(node_id),
      Self::Context { .. } => None,
    }
  }
}
