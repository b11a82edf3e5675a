//! Graph construction errors.

use dcg_types::TypeError;
use thiserror::Error;

/// Errors raised while building a graph or wrapping a compute function.
///
/// Building fails atomically: no partial graph is returned.
#[derive(Debug, Error)]
pub enum GraphError {
  /// No conversion from the upstream return type to the argument type.
  #[error("don't know how to convert output of `{source_id}` to input {argindex} of `{target_id}`")]
  UnknownConversion {
    source_id: String,
    target_id: String,
    argindex: usize,
    #[source]
    cause: TypeError,
  },

  /// A generic parameter or return type could not be grounded.
  #[error("cannot ground generic type of `{param}` for node `{node_id}`")]
  GenericGrounding {
    node_id: String,
    param: String,
    #[source]
    cause: TypeError,
  },

  /// A generic parameter sits beyond the declared upstream sources.
  #[error(
    "cannot ground generic parameter `{param}` of node `{node_id}`: only {sources} upstream source(s) declared"
  )]
  MissingGenericSource {
    node_id: String,
    param: String,
    sources: usize,
  },

  /// A flow lists an upstream id that is not part of the graph.
  #[error("node `{node_id}` lists unknown upstream node `{source_id}`")]
  UnknownSource { node_id: String, source_id: String },

  /// A flow declares more upstream sources than its target has parameters.
  #[error("node `{node_id}` declares {sources} upstream source(s) but its function takes {params} parameter(s)")]
  TooManySources {
    node_id: String,
    sources: usize,
    params: usize,
  },

  /// A partial application binds a name the function does not declare.
  #[error("argument `{name}` is not in the function signature (parameters: {params})")]
  UnknownArgument { name: String, params: String },
}

impl GraphError {
  /// True for the conversion and grounding failures that lenient builds
  /// fall back from.
  pub fn is_conversion_error(&self) -> bool {
    matches!(
      self,
      Self::UnknownConversion { .. }
        | Self::GenericGrounding { .. }
        | Self::MissingGenericSource { .. }
    )
  }
}
