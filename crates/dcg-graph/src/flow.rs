use std::fmt;
use std::sync::Arc;

use dcg_types::Value;
use indexmap::IndexMap;

use crate::compute::ComputeFn;
use crate::partial::PartialFn;

/// Predicate deciding whether an upstream output is forwarded along an edge.
pub type FilterFn = Arc<dyn Fn(&Value) -> bool + Send + Sync>;

/// Ordered upstream node ids of a flow.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Sources(pub Vec<String>);

impl Sources {
  pub fn len(&self) -> usize {
    self.0.len()
  }

  pub fn is_empty(&self) -> bool {
    self.0.is_empty()
  }

  pub fn iter(&self) -> impl Iterator<Item = &str> {
    self.0.iter().map(String::as_str)
  }
}

impl From<&str> for Sources {
  fn from(value: &str) -> Self {
    Self(vec![value.to_string()])
  }
}

impl From<String> for Sources {
  fn from(value: String) -> Self {
    Self(vec![value])
  }
}

impl<const N: usize> From<[&str; N]> for Sources {
  fn from(value: [&str; N]) -> Self {
    Self(value.iter().map(|s| s.to_string()).collect())
  }
}

impl From<Vec<&str>> for Sources {
  fn from(value: Vec<&str>) -> Self {
    Self(value.into_iter().map(String::from).collect())
  }
}

impl From<Vec<String>> for Sources {
  fn from(value: Vec<String>) -> Self {
    Self(value)
  }
}

/// A target function fed by upstream nodes.
///
/// `source[i]` fills the target's `i`-th parameter; parameters past the last
/// source are filled from the execution context.
#[derive(Clone)]
pub struct Flow {
  pub source: Sources,
  pub target: ComputeFn,
  pub filter_fn: Option<FilterFn>,
}

impl Flow {
  pub fn new(source: impl Into<Sources>, target: impl Into<ComputeFn>) -> Self {
    Self {
      source: source.into(),
      target: target.into(),
      filter_fn: None,
    }
  }

  /// Only forward upstream outputs for which `filter` returns true.
  pub fn with_filter(mut self, filter: impl Fn(&Value) -> bool + Send + Sync + 'static) -> Self {
    self.filter_fn = Some(Arc::new(filter));
    self
  }
}

impl fmt::Debug for Flow {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("Flow")
      .field("source", &self.source)
      .field("target", &self.target)
      .field("filter_fn", &self.filter_fn.is_some())
      .finish()
  }
}

/// One entry of a flow map: a bare function (a source node) or a flow.
#[derive(Debug, Clone)]
pub enum FlowSpec {
  Fn(ComputeFn),
  Flow(Flow),
}

impl FlowSpec {
  /// The function the node runs.
  pub fn target(&self) -> &ComputeFn {
    match self {
      Self::Fn(func) => func,
      Self::Flow(flow) => &flow.target,
    }
  }
}

impl From<ComputeFn> for FlowSpec {
  fn from(value: ComputeFn) -> Self {
    Self::Fn(value)
  }
}

impl From<PartialFn> for FlowSpec {
  fn from(value: PartialFn) -> Self {
    Self::Fn(value.into())
  }
}

impl From<Flow> for FlowSpec {
  fn from(value: Flow) -> Self {
    Self::Flow(value)
  }
}

/// Insertion-ordered node id -> spec mapping.
pub type FlowMap = IndexMap<String, FlowSpec>;
