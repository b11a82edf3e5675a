use std::fmt;

use dcg_types::{Conversion, Signature, Value};
use indexmap::IndexMap;

use crate::compute::ComputeFn;

/// A compute function placed in the graph, with everything the runtime needs
/// resolved at build time.
#[derive(Debug, Clone)]
pub struct DcgNode {
  pub id: String,
  pub func: ComputeFn,
  /// Grounded copy of the function's signature.
  pub signature: Signature,
  /// Leading parameter names filled by upstream edges.
  pub required_args: Vec<String>,
  /// Trailing parameter names filled from the execution context.
  pub required_context: Vec<String>,
  /// Defaults declared for context parameters.
  pub required_context_defaults: IndexMap<String, Value>,
  /// One conversion per parameter, identity where no edge feeds it.
  pub type_conversions: Vec<Conversion>,
  /// Upstream node id per argument slot.
  pub upstream: Vec<String>,
}

impl DcgNode {
  pub(crate) fn new(id: String, func: ComputeFn) -> Self {
    let signature = func.signature().clone();
    Self {
      id,
      func,
      signature,
      required_args: Vec::new(),
      required_context: Vec::new(),
      required_context_defaults: IndexMap::new(),
      type_conversions: Vec::new(),
      upstream: Vec::new(),
    }
  }

  pub fn in_degree(&self) -> usize {
    self.required_args.len()
  }

  /// True when nothing feeds this node; it only runs when seeded.
  pub fn is_source(&self) -> bool {
    self.required_args.is_empty()
  }

  /// First slot fed by `source`.
  pub fn slot_of(&self, source: &str) -> Option<usize> {
    self.upstream.iter().position(|id| id == source)
  }

  /// Convert the value for argument `index`. Positions without a resolved
  /// conversion pass through unchanged.
  pub fn convert_arg(&self, index: usize, value: Value) -> anyhow::Result<Value> {
    match self.type_conversions.get(index) {
      Some(conversion) => conversion.apply(value),
      None => Ok(value),
    }
  }
}

impl fmt::Display for DcgNode {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}(", self.id)?;
    for (i, param) in self.signature.params.iter().enumerate() {
      if i > 0 {
        f.write_str(", ")?;
      }
      write!(f, "{}: {}", param.name, param.ty)?;
    }
    write!(f, ") -> {}", self.signature.return_type)
  }
}
