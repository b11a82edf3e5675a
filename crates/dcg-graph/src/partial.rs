//! Partial application of compute functions.

use std::sync::Arc;

use dcg_types::{Signature, Value};

use crate::compute::{Body, BoundArg, ComputeFn};
use crate::error::GraphError;

/// A compute function with some parameters bound to fixed values by name.
///
/// The exposed signature drops the bound parameters, so the graph builder
/// neither fills them from upstream nodes nor asks the context for them. At
/// call time the bound values are put back at their original positions.
#[derive(Debug, Clone)]
pub struct PartialFn {
  func: ComputeFn,
  bound: Vec<BoundArg>,
  signature: Signature,
}

impl PartialFn {
  /// Bind `bindings` (parameter name -> value) on `func`.
  ///
  /// # Errors
  /// `UnknownArgument` if a name is not a parameter of `func`.
  pub fn new<K: Into<String>>(
    func: ComputeFn,
    bindings: impl IntoIterator<Item = (K, Value)>,
  ) -> Result<Self, GraphError> {
    let wrapped = func.signature();
    let mut bound: Vec<BoundArg> = Vec::new();

    for (name, value) in bindings {
      let name = name.into();
      let Some(position) = wrapped.position(&name) else {
        return Err(GraphError::UnknownArgument {
          name,
          params: wrapped.argnames().join(", "),
        });
      };
      bound.retain(|arg| arg.position != position);
      bound.push(BoundArg {
        position,
        param: wrapped.params[position].clone(),
        value,
      });
    }
    bound.sort_by_key(|arg| arg.position);

    let signature = Signature {
      params: wrapped
        .params
        .iter()
        .enumerate()
        .filter(|(i, _)| !bound.iter().any(|arg| arg.position == *i))
        .map(|(_, param)| param.clone())
        .collect(),
      return_type: wrapped.return_type.clone(),
    };

    Ok(Self {
      func,
      bound,
      signature,
    })
  }

  /// Signature without the bound parameters.
  pub fn signature(&self) -> &Signature {
    &self.signature
  }

  /// Bound parameters, with their declared types, in positional order.
  pub fn bound(&self) -> &[BoundArg] {
    &self.bound
  }

  /// The wrapped function.
  pub fn func(&self) -> &ComputeFn {
    &self.func
  }
}

/// Re-insert bound values at their positions. `bound` is sorted by position.
fn merge(bound: &[BoundArg], mut args: Vec<Value>) -> Vec<Value> {
  for arg in bound {
    let at = arg.position.min(args.len());
    args.insert(at, arg.value.clone());
  }
  args
}

impl From<PartialFn> for ComputeFn {
  fn from(partial: PartialFn) -> Self {
    let PartialFn {
      func,
      bound,
      signature,
    } = partial;
    let bound: Arc<[BoundArg]> = Arc::from(bound);

    let body = match func.body() {
      Body::Sync(inner) => {
        let inner = inner.clone();
        let bound = bound.clone();
        Body::Sync(Arc::new(move |args| inner(merge(&bound, args))))
      }
      Body::Async(inner) => {
        let inner = inner.clone();
        let bound = bound.clone();
        Body::Async(Arc::new(move |args| inner(merge(&bound, args))))
      }
    };

    ComputeFn::from_body(signature, bound, body)
  }
}
