//! Compute functions.
//!
//! A [`ComputeFn`] pairs a callable with its declared [`Signature`]. The
//! callable receives the positional argument vector (upstream arguments
//! followed by context arguments) and is either synchronous or returns a
//! boxed future.

use std::fmt;
use std::future::Future;
use std::sync::Arc;

use dcg_types::{Param, Signature, Value};
use futures::FutureExt;
use futures::future::BoxFuture;

/// Result of a compute function. User errors are carried as `anyhow::Error`
/// so callers can downcast back to their own error type.
pub type ComputeResult = anyhow::Result<Value>;

/// Future returned by an asynchronous compute function.
pub type ComputeFuture = BoxFuture<'static, ComputeResult>;

type SyncBody = dyn Fn(Vec<Value>) -> ComputeResult + Send + Sync;
type AsyncBody = dyn Fn(Vec<Value>) -> ComputeFuture + Send + Sync;

#[derive(Clone)]
pub(crate) enum Body {
  Sync(Arc<SyncBody>),
  Async(Arc<AsyncBody>),
}

/// Outcome of invoking a compute function.
pub enum Invocation {
  /// The function ran to completion.
  Ready(ComputeResult),
  /// The function returned a suspended computation.
  Pending(ComputeFuture),
}

impl Invocation {
  /// Await the result, whatever kind of function produced it.
  pub async fn resolve(self) -> ComputeResult {
    match self {
      Self::Ready(result) => result,
      Self::Pending(future) => future.await,
    }
  }
}

/// A parameter bound to a fixed value by partial application.
#[derive(Debug, Clone, PartialEq)]
pub struct BoundArg {
  /// Position in the wrapped function's signature.
  pub position: usize,
  pub param: Param,
  pub value: Value,
}

/// A compute function and its signature. Cheap to clone.
#[derive(Clone)]
pub struct ComputeFn {
  signature: Arc<Signature>,
  bound: Arc<[BoundArg]>,
  body: Body,
}

impl ComputeFn {
  /// Wrap a synchronous function.
  pub fn new<F>(signature: Signature, body: F) -> Self
  where
    F: Fn(Vec<Value>) -> ComputeResult + Send + Sync + 'static,
  {
    Self::from_body(signature, Arc::from([]), Body::Sync(Arc::new(body)))
  }

  /// Wrap an asynchronous function.
  pub fn new_async<F, Fut>(signature: Signature, body: F) -> Self
  where
    F: Fn(Vec<Value>) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = ComputeResult> + Send + 'static,
  {
    Self::from_body(
      signature,
      Arc::from([]),
      Body::Async(Arc::new(move |args| body(args).boxed())),
    )
  }

  pub(crate) fn from_body(signature: Signature, bound: Arc<[BoundArg]>, body: Body) -> Self {
    Self {
      signature: Arc::new(signature),
      bound,
      body,
    }
  }

  pub(crate) fn body(&self) -> &Body {
    &self.body
  }

  pub fn signature(&self) -> &Signature {
    &self.signature
  }

  /// Parameters fixed by partial application; empty for plain functions.
  pub fn bound_args(&self) -> &[BoundArg] {
    &self.bound
  }

  pub fn is_async(&self) -> bool {
    matches!(self.body, Body::Async(_))
  }

  /// Call the function with positional arguments.
  pub fn invoke(&self, args: Vec<Value>) -> Invocation {
    match &self.body {
      Body::Sync(body) => Invocation::Ready(body(args)),
      Body::Async(body) => Invocation::Pending(body(args)),
    }
  }
}

impl fmt::Debug for ComputeFn {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("ComputeFn")
      .field("signature", &self.signature)
      .field("bound", &self.bound)
      .field("is_async", &self.is_async())
      .finish()
  }
}
