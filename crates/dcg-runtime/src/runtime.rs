//! Graph runtime.

use std::collections::HashMap;
use std::future::Future;

use dcg_graph::{DirectedComputingGraph, Invocation};
use dcg_types::Value;
use tracing::instrument;

use crate::context::Context;
use crate::error::RuntimeError;
use crate::execution::{Execution, Task};
use crate::value::ArgValue;

/// Executes a [`DirectedComputingGraph`].
///
/// The graph is read-only; every call keeps its own task buffers, so a
/// runtime can be called repeatedly and calls do not affect each other.
#[derive(Debug, Clone)]
pub struct Runtime {
  graph: DirectedComputingGraph,
}

impl Runtime {
  pub fn new(graph: DirectedComputingGraph) -> Self {
    Self { graph }
  }

  pub fn graph(&self) -> &DirectedComputingGraph {
    &self.graph
  }

  /// Run the graph from `input` seeds and collect the outputs of the
  /// `output` nodes.
  ///
  /// Each seed is a node id and the leading positional arguments for it.
  /// Values beyond the node's upstream parameters take the place of its
  /// leading context parameters. Nodes that never run, or whose every task
  /// was skipped, map to an empty list.
  ///
  /// # Errors
  /// The first failure aborts the call; see [`RuntimeError`]. A node with an
  /// async compute function fails with `AsyncNode`.
  #[instrument(name = "dcg_execute", skip_all)]
  pub fn execute<K, O>(
    &self,
    input: impl IntoIterator<Item = (K, Vec<Value>)>,
    output: impl IntoIterator<Item = O>,
    context: Context,
  ) -> Result<HashMap<String, Vec<Value>>, RuntimeError>
  where
    K: AsRef<str>,
    O: AsRef<str>,
  {
    let mut execution = Execution::new(&self.graph, execution_id(), input, output, context)?;

    while let Some(Task { idx, key, args }) = execution.next_task() {
      let output = match execution.call_args(idx, args)? {
        None => ArgValue::Skip,
        Some(args) => {
          let node = execution.node(idx);
          match node.func.invoke(args) {
            Invocation::Ready(result) => {
              ArgValue::Data(result.map_err(|source| RuntimeError::Compute {
                node_id: node.id.clone(),
                source,
              })?)
            }
            Invocation::Pending(_) => {
              return Err(RuntimeError::AsyncNode {
                node_id: node.id.clone(),
              });
            }
          }
        }
      };
      execution.complete(idx, key, output)?;
    }

    Ok(execution.finish())
  }

  /// Like [`execute`](Self::execute), awaiting async compute functions.
  /// Sync and async compute functions can be mixed freely.
  ///
  /// Seeds are checked and the context is resolved when this is called;
  /// the nodes run when the returned future is awaited.
  pub fn execute_async<K, O>(
    &self,
    input: impl IntoIterator<Item = (K, Vec<Value>)>,
    output: impl IntoIterator<Item = O>,
    context: Context,
  ) -> impl Future<Output = Result<HashMap<String, Vec<Value>>, RuntimeError>> + Send
  where
    K: AsRef<str>,
    O: AsRef<str>,
  {
    let execution = Execution::new(&self.graph, execution_id(), input, output, context);

    async move {
      let mut execution = execution?;

      while let Some(Task { idx, key, args }) = execution.next_task() {
        let output = match execution.call_args(idx, args)? {
          None => ArgValue::Skip,
          Some(args) => {
            let node = execution.node(idx);
            let value = node.func.invoke(args).resolve().await.map_err(|source| {
              RuntimeError::Compute {
                node_id: node.id.clone(),
                source,
              }
            })?;
            ArgValue::Data(value)
          }
        };
        execution.complete(idx, key, output)?;
      }

      Ok(execution.finish())
    }
  }
}

fn execution_id() -> String {
  uuid::Uuid::new_v4().to_string()
}
