//! Execution state shared by the sync and async engines.

use std::collections::{HashMap, VecDeque};

use dcg_graph::{DcgNode, DirectedComputingGraph, NodeIndex};
use dcg_types::Value;
use indexmap::{IndexMap, IndexSet};
use tracing::{debug, info};

use crate::context::Context;
use crate::error::RuntimeError;
use crate::node_runtime::NodeRuntime;
use crate::task::{TaskArgs, TaskKey};
use crate::value::ArgValue;

/// A ready task taken off a node's buffer.
pub(crate) struct Task {
  pub(crate) idx: NodeIndex,
  pub(crate) key: TaskKey,
  pub(crate) args: TaskArgs,
}

/// One call of the graph: node runtimes, the work stack and the requested
/// outputs.
///
/// Nodes are popped from a LIFO stack. A popped node with a ready task has
/// all its ready tasks drained, each handed out once by [`next_task`]; once
/// drained, its downstream nodes are pushed in edge order.
///
/// [`next_task`]: Execution::next_task
pub(crate) struct Execution<'g> {
  graph: &'g DirectedComputingGraph,
  pub(crate) execution_id: String,
  runtimes: Vec<NodeRuntime>,
  stack: Vec<NodeIndex>,
  current: Option<(NodeIndex, VecDeque<(TaskKey, TaskArgs)>)>,
  requested: IndexMap<NodeIndex, Vec<Value>>,
}

impl<'g> Execution<'g> {
  /// Resolve the context, prepare every node and register the seeds.
  ///
  /// # Errors
  /// `NodeNotFound` for unknown seed or output ids, `InvalidInput` for seed
  /// tuples that do not fit the node, `Context` and `MissingContext` for
  /// context failures.
  pub(crate) fn new<K, O>(
    graph: &'g DirectedComputingGraph,
    execution_id: String,
    input: impl IntoIterator<Item = (K, Vec<Value>)>,
    output: impl IntoIterator<Item = O>,
    context: Context,
  ) -> Result<Self, RuntimeError>
  where
    K: AsRef<str>,
    O: AsRef<str>,
  {
    let mut seeds: IndexMap<NodeIndex, Vec<Value>> = IndexMap::new();
    for (id, args) in input {
      let idx = lookup(graph, id.as_ref())?;
      check_seed(graph.node_at(idx), &args)?;
      seeds.insert(idx, args);
    }

    let requested = output
      .into_iter()
      .map(|id| lookup(graph, id.as_ref()).map(|idx| (idx, Vec::new())))
      .collect::<Result<IndexMap<_, _>, _>>()?;

    let context = context.resolve()?;

    let runtimes = graph
      .node_indices()
      .map(|idx| {
        let node = graph.node_at(idx);
        let consumed = seeds
          .get(&idx)
          .map_or(0, |args| args.len() - node.required_args.len());
        NodeRuntime::new(node, &context, consumed)
      })
      .collect::<Result<Vec<_>, _>>()?;

    info!(
      execution_id = %execution_id,
      seeds = seeds.len(),
      outputs = requested.len(),
      "execution_started"
    );

    let mut execution = Self {
      graph,
      execution_id,
      runtimes,
      stack: Vec::with_capacity(seeds.len()),
      current: None,
      requested,
    };
    for (idx, args) in seeds {
      execution.runtimes[idx.index()].add_task(TaskKey::root(), TaskArgs::seeded(args));
      execution.stack.push(idx);
    }
    Ok(execution)
  }

  pub(crate) fn node(&self, idx: NodeIndex) -> &'g DcgNode {
    self.graph.node_at(idx)
  }

  /// The next ready task, or `None` when the stack is exhausted.
  pub(crate) fn next_task(&mut self) -> Option<Task> {
    loop {
      if let Some((idx, queue)) = &mut self.current {
        let idx = *idx;
        match queue.pop_front() {
          Some((key, args)) => return Some(Task { idx, key, args }),
          None => {
            self.current = None;
            self.push_successors(idx);
          }
        }
      }

      let idx = self.stack.pop()?;
      let runtime = &mut self.runtimes[idx.index()];
      if !runtime.has_enough_data() {
        continue;
      }
      self.current = Some((idx, runtime.take_ready().into()));
    }
  }

  /// Positional arguments for a task of `idx`, or `None` if it carries a
  /// skip.
  pub(crate) fn call_args(
    &self,
    idx: NodeIndex,
    args: TaskArgs,
  ) -> Result<Option<Vec<Value>>, RuntimeError> {
    self.runtimes[idx.index()].call_args(self.node(idx), args)
  }

  /// Record the output of the task `key` of `idx` and deliver it along every
  /// outgoing edge.
  pub(crate) fn complete(
    &mut self,
    idx: NodeIndex,
    key: TaskKey,
    output: ArgValue,
  ) -> Result<(), RuntimeError> {
    let graph = self.graph;
    let node = graph.node_at(idx);
    match &output {
      ArgValue::Skip => debug!(
        execution_id = %self.execution_id,
        node_id = %node.id,
        task = %key,
        "task_skipped"
      ),
      _ => debug!(
        execution_id = %self.execution_id,
        node_id = %node.id,
        task = %key,
        "task_executed"
      ),
    }

    for &(edge_idx, target) in graph.successors(idx) {
      let edge = graph.edge_at(edge_idx);
      let value = match &output {
        ArgValue::Data(value) if edge.filter(value) => ArgValue::Data(value.clone()),
        _ => ArgValue::Skip,
      };
      self.runtimes[target.index()].add_task_arg(
        &edge.target,
        key.clone(),
        edge.argindex,
        value,
      )?;
    }

    if let (Some(results), ArgValue::Data(value)) = (self.requested.get_mut(&idx), output) {
      results.push(value);
    }
    Ok(())
  }

  /// Push every distinct downstream node of `idx`, in edge order.
  fn push_successors(&mut self, idx: NodeIndex) {
    let graph = self.graph;
    let targets: IndexSet<NodeIndex> = graph
      .successors(idx)
      .iter()
      .map(|&(_, target)| target)
      .collect();
    self.stack.extend(targets);
  }

  /// The requested outputs, keyed by node id.
  pub(crate) fn finish(self) -> HashMap<String, Vec<Value>> {
    let graph = self.graph;
    info!(execution_id = %self.execution_id, "execution_completed");
    self
      .requested
      .into_iter()
      .map(|(idx, values)| (graph.node_at(idx).id.clone(), values))
      .collect()
  }
}

fn lookup(graph: &DirectedComputingGraph, id: &str) -> Result<NodeIndex, RuntimeError> {
  graph.node_index(id).ok_or_else(|| RuntimeError::NodeNotFound {
    node_id: id.to_string(),
  })
}

fn check_seed(node: &DcgNode, args: &[Value]) -> Result<(), RuntimeError> {
  let min = node.required_args.len();
  let max = min + node.required_context.len();
  if args.len() < min {
    return Err(RuntimeError::InvalidInput {
      node_id: node.id.clone(),
      message: format!("expected at least {} argument(s), got {}", min, args.len()),
    });
  }
  if args.len() > max {
    return Err(RuntimeError::InvalidInput {
      node_id: node.id.clone(),
      message: format!("expected at most {} argument(s), got {}", max, args.len()),
    });
  }
  Ok(())
}
