use std::collections::HashMap;

use dcg_graph::DcgNode;
use dcg_types::Value;
use indexmap::IndexMap;

use crate::error::RuntimeError;
use crate::task::{TaskArgs, TaskKey};
use crate::value::ArgValue;

/// Per-call state of one node: buffered tasks and the context arguments.
#[derive(Debug)]
pub(crate) struct NodeRuntime {
  in_degree: usize,
  /// Trailing arguments taken from the context, in parameter order.
  context: Vec<Value>,
  tasks: IndexMap<TaskKey, TaskArgs>,
}

impl NodeRuntime {
  /// Resolve the context arguments of `node`, leaving out the first
  /// `consumed` context parameters (supplied by a seed instead).
  pub(crate) fn new(
    node: &DcgNode,
    context: &HashMap<String, Value>,
    consumed: usize,
  ) -> Result<Self, RuntimeError> {
    let context = node
      .required_context
      .iter()
      .skip(consumed)
      .map(|name| {
        context
          .get(name)
          .or_else(|| node.required_context_defaults.get(name))
          .cloned()
          .ok_or_else(|| RuntimeError::MissingContext {
            node_id: node.id.clone(),
            name: name.clone(),
          })
      })
      .collect::<Result<Vec<_>, _>>()?;

    Ok(Self {
      in_degree: node.in_degree(),
      context,
      tasks: IndexMap::new(),
    })
  }

  /// Register a task with all its arguments, replacing any task under `key`.
  pub(crate) fn add_task(&mut self, key: TaskKey, args: TaskArgs) {
    self.tasks.insert(key, args);
  }

  /// Fill one slot of the task under `key`, creating the task on first touch.
  pub(crate) fn add_task_arg(
    &mut self,
    node_id: &str,
    key: TaskKey,
    slot: usize,
    value: ArgValue,
  ) -> Result<(), RuntimeError> {
    let in_degree = self.in_degree;
    let task = self
      .tasks
      .entry(key)
      .or_insert_with(|| TaskArgs::unset(in_degree));
    if !task.set(slot, value) {
      return Err(RuntimeError::SlotOutOfRange {
        node_id: node_id.to_string(),
        slot,
        slots: task.len(),
      });
    }
    Ok(())
  }

  /// Some buffered task has every slot filled.
  pub(crate) fn has_enough_data(&self) -> bool {
    self.tasks.values().any(TaskArgs::is_ready)
  }

  /// Remove and return the ready tasks in insertion order.
  pub(crate) fn take_ready(&mut self) -> Vec<(TaskKey, TaskArgs)> {
    let (ready, pending): (IndexMap<_, _>, IndexMap<_, _>) = std::mem::take(&mut self.tasks)
      .into_iter()
      .partition(|(_, args)| args.is_ready());
    self.tasks = pending;
    ready.into_iter().collect()
  }

  /// Build the positional call arguments: converted task arguments followed
  /// by the context arguments. `None` when the task carries a skip.
  pub(crate) fn call_args(
    &self,
    node: &DcgNode,
    args: TaskArgs,
  ) -> Result<Option<Vec<Value>>, RuntimeError> {
    if args.has_skip() {
      return Ok(None);
    }

    let mut values = Vec::with_capacity(args.len() + self.context.len());
    for (argindex, arg) in args.into_inner().into_iter().enumerate() {
      let Some(value) = arg.into_data() else {
        continue;
      };
      let value = node
        .convert_arg(argindex, value)
        .map_err(|source| RuntimeError::Conversion {
          node_id: node.id.clone(),
          argindex,
          source,
        })?;
      values.push(value);
    }
    values.extend(self.context.iter().cloned());
    Ok(Some(values))
  }
}
