//! Execution context.
//!
//! Parameters of a node that are not fed by upstream nodes are looked up by
//! name in the context of the call, falling back to the parameter's default.

use std::collections::HashMap;
use std::fmt;

use dcg_types::Value;
use indexmap::IndexMap;

use crate::error::RuntimeError;

type LazyFn = Box<dyn FnOnce() -> anyhow::Result<Value> + Send>;
type ProviderFn = Box<dyn FnOnce() -> anyhow::Result<HashMap<String, Value>> + Send>;

enum Entry {
  Value(Value),
  Lazy(LazyFn),
}

/// Named values available to every node of one execution.
///
/// Built from plain values, lazily computed values, or a provider that
/// produces the whole mapping. Each lazy value and the provider is invoked
/// exactly once, when the execution starts. Entries added with
/// [`with`](Self::with) or [`with_lazy`](Self::with_lazy) take precedence
/// over the provider's.
#[derive(Default)]
pub struct Context {
  entries: IndexMap<String, Entry>,
  provider: Option<ProviderFn>,
}

impl Context {
  /// An empty context.
  pub fn new() -> Self {
    Self::default()
  }

  /// A context produced by `provider`.
  pub fn from_fn<F, M>(provider: F) -> Self
  where
    F: FnOnce() -> anyhow::Result<M> + Send + 'static,
    M: IntoIterator<Item = (String, Value)>,
  {
    Self {
      entries: IndexMap::new(),
      provider: Some(Box::new(move || {
        provider().map(|values| values.into_iter().collect())
      })),
    }
  }

  pub fn with(mut self, name: impl Into<String>, value: Value) -> Self {
    self.entries.insert(name.into(), Entry::Value(value));
    self
  }

  /// Add a value computed when the execution starts.
  pub fn with_lazy<F>(mut self, name: impl Into<String>, value: F) -> Self
  where
    F: FnOnce() -> anyhow::Result<Value> + Send + 'static,
  {
    self.entries.insert(name.into(), Entry::Lazy(Box::new(value)));
    self
  }

  pub fn is_empty(&self) -> bool {
    self.entries.is_empty() && self.provider.is_none()
  }

  /// Invoke the provider and every lazy value.
  ///
  /// # Errors
  /// `RuntimeError::Context` with the first failure.
  pub(crate) fn resolve(self) -> Result<HashMap<String, Value>, RuntimeError> {
    let mut values = match self.provider {
      Some(provider) => provider().map_err(|source| RuntimeError::Context { source })?,
      None => HashMap::with_capacity(self.entries.len()),
    };

    for (name, entry) in self.entries {
      let value = match entry {
        Entry::Value(value) => value,
        Entry::Lazy(lazy) => lazy().map_err(|source| RuntimeError::Context {
          source: source.context(format!("context value '{}'", name)),
        })?,
      };
      values.insert(name, value);
    }
    Ok(values)
  }
}

impl From<HashMap<String, Value>> for Context {
  fn from(values: HashMap<String, Value>) -> Self {
    values
      .into_iter()
      .fold(Self::new(), |context, (name, value)| context.with(name, value))
  }
}

impl From<serde_json::Map<String, Value>> for Context {
  fn from(values: serde_json::Map<String, Value>) -> Self {
    values
      .into_iter()
      .fold(Self::new(), |context, (name, value)| context.with(name, value))
  }
}

impl fmt::Debug for Context {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("Context")
      .field("names", &self.entries.keys().collect::<Vec<_>>())
      .field("provider", &self.provider.is_some())
      .finish()
  }
}
