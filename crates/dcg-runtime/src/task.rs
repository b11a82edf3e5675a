use std::fmt;

use dcg_types::Value;

use crate::value::ArgValue;

/// Identity of one in-flight execution instance of a node.
///
/// Values produced under a key flow downstream under the same key, so all
/// arguments of one downstream task stem from the same seed.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TaskKey(Vec<u64>);

impl TaskKey {
  /// The key every seed is registered under: `(0,)`.
  pub fn root() -> Self {
    Self(vec![0])
  }

  pub fn as_slice(&self) -> &[u64] {
    &self.0
  }
}

impl fmt::Display for TaskKey {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str("(")?;
    for part in &self.0 {
      write!(f, "{},", part)?;
    }
    f.write_str(")")
  }
}

/// Argument slots of one task.
#[derive(Debug, Clone, PartialEq)]
pub struct TaskArgs(Vec<ArgValue>);

impl TaskArgs {
  /// `slots` empty slots.
  pub fn unset(slots: usize) -> Self {
    Self(vec![ArgValue::Unset; slots])
  }

  /// Slots filled with seed values.
  pub fn seeded(values: Vec<Value>) -> Self {
    Self(values.into_iter().map(ArgValue::Data).collect())
  }

  pub fn len(&self) -> usize {
    self.0.len()
  }

  pub fn is_empty(&self) -> bool {
    self.0.is_empty()
  }

  /// Set one slot. Returns false if `slot` is out of range.
  pub fn set(&mut self, slot: usize, value: ArgValue) -> bool {
    match self.0.get_mut(slot) {
      Some(current) => {
        *current = value;
        true
      }
      None => false,
    }
  }

  /// No slot is waiting for a value.
  pub fn is_ready(&self) -> bool {
    self.0.iter().all(|arg| !arg.is_unset())
  }

  /// Some slot carries a skip.
  pub fn has_skip(&self) -> bool {
    self.0.iter().any(ArgValue::is_skip)
  }

  pub fn iter(&self) -> impl Iterator<Item = &ArgValue> {
    self.0.iter()
  }

  pub fn into_inner(self) -> Vec<ArgValue> {
    self.0
  }
}

#[cfg(test)]
mod tests {
  use serde_json::json;

  use super::*;

  #[test]
  fn test_root_key() {
    assert_eq!(TaskKey::root().as_slice(), &[0]);
    assert_eq!(TaskKey::root().to_string(), "(0,)");
  }

  #[test]
  fn test_ready_once_every_slot_is_set() {
    let mut args = TaskArgs::unset(2);
    assert!(!args.is_ready());
    assert!(args.set(1, ArgValue::Skip));
    assert!(!args.is_ready());
    assert!(args.set(0, ArgValue::Data(json!(null))));
    assert!(args.is_ready());
    assert!(args.has_skip());
    assert!(!args.set(2, ArgValue::Skip));
  }

  #[test]
  fn test_null_is_data() {
    let args = TaskArgs::seeded(vec![json!(null)]);
    assert!(args.is_ready());
    assert!(!args.has_skip());
  }

  #[test]
  fn test_no_slots_is_ready() {
    assert!(TaskArgs::unset(0).is_ready());
  }
}
