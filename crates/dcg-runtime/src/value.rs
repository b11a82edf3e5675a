use dcg_types::Value;

/// The content of one argument slot.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum ArgValue {
  /// A value delivered by an upstream node or a seed.
  Data(Value),
  /// Still waiting for the upstream value.
  #[default]
  Unset,
  /// The upstream value was suppressed by a filter or an upstream skip.
  Skip,
}

impl ArgValue {
  pub fn is_unset(&self) -> bool {
    matches!(self, Self::Unset)
  }

  pub fn is_skip(&self) -> bool {
    matches!(self, Self::Skip)
  }

  pub fn into_data(self) -> Option<Value> {
    match self {
      Self::Data(value) => Some(value),
      Self::Unset | Self::Skip => None,
    }
  }
}

impl From<Value> for ArgValue {
  fn from(value: Value) -> Self {
    Self::Data(value)
  }
}
