use std::fmt;

use dcg_types::{Conversion, Value};

use crate::flow::FilterFn;

/// A resolved upstream -> downstream link.
#[derive(Clone)]
pub struct DcgEdge {
  /// Assigned in creation order.
  pub id: usize,
  pub source: String,
  pub target: String,
  /// Parameter position of `target` this edge fills.
  pub argindex: usize,
  pub filter_fn: Option<FilterFn>,
  pub type_conversion: Conversion,
}

impl DcgEdge {
  /// Whether `value` passes this edge's filter. Edges without a filter pass
  /// everything.
  pub fn filter(&self, value: &Value) -> bool {
    self.filter_fn.as_ref().is_none_or(|filter| filter(value))
  }
}

impl fmt::Debug for DcgEdge {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("DcgEdge")
      .field("id", &self.id)
      .field("source", &self.source)
      .field("target", &self.target)
      .field("argindex", &self.argindex)
      .field("filter_fn", &self.filter_fn.is_some())
      .field("type_conversion", &self.type_conversion)
      .finish()
  }
}

impl fmt::Display for DcgEdge {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}[{}]", self.target, self.argindex)?;
    if self.filter_fn.is_some() {
      f.write_str(" (filtered)")?;
    }
    Ok(())
  }
}

#[cfg(test)]
mod tests {
  use std::sync::Arc;

  use serde_json::json;

  use super::*;

  fn edge(filter_fn: Option<FilterFn>) -> DcgEdge {
    DcgEdge {
      id: 0,
      source: "a".to_string(),
      target: "b".to_string(),
      argindex: 1,
      filter_fn,
      type_conversion: Conversion::identity(),
    }
  }

  #[test]
  fn test_no_filter_passes_everything() {
    let e = edge(None);
    assert!(e.filter(&json!(-1)));
    assert!(e.filter(&Value::Null));
    assert_eq!(e.to_string(), "b[1]");
  }

  #[test]
  fn test_filter() {
    let e = edge(Some(Arc::new(|v: &Value| v.as_i64().is_some_and(|n| n > 0))));
    assert!(e.filter(&json!(5)));
    assert!(!e.filter(&json!(-3)));
    assert_eq!(e.to_string(), "b[1] (filtered)");
  }
}
