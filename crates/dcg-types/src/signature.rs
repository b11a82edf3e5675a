//! Compute function signatures.

use std::collections::HashMap;

use serde::{Deserialize, Deserializer, Serialize};

use crate::Value;
use crate::types::TypeExpr;

/// A single formal parameter of a compute function.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Param {
  pub name: String,
  #[serde(rename = "type")]
  pub ty: TypeExpr,
  /// Default used when the parameter is filled from context and the context
  /// has no value for it. `Some(Value::Null)` is a real default.
  #[serde(
    default,
    deserialize_with = "present",
    skip_serializing_if = "Option::is_none"
  )]
  pub default: Option<Value>,
}

/// Ordered parameters plus the declared return type.
///
/// ```ignore
/// let sig = Signature::new()
///   .arg("x", TypeExpr::int())
///   .arg_with_default("factor", TypeExpr::int(), json!(2))
///   .returns(TypeExpr::int());
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Signature {
  #[serde(default)]
  pub params: Vec<Param>,
  #[serde(rename = "returns", default = "any")]
  pub return_type: TypeExpr,
}

fn any() -> TypeExpr {
  TypeExpr::Any
}

fn present<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<Value>, D::Error> {
  Value::deserialize(deserializer).map(Some)
}

impl Default for Signature {
  fn default() -> Self {
    Self::new()
  }
}

impl Signature {
  /// An empty signature returning `any`.
  pub fn new() -> Self {
    Self {
      params: Vec::new(),
      return_type: TypeExpr::Any,
    }
  }

  /// Append a parameter without a default.
  pub fn arg(mut self, name: impl Into<String>, ty: TypeExpr) -> Self {
    self.params.push(Param {
      name: name.into(),
      ty,
      default: None,
    });
    self
  }

  /// Append a parameter with a default value.
  pub fn arg_with_default(mut self, name: impl Into<String>, ty: TypeExpr, default: Value) -> Self {
    self.params.push(Param {
      name: name.into(),
      ty,
      default: Some(default),
    });
    self
  }

  /// Set the return type.
  pub fn returns(mut self, ty: TypeExpr) -> Self {
    self.return_type = ty;
    self
  }

  pub fn len(&self) -> usize {
    self.params.len()
  }

  pub fn is_empty(&self) -> bool {
    self.params.is_empty()
  }

  pub fn argnames(&self) -> Vec<&str> {
    self.params.iter().map(|p| p.name.as_str()).collect()
  }

  pub fn argtypes(&self) -> Vec<&TypeExpr> {
    self.params.iter().map(|p| &p.ty).collect()
  }

  /// Parameters that declare a default, keyed by name.
  pub fn default_args(&self) -> HashMap<&str, &Value> {
    self
      .params
      .iter()
      .filter_map(|p| p.default.as_ref().map(|d| (p.name.as_str(), d)))
      .collect()
  }

  /// Position of a parameter by name.
  pub fn position(&self, name: &str) -> Option<usize> {
    self.params.iter().position(|p| p.name == name)
  }

  /// True if any parameter or the return type contains a type variable.
  pub fn is_generic(&self) -> bool {
    self.return_type.is_generic() || self.params.iter().any(|p| p.ty.is_generic())
  }
}
