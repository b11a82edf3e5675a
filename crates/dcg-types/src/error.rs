//! Type layer errors.

use thiserror::Error;

use crate::types::TypeExpr;

/// Errors raised while parsing, aligning, grounding or converting types.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum TypeError {
  /// No identity, unit, chained or composed conversion exists.
  #[error("don't know how to convert `{from}` to `{to}`")]
  UnknownConversion { from: TypeExpr, to: TypeExpr },

  /// The generic type does not have the shape of the concrete type.
  #[error("cannot align `{generic}` with `{concrete}`")]
  ShapeMismatch {
    generic: TypeExpr,
    concrete: TypeExpr,
  },

  /// A type variable would have to stand for two different types.
  #[error("type variable `~{var}` bound to both `{first}` and `{second}`")]
  ConflictingBinding {
    var: String,
    first: TypeExpr,
    second: TypeExpr,
  },

  /// A type variable has no binding in the substitution.
  #[error("type variable `~{var}` is not bound")]
  UnboundVariable { var: String },

  /// A compose conversion pattern is not lifting exactly one variable.
  #[error(
    "compose conversion `{source_pattern} -> {target_pattern}` must have exactly one type variable on each side"
  )]
  InvalidCompose {
    source_pattern: TypeExpr,
    target_pattern: TypeExpr,
  },

  /// The textual form of a type could not be parsed.
  #[error("invalid type expression `{input}`: {message}")]
  Parse { input: String, message: String },
}
