//! DCG Types
//!
//! This crate contains the type layer of the directed computing graph:
//! tagged type expressions, compute function signatures, generic type
//! alignment/grounding, and the conversion service that bridges a producer's
//! return type to a consumer's argument type.
//!
//! Nothing here knows about graphs. The graph builder (`dcg-graph`) uses these
//! pieces to ground generic signatures and resolve one conversion per edge.
//!
//! # Type expressions
//!
//! ```text
//! int                 concrete type
//! ~T                  type variable
//! list[~T]            parameterised type
//! dict[str, list[~T]] nested
//! any                 matches everything
//! ```

mod conversion;
mod error;
mod generic;
mod signature;
mod types;

pub use conversion::{
  ComposeFn, ComposeTypeConversion, Conversion, ConversionRule, TypeConversion,
  UnitTypeConversion,
};
pub use error::TypeError;
pub use generic::{Substitution, align_generic_type, ground_generic_type, is_generic_type};
pub use signature::{Param, Signature};
pub use types::TypeExpr;

/// Data flowing through the graph.
pub use serde_json::Value;
