//! Directed Computing Graph
//!
//! Declare compute functions and how they feed each other, compile them once
//! into a typed graph, then run the graph as often as needed.
//!
//! ```ignore
//! use dcg::{BuildOptions, Context, DirectedComputingGraph, Flow, FlowSpec, Runtime, TypeConversion};
//!
//! let graph = DirectedComputingGraph::from_flows(
//!   [
//!     ("input1", FlowSpec::from(identity.clone())),
//!     ("input2", identity.into()),
//!     ("add", Flow::new(["input1", "input2"], add).into()),
//!     ("multiply", Flow::new("add", multiply).into()),
//!   ],
//!   TypeConversion::default(),
//!   BuildOptions::default(),
//! )?;
//!
//! let outputs = Runtime::new(graph).execute(
//!   [("input1", vec![json!(5)]), ("input2", vec![json!(3)])],
//!   ["multiply"],
//!   Context::new().with("factor", json!(2)),
//! )?;
//! assert_eq!(outputs["multiply"], vec![json!(16)]);
//! ```
//!
//! Crates:
//! - `dcg-types` - type expressions, signatures, generic grounding, conversions
//! - `dcg-graph` - compute functions, flows and the graph builder
//! - `dcg-runtime` - sync and async execution

pub use dcg_graph::{
  BoundArg, BuildOptions, ComputeFn, ComputeFuture, ComputeResult, DcgEdge, DcgNode,
  DirectedComputingGraph, FilterFn, Flow, FlowMap, FlowSpec, GraphError, Invocation, PartialFn,
  Sources,
};
pub use dcg_runtime::{ArgValue, Context, Runtime, RuntimeError, TaskArgs, TaskKey};
pub use dcg_types::{
  ComposeTypeConversion, Conversion, ConversionRule, Param, Signature, TypeConversion, TypeError,
  TypeExpr, UnitTypeConversion, Value,
};
