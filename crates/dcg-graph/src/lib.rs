//! DCG Graph
//!
//! Compiles an insertion-ordered map of compute functions and flows into an
//! immutable [`DirectedComputingGraph`]:
//! - generic parameter and return types are grounded from upstream producers
//! - each upstream link carries its resolved type conversion and filter
//! - each node knows which parameters come from upstream nodes and which from
//!   the execution context
//!
//! The graph is read-only once built and can be shared across executions.

mod compute;
mod edge;
mod error;
mod flow;
mod graph;
mod node;
mod options;
mod partial;

pub use compute::{BoundArg, ComputeFn, ComputeFuture, ComputeResult, Invocation};
pub use edge::DcgEdge;
pub use error::GraphError;
pub use flow::{FilterFn, Flow, FlowMap, FlowSpec, Sources};
pub use graph::DirectedComputingGraph;
pub use node::DcgNode;
pub use options::BuildOptions;
pub use partial::PartialFn;
pub use petgraph::graph::{EdgeIndex, NodeIndex};
