//! DCG Runtime
//!
//! Executes a compiled [`DirectedComputingGraph`](dcg_graph::DirectedComputingGraph).
//!
//! # Architecture
//!
//! ```text
//! Runtime
//! ├── execute(input, output, context)        - sync compute functions only
//! └── execute_async(input, output, context)  - sync and async compute functions
//!
//! Execution (one per call)
//! ├── NodeRuntime per node - task buffers keyed by TaskKey + context arguments
//! └── LIFO work stack      - a node runs once every slot of a task is filled
//! ```
//!
//! # Usage
//!
//! ```ignore
//! use dcg_runtime::{Context, Runtime};
//!
//! let runtime = Runtime::new(graph);
//! let outputs = runtime.execute(
//!   [("input1", vec![json!(5)]), ("input2", vec![json!(3)])],
//!   ["multiply"],
//!   Context::new().with("factor", json!(2)),
//! )?;
//! ```

mod context;
mod error;
mod execution;
mod node_runtime;
mod runtime;
mod task;
mod value;

pub use context::Context;
pub use error::RuntimeError;
pub use runtime::Runtime;
pub use task::{TaskArgs, TaskKey};
pub use value::ArgValue;
