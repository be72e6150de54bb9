//!
//! # auto-value
//!
//! Reverse-mode automatic differentiation over scalar values.
//!
//! A [`Graph`] is an arena that records one node per operation as values are
//! combined; [`Value`] is a copyable handle into it. Calling
//! [`Value::backward`] on any value walks the recorded DAG from that root and
//! leaves `d(root)/d(node)` in every node it depends on.
//!
//! ```
//! use auto_value::Graph;
//!
//! let graph = Graph::new();
//! let a = graph.var(2.0);
//! let b = graph.var(-3.0);
//! let c = graph.var(10.0);
//! let d = a * b + c;
//! let loss = d * -2.0;
//! loss.backward();
//! assert_eq!(loss.value(), -8.0);
//! assert_eq!(a.grad(), 6.0);
//! assert_eq!(b.grad(), -4.0);
//! ```
//!
//! ## Invariants
//!
//! - Nodes are append-only and only reference earlier nodes, so the graph is
//!   always acyclic
//! - Forward values never change after construction; gradients are the only
//!   mutable state
//! - Gradients accumulate across backward passes, use [`Graph::zero_grad`] or a
//!   fresh graph between independent passes
//!

mod dot;
pub mod error;
mod graph;
mod op;
mod value;

pub use error::{Error, Result};
pub use graph::{Graph, NodeIndex};
pub use op::Op;
pub use value::{IntoValue, Value};
