//! flowlint — static information-flow analysis engine
//!
//! This crate is a thin facade over the workspace members: the AST and
//! policy data model, the taint-lattice dataflow engine, and the shared
//! error type. The engine itself lives in `flowlint-dataflow`.

pub use flowlint_core as core;
pub use flowlint_ast as ast;
pub use flowlint_policy as policy;
pub use flowlint_dataflow as dataflow;

pub use flowlint_core::{AnalysisError, Result};
pub use flowlint_ast::{Expr, Node, Stmt};
pub use flowlint_policy::{Pattern, Policy};
pub use flowlint_dataflow::{Label, MultiLabel, MultiLabelling, Visitor, Vulnerabilities};
