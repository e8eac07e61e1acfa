//! The taint lattice and transfer-function engine (§3, §4 of the design).
//!
//! `Label` -> `MultiLabel` -> `MultiLabelling`/`Vulnerabilities` form the
//! lattice; `Visitor` walks an already-parsed AST applying the transfer
//! function for each node kind, forking and conciliating state across
//! branches and loops.

pub mod label;
pub mod multilabel;
pub mod multilabelling;
pub mod policy_queries;
pub mod report;
pub mod vulnerabilities;
pub mod visitor;

pub use label::Label;
pub use multilabel::MultiLabel;
pub use multilabelling::MultiLabelling;
pub use policy_queries::{illegal_flows_multilabel, implicit_patterns_multilabel};
pub use report::{to_report, VulnerabilityRecord};
pub use vulnerabilities::Vulnerabilities;
pub use visitor::Visitor;
