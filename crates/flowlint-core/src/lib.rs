//! Core types shared across the flowlint analysis engine
//!
//! This crate provides the error type and a handful of constants used
//! throughout the rest of the workspace.

pub mod constants;
pub mod error;

pub use constants::MAX_LOOP_ITERATIONS;
pub use error::{AnalysisError, Result};
