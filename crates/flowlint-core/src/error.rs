//! Error types for the flowlint analysis engine

use thiserror::Error;

/// Result type alias for flowlint operations
pub type Result<T> = std::result::Result<T, AnalysisError>;

/// Errors the engine can raise. Per the design, these are all structural:
/// an unsupported AST node or a malformed policy are fatal to the analysis
/// run, never recovered from mid-visit.
#[derive(Error, Debug)]
pub enum AnalysisError {
    #[error("unsupported AST node kind: {kind} at line {line}")]
    UnsupportedNode { kind: String, line: i64 },

    #[error("malformed policy: {message}")]
    PolicyError { message: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl AnalysisError {
    pub fn unsupported_node(kind: impl Into<String>, line: i64) -> Self {
        Self::UnsupportedNode {
            kind: kind.into(),
            line,
        }
    }

    pub fn policy_error(message: impl Into<String>) -> Self {
        Self::PolicyError {
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unsupported_node_formats_kind_and_line() {
        let err = AnalysisError::unsupported_node("Try", 12);
        assert_eq!(err.to_string(), "unsupported AST node kind: Try at line 12");
    }

    #[test]
    fn policy_error_formats_message() {
        let err = AnalysisError::policy_error("missing sinks");
        assert_eq!(err.to_string(), "malformed policy: missing sinks");
    }
}
