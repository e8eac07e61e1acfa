//! AST node and identifier-occurrence types for the flowlint engine
//!
//! This crate defines the tree shape the dataflow engine walks
//! ([`Expr`]/[`Stmt`]) and the identifier-occurrence type the taint
//! lattice is built out of ([`Node`]). It contains no analysis logic.

pub mod ast;
pub mod node;

pub use ast::{Expr, Keyword, MatchCase, MatchPattern, Stmt};
pub use node::Node;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deserializes_a_direct_call() {
        let json = r#"
        {
            "ast_type": "Expr",
            "lineno": 1,
            "value": {
                "ast_type": "Call",
                "lineno": 1,
                "func": {"ast_type": "Name", "id": "sink", "lineno": 1},
                "args": [{"ast_type": "Name", "id": "a", "lineno": 1}],
                "keywords": []
            }
        }"#;
        let stmt: Stmt = serde_json::from_str(json).unwrap();
        match stmt {
            Stmt::Expr { value: Expr::Call { args, .. }, .. } => {
                assert_eq!(args.len(), 1);
            }
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[test]
    fn unknown_node_kind_is_unsupported() {
        let json = r#"{"ast_type": "Lambda", "lineno": 1}"#;
        let expr: Expr = serde_json::from_str(json).unwrap();
        assert!(matches!(expr, Expr::Unsupported));
    }
}
