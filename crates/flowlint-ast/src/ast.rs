//! The AST shapes the engine consumes
//!
//! The engine does not parse source text (that is an external
//! collaborator's job); it pattern-matches on an already-built tree. Each
//! variant below mirrors one of the node kinds in the external interface:
//! a tagged union keyed by `ast_type`, the encoding the design notes call
//! for ("encode nodes as a tagged variant; pattern-match in the transfer
//! function").
//!
//! Only the node kinds the engine actually transfers over are modelled.
//! Anything else deserializes into [`Expr::Unsupported`] /
//! [`Stmt::Unsupported`] and is rejected at the point the visitor first
//! reaches it (see `flowlint-dataflow::Visitor`), per the fatal
//! "unsupported AST kind" error in the error-handling design.

use serde::{Deserialize, Serialize};

/// An expression node.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "ast_type")]
pub enum Expr {
    Constant {
        #[serde(default)]
        lineno: i64,
    },
    Name {
        id: String,
        #[serde(default)]
        lineno: i64,
    },
    BinOp {
        left: Box<Expr>,
        #[serde(default)]
        op: String,
        right: Box<Expr>,
        #[serde(default)]
        lineno: i64,
    },
    UnaryOp {
        #[serde(default)]
        op: String,
        operand: Box<Expr>,
        #[serde(default)]
        lineno: i64,
    },
    BoolOp {
        #[serde(default)]
        op: String,
        values: Vec<Expr>,
        #[serde(default)]
        lineno: i64,
    },
    Compare {
        left: Box<Expr>,
        #[serde(default)]
        ops: Vec<String>,
        comparators: Vec<Expr>,
        #[serde(default)]
        lineno: i64,
    },
    Call {
        func: Box<Expr>,
        #[serde(default)]
        args: Vec<Expr>,
        #[serde(default)]
        keywords: Vec<Keyword>,
        #[serde(default)]
        lineno: i64,
    },
    Attribute {
        value: Box<Expr>,
        attr: String,
        #[serde(default)]
        lineno: i64,
    },
    /// Any node kind not covered above. Kept distinct from a parse error so
    /// the visitor can report the offending kind's name.
    #[serde(other)]
    Unsupported,
}

impl Expr {
    pub fn lineno(&self) -> i64 {
        match self {
            Expr::Constant { lineno }
            | Expr::Name { lineno, .. }
            | Expr::BinOp { lineno, .. }
            | Expr::UnaryOp { lineno, .. }
            | Expr::BoolOp { lineno, .. }
            | Expr::Compare { lineno, .. }
            | Expr::Call { lineno, .. }
            | Expr::Attribute { lineno, .. } => *lineno,
            Expr::Unsupported => 0,
        }
    }

    /// A human-readable tag for the unsupported-node error path.
    pub fn kind_name(&self) -> &'static str {
        match self {
            Expr::Constant { .. } => "Constant",
            Expr::Name { .. } => "Name",
            Expr::BinOp { .. } => "BinOp",
            Expr::UnaryOp { .. } => "UnaryOp",
            Expr::BoolOp { .. } => "BoolOp",
            Expr::Compare { .. } => "Compare",
            Expr::Call { .. } => "Call",
            Expr::Attribute { .. } => "Attribute",
            Expr::Unsupported => "Unsupported",
        }
    }
}

/// A keyword argument to a [`Expr::Call`], e.g. `f(x=1)`. `arg` is `None`
/// for a `**kwargs` splat.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Keyword {
    pub arg: Option<String>,
    pub value: Expr,
}

/// A statement node.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "ast_type")]
pub enum Stmt {
    Expr {
        value: Expr,
        #[serde(default)]
        lineno: i64,
    },
    Assign {
        targets: Vec<Expr>,
        value: Expr,
        #[serde(default)]
        lineno: i64,
    },
    AugAssign {
        target: Expr,
        #[serde(default)]
        op: String,
        value: Expr,
        #[serde(default)]
        lineno: i64,
    },
    If {
        test: Expr,
        body: Vec<Stmt>,
        #[serde(default)]
        orelse: Vec<Stmt>,
        #[serde(default)]
        lineno: i64,
    },
    While {
        test: Expr,
        body: Vec<Stmt>,
        #[serde(default)]
        orelse: Vec<Stmt>,
        #[serde(default)]
        lineno: i64,
    },
    For {
        target: Expr,
        iter: Expr,
        body: Vec<Stmt>,
        #[serde(default)]
        orelse: Vec<Stmt>,
        #[serde(default)]
        lineno: i64,
    },
    Match {
        subject: Expr,
        cases: Vec<MatchCase>,
        #[serde(default)]
        lineno: i64,
    },
    Break {
        #[serde(default)]
        lineno: i64,
    },
    Continue {
        #[serde(default)]
        lineno: i64,
    },
    #[serde(other)]
    Unsupported,
}

impl Stmt {
    pub fn kind_name(&self) -> &'static str {
        match self {
            Stmt::Expr { .. } => "Expr",
            Stmt::Assign { .. } => "Assign",
            Stmt::AugAssign { .. } => "AugAssign",
            Stmt::If { .. } => "If",
            Stmt::While { .. } => "While",
            Stmt::For { .. } => "For",
            Stmt::Match { .. } => "Match",
            Stmt::Break { .. } => "Break",
            Stmt::Continue { .. } => "Continue",
            Stmt::Unsupported => "Unsupported",
        }
    }

    pub fn lineno(&self) -> i64 {
        match self {
            Stmt::Expr { lineno, .. }
            | Stmt::Assign { lineno, .. }
            | Stmt::AugAssign { lineno, .. }
            | Stmt::If { lineno, .. }
            | Stmt::While { lineno, .. }
            | Stmt::For { lineno, .. }
            | Stmt::Match { lineno, .. }
            | Stmt::Break { lineno, .. }
            | Stmt::Continue { lineno, .. } => *lineno,
            Stmt::Unsupported => 0,
        }
    }
}

/// One arm of a `match` statement: `case <pattern> if <guard>: <body>`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MatchCase {
    pub pattern: MatchPattern,
    pub guard: Option<Expr>,
    pub body: Vec<Stmt>,
}

/// A `match` pattern. Only the two leaf pattern kinds the specification
/// lists are modelled: a literal value pattern and a singleton
/// (`True`/`False`/`None`) pattern. Both analyse like a bare expression —
/// they contribute no new binding, only a possible implicit source.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "ast_type")]
pub enum MatchPattern {
    MatchValue {
        value: Box<Expr>,
        #[serde(default)]
        lineno: i64,
    },
    MatchSingleton {
        #[serde(default)]
        lineno: i64,
    },
}
