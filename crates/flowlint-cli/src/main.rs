//! `flowlint <ast.json> <policy.json>` — run the taint analysis engine
//! over an already-parsed AST and print the vulnerability report.

use anyhow::{Context, Result};
use clap::Parser;
use flowlint_ast::Stmt;
use flowlint_dataflow::Visitor;
use flowlint_policy::Policy;
use std::path::PathBuf;
use tracing::info;

/// A static information-flow analyzer for an already-parsed AST.
#[derive(Parser)]
#[command(name = "flowlint")]
#[command(about = "Static taint analysis over an AST given a vulnerability policy")]
#[command(version)]
struct Cli {
    /// Path to the AST JSON tree (§6 node shapes)
    ast_path: PathBuf,

    /// Path to the policy JSON array (§6 pattern shape)
    policy_path: PathBuf,

    /// Enable verbose (debug-level) logging
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let ast_json = std::fs::read_to_string(&cli.ast_path)
        .with_context(|| format!("reading AST file {}", cli.ast_path.display()))?;
    let policy_json = std::fs::read_to_string(&cli.policy_path)
        .with_context(|| format!("reading policy file {}", cli.policy_path.display()))?;

    let program: Vec<Stmt> = serde_json::from_str(&ast_json).context("parsing AST JSON")?;
    let policy_value: serde_json::Value = serde_json::from_str(&policy_json).context("parsing policy JSON")?;
    let policy = Policy::from_json(&policy_value)?;

    info!(statements = program.len(), patterns = policy.patterns().len(), "starting analysis");

    let mut visitor = Visitor::new(&policy);
    visitor.run(&program)?;

    let report = flowlint_dataflow::to_report(visitor.vulnerabilities());
    info!(findings = report.len(), "analysis complete");

    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}

fn init_tracing(verbose: bool) {
    let level = if verbose { "debug" } else { "info" };
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(level));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn end_to_end_direct_source_to_sink() {
        let mut ast_file = tempfile::NamedTempFile::new().unwrap();
        write!(
            ast_file,
            r#"[{{"ast_type":"Expr","lineno":1,"value":{{"ast_type":"Call","lineno":1,
            "func":{{"ast_type":"Name","id":"sink","lineno":1}},
            "args":[{{"ast_type":"Name","id":"a","lineno":1}}],"keywords":[]}}}}]"#
        )
        .unwrap();

        let mut policy_file = tempfile::NamedTempFile::new().unwrap();
        write!(
            policy_file,
            r#"[{{"vulnerability":"v","sources":["a"],"sanitizers":[],"sinks":["sink"],"implicit":"no"}}]"#
        )
        .unwrap();

        let ast_json = std::fs::read_to_string(ast_file.path()).unwrap();
        let policy_json = std::fs::read_to_string(policy_file.path()).unwrap();
        let program: Vec<Stmt> = serde_json::from_str(&ast_json).unwrap();
        let policy = Policy::from_json(&serde_json::from_str(&policy_json).unwrap()).unwrap();

        let mut visitor = Visitor::new(&policy);
        visitor.run(&program).unwrap();
        let report = flowlint_dataflow::to_report(visitor.vulnerabilities());
        assert_eq!(report.len(), 1);
        assert_eq!(report[0].vulnerability, "v_1");
    }
}
