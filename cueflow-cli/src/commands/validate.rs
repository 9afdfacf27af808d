//! Validate command - check a node graph file without running it.

use super::session::read;
use anyhow::{Result, bail};
use cueflow_graph::{GraphLimits, GraphValidator, Severity, ValidationReport};
use std::path::Path;

/// Validate source text against default limits.
pub fn check(source: &str, functions: &[String]) -> ValidationReport {
    let validator =
        GraphValidator::with_limits(GraphLimits::default()).with_functions(functions.iter().cloned());
    let (graph, report) = validator.validate_source(source);
    if let Some(graph) = graph {
        tracing::debug!(
            nodes = graph.nodes.len(),
            edges = graph.edges.len(),
            findings = report.findings.len(),
            "Graph validated"
        );
    }
    report
}

/// Run the validate command. With `strict`, warnings fail too.
pub fn run(file: &Path, functions: &[String], strict: bool) -> Result<()> {
    let source = read(file)?;
    let title = format!("Validation Results for: {}", file.display());
    tracing::info!(file = %file.display(), "Validating graph");

    println!("{}", title);
    println!("{}", "=".repeat(title.len()));
    println!();

    let report = check(&source, functions);
    for finding in &report.findings {
        let marker = match finding.severity {
            Severity::Error => "✗",
            Severity::Warning => "⚠",
        };
        println!("{} {}", marker, finding);
    }
    if !report.findings.is_empty() {
        println!();
    }

    let errors = report.errors().count();
    let warnings = report.warnings().count();
    println!("{}", "=".repeat(title.len()));

    if errors > 0 {
        println!("✗ Validation FAILED ({} error(s), {} warning(s))", errors, warnings);
        bail!("Graph validation failed");
    }
    if warnings > 0 {
        println!("⚠ Validation passed with {} warning(s)", warnings);
        if strict {
            bail!("Graph has warnings");
        }
    } else {
        println!("✓ Validation PASSED");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use cueflow_graph::FindingKind;
    use std::io::Write;

    const GRAPH: &str = r#"
nodes:
  - { id: start, type: event, data: { eventType: click } }
  - { id: refresh, type: action, data: { actionType: callFunction, name: refreshScores } }
edges:
  - { source: start, target: refresh }
"#;

    #[test]
    fn registered_functions_silence_warnings() {
        assert!(check(GRAPH, &[]).has(FindingKind::UnknownFunction));
        assert!(check(GRAPH, &["refreshScores".to_string()]).findings.is_empty());
    }

    #[test]
    fn strict_mode_fails_on_warnings() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(GRAPH.as_bytes()).unwrap();

        assert!(run(file.path(), &[], false).is_ok());
        assert!(run(file.path(), &[], true).is_err());
        assert!(run(file.path(), &["refreshScores".to_string()], true).is_ok());
    }

    #[test]
    fn errors_fail_validation() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(b"nodes:\n  - { id: a, type: event, data: { eventType: x } }\nedges:\n  - { source: a, target: b }\n")
            .unwrap();
        assert!(run(file.path(), &[], false).is_err());
    }
}
