//! Result Rendering
//!
//! Pure functions of a [`ValidationResult`]; nothing here holds state.

use serde::{Deserialize, Serialize};
use std::fmt::Write;

use crate::result::{ValidationIssue, ValidationResult};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// One line per issue with path, message and suggestion.
    #[default]
    Detailed,
    /// Counts only.
    Summary,
    /// The raw result structure.
    Json,
}

pub fn render(result: &ValidationResult, format: OutputFormat) -> Result<String, serde_json::Error> {
    match format {
        OutputFormat::Detailed => Ok(render_detailed(result)),
        OutputFormat::Summary => Ok(render_summary(result)),
        OutputFormat::Json => serde_json::to_string_pretty(result),
    }
}

fn render_detailed(result: &ValidationResult) -> String {
    let mut out = String::new();
    let verdict = if result.valid { "VALID" } else { "INVALID" };
    let _ = writeln!(
        out,
        "{} {} (score {}/100, target {})",
        verdict, result.metadata.subject_type, result.score, result.metadata.target_version
    );
    for issue in result.issues() {
        let _ = writeln!(out, "  {}", issue_line(issue));
    }
    out.push_str(&render_summary(result));
    out
}

fn issue_line(issue: &ValidationIssue) -> String {
    let detail = issue.detail();
    let mut line = format!("{:<7} [{}]", issue.level(), detail.code);
    if let Some(severity) = detail.severity {
        let _ = write!(line, " ({})", severity);
    }
    if let Some(path) = &detail.path {
        let _ = write!(line, " {}:", path);
    }
    let _ = write!(line, " {}", detail.message);
    if detail.promoted {
        line.push_str(" [strict]");
    }
    if let Some(suggestion) = &detail.suggestion {
        let _ = write!(line, " -> {}", suggestion);
    }
    line
}

fn render_summary(result: &ValidationResult) -> String {
    format!(
        "valid={} score={} errors={} warnings={} info={} checks={}/{}\n",
        result.valid,
        result.score,
        result.errors.len(),
        result.warnings.len(),
        result.info.len(),
        result.metadata.passed_checks,
        result.metadata.total_checks,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::ValidationOptions;
    use crate::engine::Engine;
    use serde_json::json;

    fn invalid_result() -> ValidationResult {
        Engine::with_builtin()
            .unwrap()
            .validate_value(
                json!({
                    "apiVersion": "ossa/v0.3.0",
                    "kind": "Agent",
                    "metadata": {"name": "Demo_Agent", "version": "1.0.0"},
                    "spec": {"role": "assistant"}
                }),
                ValidationOptions::default(),
            )
            .unwrap()
    }

    #[test]
    fn test_detailed_lists_every_issue() {
        let result = invalid_result();
        let text = render(&result, OutputFormat::Detailed).unwrap();
        assert!(text.starts_with("INVALID manifest-structural (score 86/100, target v0.3.0)"));
        assert!(text.contains(
            "error   [metadata-name] (high) /metadata/name: Invalid metadata.name: Demo_Agent -> Try demo-agent"
        ));
        assert_eq!(text.lines().count(), 1 + result.issues().count() + 1);
    }

    #[test]
    fn test_summary_counts() {
        let text = render(&invalid_result(), OutputFormat::Summary).unwrap();
        assert_eq!(text, "valid=false score=86 errors=1 warnings=0 info=2 checks=6/7\n");
    }

    #[test]
    fn test_json_round_trips() {
        let result = invalid_result();
        let text = render(&result, OutputFormat::Json).unwrap();
        let back: ValidationResult = serde_json::from_str(&text).unwrap();
        assert_eq!(back, result);
    }
}
