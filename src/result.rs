//! Issues and Results
//!
//! Validators accumulate [`PartialResult`]s; the engine folds them into one
//! [`ValidationResult`] per run.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::context::SubjectType;
use crate::engine::RunState;
use crate::hashing::compute_digest;
use crate::rules::{RuleOutcome, Severity};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct IssueDetail {
    pub code: String,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub severity: Option<Severity>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub suggestion: Option<String>,
    /// Set when strict mode turned a warning into this error.
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub promoted: bool,
}

impl IssueDetail {
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
            path: None,
            severity: None,
            suggestion: None,
            promoted: false,
        }
    }

    pub fn at(mut self, path: impl Into<String>) -> Self {
        self.path = Some(path.into());
        self
    }

    pub fn with_severity(mut self, severity: Severity) -> Self {
        self.severity = Some(severity);
        self
    }

    pub fn suggest(mut self, suggestion: impl Into<String>) -> Self {
        self.suggestion = Some(suggestion.into());
        self
    }

    fn from_outcome(code: &str, severity: Severity, outcome: RuleOutcome) -> Self {
        Self {
            code: code.to_string(),
            message: outcome
                .message
                .unwrap_or_else(|| format!("Rule {} failed", code)),
            path: outcome.path,
            severity: Some(severity),
            suggestion: outcome.suggestion,
            promoted: false,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "level", rename_all = "snake_case")]
pub enum ValidationIssue {
    Error(IssueDetail),
    Warning(IssueDetail),
    Info(IssueDetail),
}

impl ValidationIssue {
    pub fn detail(&self) -> &IssueDetail {
        match self {
            Self::Error(d) | Self::Warning(d) | Self::Info(d) => d,
        }
    }

    pub fn level(&self) -> &'static str {
        match self {
            Self::Error(_) => "error",
            Self::Warning(_) => "warning",
            Self::Info(_) => "info",
        }
    }

    pub fn code(&self) -> &str {
        &self.detail().code
    }

    pub fn path(&self) -> Option<&str> {
        self.detail().path.as_deref()
    }

    pub fn is_error(&self) -> bool {
        matches!(self, Self::Error(_))
    }
}

/// Issues and check counts gathered by one validator.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct PartialResult {
    pub errors: Vec<ValidationIssue>,
    pub warnings: Vec<ValidationIssue>,
    pub info: Vec<ValidationIssue>,
    pub total_checks: u32,
    pub passed_checks: u32,
    /// The run cannot continue past this result.
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub fatal: bool,
}

impl PartialResult {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn valid(&self) -> bool {
        self.errors.is_empty()
    }

    /// Count one check and file its outcome. Failed mandatory checks become
    /// errors, failed optional checks become warnings.
    pub fn record(&mut self, code: &str, severity: Severity, mandatory: bool, outcome: RuleOutcome) {
        self.total_checks += 1;
        if outcome.passed {
            self.passed_checks += 1;
            return;
        }
        let detail = IssueDetail::from_outcome(code, severity, outcome);
        if mandatory {
            self.errors.push(ValidationIssue::Error(detail));
        } else {
            self.warnings.push(ValidationIssue::Warning(detail));
        }
    }

    pub fn warning(&mut self, detail: IssueDetail) {
        self.warnings.push(ValidationIssue::Warning(detail));
    }

    pub fn note(&mut self, detail: IssueDetail) {
        self.info.push(ValidationIssue::Info(detail));
    }

    /// Append `other` after the issues already collected.
    pub fn absorb(&mut self, other: PartialResult) {
        self.errors.extend(other.errors);
        self.warnings.extend(other.warnings);
        self.info.extend(other.info);
        self.total_checks += other.total_checks;
        self.passed_checks += other.passed_checks;
        self.fatal |= other.fatal;
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ResultMetadata {
    pub validator_version: String,
    pub target_version: String,
    pub timestamp: DateTime<Utc>,
    pub subject_type: SubjectType,
    pub total_checks: u32,
    pub passed_checks: u32,
    pub state: RunState,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subject_digest: Option<String>,
}

/// Terminal output of one validation run.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ValidationResult {
    pub valid: bool,
    pub score: u8,
    pub errors: Vec<ValidationIssue>,
    pub warnings: Vec<ValidationIssue>,
    pub info: Vec<ValidationIssue>,
    pub metadata: ResultMetadata,
}

impl ValidationResult {
    pub(crate) fn assemble(partial: PartialResult, score: u8, metadata: ResultMetadata) -> Self {
        Self {
            valid: partial.errors.is_empty(),
            score,
            errors: partial.errors,
            warnings: partial.warnings,
            info: partial.info,
            metadata,
        }
    }

    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }

    /// Errors, then warnings, then info.
    pub fn issues(&self) -> impl Iterator<Item = &ValidationIssue> {
        self.errors.iter().chain(&self.warnings).chain(&self.info)
    }

    pub fn exit_code(&self) -> u8 {
        if self.has_errors() {
            2
        } else {
            0
        }
    }

    /// Digest of everything except the timestamp. Two runs over the same
    /// input produce the same fingerprint.
    pub fn fingerprint(&self) -> Result<String, serde_json::Error> {
        let mut value = serde_json::to_value(self)?;
        if let Some(meta) = value.get_mut("metadata").and_then(|m| m.as_object_mut()) {
            meta.remove("timestamp");
        }
        compute_digest(&value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_routes_by_mandatory() {
        let mut partial = PartialResult::new();
        partial.record("a", Severity::High, true, RuleOutcome::fail("broken").at("/spec"));
        partial.record("b", Severity::Low, false, RuleOutcome::fail("meh"));
        partial.record("c", Severity::Low, true, RuleOutcome::pass());

        assert_eq!(partial.total_checks, 3);
        assert_eq!(partial.passed_checks, 1);
        assert_eq!(partial.errors.len(), 1);
        assert_eq!(partial.warnings.len(), 1);
        assert_eq!(partial.errors[0].path(), Some("/spec"));
        assert!(!partial.valid());
    }

    #[test]
    fn test_absorb_preserves_order() {
        let mut first = PartialResult::new();
        first.record("first", Severity::High, true, RuleOutcome::fail("one"));
        let mut second = PartialResult::new();
        second.record("second", Severity::High, true, RuleOutcome::fail("two"));
        second.record("third", Severity::Low, true, RuleOutcome::pass());

        first.absorb(second);
        let codes: Vec<_> = first.errors.iter().map(|i| i.code()).collect();
        assert_eq!(codes, vec!["first", "second"]);
        assert_eq!(first.total_checks, 3);
        assert_eq!(first.passed_checks, 1);
    }

    #[test]
    fn test_issue_serializes_with_level_tag() {
        let issue = ValidationIssue::Warning(
            IssueDetail::new("llm-temperature", "Unusual temperature").with_severity(Severity::Medium),
        );
        let json = serde_json::to_value(&issue).unwrap();
        assert_eq!(json["level"], "warning");
        assert_eq!(json["severity"], "medium");
        assert!(json.get("promoted").is_none());
    }
}
