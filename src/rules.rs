//! Rule System - Named, Stateless Checks
//!
//! Rules produce outcomes. Validators map outcomes to issues.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

use crate::context::ValidationContext;
use crate::error::{EngineError, Result};
use crate::manifest::Manifest;

/// Ordered from least to most severe.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Low,
    Medium,
    High,
    Critical,
}

impl Severity {
    /// Warnings at or above this level become errors in strict mode.
    pub const STRICT_THRESHOLD: Severity = Severity::Medium;

    pub fn promotes_in_strict(self) -> bool {
        self >= Self::STRICT_THRESHOLD
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
            Self::Critical => "critical",
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RuleScope {
    Structural,
    Extension(String),
    ApiContract,
}

impl fmt::Display for RuleScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Structural => f.write_str("structural"),
            Self::Extension(name) => write!(f, "extension:{}", name),
            Self::ApiContract => f.write_str("api-contract"),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RuleOutcome {
    pub passed: bool,
    pub message: Option<String>,
    pub suggestion: Option<String>,
    /// JSON pointer to the offending field.
    pub path: Option<String>,
}

impl RuleOutcome {
    pub fn pass() -> Self {
        Self {
            passed: true,
            ..Default::default()
        }
    }

    pub fn fail(message: impl Into<String>) -> Self {
        Self {
            passed: false,
            message: Some(message.into()),
            ..Default::default()
        }
    }

    pub fn at(mut self, path: impl Into<String>) -> Self {
        self.path = Some(path.into());
        self
    }

    pub fn suggest(mut self, suggestion: impl Into<String>) -> Self {
        self.suggestion = Some(suggestion.into());
        self
    }
}

/// A single named check. Implementations must hold no per-call state.
pub trait Rule: Send + Sync {
    fn name(&self) -> &str;
    fn description(&self) -> &str;
    fn severity(&self) -> Severity;

    fn scope(&self) -> RuleScope {
        RuleScope::Structural
    }

    /// Failed mandatory rules are errors; failed optional rules are warnings.
    fn mandatory(&self) -> bool {
        true
    }

    fn check(&self, manifest: &Manifest, ctx: &ValidationContext) -> RuleOutcome;
}

/// Closure-backed rule for caller-supplied checks.
pub struct FnRule<F> {
    name: String,
    description: String,
    severity: Severity,
    mandatory: bool,
    check: F,
}

impl<F> FnRule<F> {
    pub fn new(name: impl Into<String>, severity: Severity, check: F) -> Self
    where
        F: Fn(&Manifest, &ValidationContext) -> RuleOutcome + Send + Sync,
    {
        let name = name.into();
        Self {
            description: format!("custom rule {}", name),
            name,
            severity,
            mandatory: true,
            check,
        }
    }

    pub fn describe(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn optional(mut self) -> Self {
        self.mandatory = false;
        self
    }
}

impl<F> Rule for FnRule<F>
where
    F: Fn(&Manifest, &ValidationContext) -> RuleOutcome + Send + Sync,
{
    fn name(&self) -> &str {
        &self.name
    }

    fn description(&self) -> &str {
        &self.description
    }

    fn severity(&self) -> Severity {
        self.severity
    }

    fn mandatory(&self) -> bool {
        self.mandatory
    }

    fn check(&self, manifest: &Manifest, ctx: &ValidationContext) -> RuleOutcome {
        (self.check)(manifest, ctx)
    }
}

/// Ordered rule collection with unique names.
#[derive(Clone, Default)]
pub struct RuleSet {
    rules: Vec<Arc<dyn Rule>>,
}

impl RuleSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, rule: Arc<dyn Rule>) -> Result<()> {
        if self.contains(rule.name()) {
            return Err(EngineError::DuplicateRule(rule.name().to_string()));
        }
        self.rules.push(rule);
        Ok(())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.rules.iter().any(|r| r.name() == name)
    }

    /// Copy of this set with `extra` appended, rejecting any name clash.
    pub fn merged(&self, extra: &[Arc<dyn Rule>]) -> Result<RuleSet> {
        let mut merged = self.clone();
        for rule in extra {
            merged.register(Arc::clone(rule))?;
        }
        Ok(merged)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Arc<dyn Rule>> {
        self.rules.iter()
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    pub fn names(&self) -> Vec<&str> {
        self.rules.iter().map(|r| r.name()).collect()
    }
}

impl fmt::Debug for RuleSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.names()).finish()
    }
}
