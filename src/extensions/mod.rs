//! Extension Validators - One per Platform
//!
//! Each validator sees only the payload under `extensions.<name>`. Shapes
//! are declared as [`FieldCheck`] tables; anything a table does not name is
//! ignored so newer manifests keep validating.

mod a2a;
mod crewai;
mod cursor;
mod kagent;
mod langflow;
mod mcp;

pub use a2a::A2aValidator;
pub use crewai::CrewAiValidator;
pub use cursor::CursorValidator;
pub use kagent::KagentValidator;
pub use langflow::LangflowValidator;
pub use mcp::McpValidator;

use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::{Map, Value};

use crate::manifest::{json_pointer, lookup, value_type_name};
use crate::result::{IssueDetail, PartialResult};
use crate::rules::{RuleOutcome, RuleScope, Severity};

static DNS_LABEL_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[a-z0-9]([-a-z0-9]{0,61}[a-z0-9])?$").expect("static regex")
});

/// `validate_extension` output: `valid()` plus errors and warnings.
pub type ExtensionReport = PartialResult;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Expectation {
    /// Non-empty string.
    String,
    Bool,
    Object,
    Array,
    /// Absolute http(s) URL.
    Url,
    Semver,
    OneOf(&'static [&'static str]),
    IntRange(i64, i64),
    DnsLabel,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Requirement {
    /// Missing is an error.
    Required,
    /// Missing is a best-practice warning.
    Recommended,
    /// Missing is fine.
    Optional,
}

/// Shape contract for one (possibly dotted) field.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FieldCheck {
    pub field: &'static str,
    pub expect: Expectation,
    pub requirement: Requirement,
    pub severity: Severity,
    pub hint: Option<&'static str>,
}

impl FieldCheck {
    pub const fn required(field: &'static str, expect: Expectation, severity: Severity) -> Self {
        Self {
            field,
            expect,
            requirement: Requirement::Required,
            severity,
            hint: None,
        }
    }

    pub const fn recommended(field: &'static str, expect: Expectation, severity: Severity) -> Self {
        Self {
            field,
            expect,
            requirement: Requirement::Recommended,
            severity,
            hint: None,
        }
    }

    pub const fn optional(field: &'static str, expect: Expectation, severity: Severity) -> Self {
        Self {
            field,
            expect,
            requirement: Requirement::Optional,
            severity,
            hint: None,
        }
    }

    pub const fn hint(mut self, hint: &'static str) -> Self {
        self.hint = Some(hint);
        self
    }
}

/// The namespace a validator is allowed to read.
#[derive(Debug, Clone, Copy)]
pub struct ExtensionBlock<'a> {
    pub name: &'a str,
    pub config: &'a Map<String, Value>,
}

impl<'a> ExtensionBlock<'a> {
    pub fn get(&self, dotted: &str) -> Option<&'a Value> {
        lookup(self.config, dotted)
    }

    pub fn str_field(&self, dotted: &str) -> Option<&'a str> {
        self.get(dotted).and_then(Value::as_str)
    }

    pub fn pointer(&self, dotted: &str) -> String {
        json_pointer(["extensions", self.name].into_iter().chain(dotted.split('.')))
    }

    pub fn code(&self, suffix: &str) -> String {
        format!("{}.{}", self.name, suffix)
    }
}

/// Contract every platform validator implements. The orchestrator only
/// depends on this trait.
pub trait ExtensionValidator: Send + Sync {
    /// Key under `extensions` this validator owns.
    fn name(&self) -> &str;

    fn description(&self) -> &str;

    fn scope(&self) -> RuleScope {
        RuleScope::Extension(self.name().to_string())
    }

    /// Experimental validators run only when drafts are included.
    fn experimental(&self) -> bool {
        false
    }

    fn field_checks(&self) -> &[FieldCheck];

    /// Cross-field checks inside the namespace, after the field table.
    fn extra_checks(&self, _block: &ExtensionBlock<'_>, _report: &mut PartialResult) {}

    /// Validate the raw payload of `extensions.<name>`. Absent or disabled
    /// blocks produce an empty, passing report.
    fn validate(&self, raw: Option<&Value>) -> ExtensionReport {
        let mut report = PartialResult::new();
        let Some(raw) = raw else {
            return report;
        };

        let name = self.name();
        let Some(config) = raw.as_object() else {
            report.record(
                &format!("{}.block", name),
                Severity::High,
                true,
                RuleOutcome::fail(format!(
                    "extensions.{} must be an object, found {}",
                    name,
                    value_type_name(raw)
                ))
                .at(json_pointer(["extensions", name])),
            );
            return report;
        };
        let block = ExtensionBlock { name, config };

        match config.get("enabled") {
            Some(Value::Bool(false)) => return report,
            Some(Value::Bool(true)) | None => {}
            Some(other) => {
                report.record(
                    &block.code("enabled"),
                    Severity::High,
                    true,
                    RuleOutcome::fail(format!(
                        "extensions.{}.enabled must be a boolean, found {}",
                        name,
                        value_type_name(other)
                    ))
                    .at(block.pointer("enabled")),
                );
            }
        }

        for check in self.field_checks() {
            run_field_check(&block, check, &mut report);
        }
        self.extra_checks(&block, &mut report);
        report
    }
}

fn run_field_check(block: &ExtensionBlock<'_>, check: &FieldCheck, report: &mut PartialResult) {
    let code = block.code(check.field);
    let path = block.pointer(check.field);

    let Some(value) = block.get(check.field) else {
        let outcome = match check.requirement {
            Requirement::Optional => RuleOutcome::pass(),
            Requirement::Required => RuleOutcome::fail(format!(
                "Missing required field extensions.{}.{}",
                block.name, check.field
            )),
            Requirement::Recommended => RuleOutcome::fail(format!(
                "Best practice: configure extensions.{}.{}",
                block.name, check.field
            )),
        };
        let outcome = with_hint(outcome.at(path), check.hint);
        let mandatory = check.requirement == Requirement::Required;
        report.record(&code, check.severity, mandatory, outcome);
        return;
    };

    let outcome = match shape_error(value, check.expect) {
        None => RuleOutcome::pass(),
        Some(problem) => with_hint(
            RuleOutcome::fail(format!(
                "extensions.{}.{} {}",
                block.name, check.field, problem
            ))
            .at(path),
            check.hint,
        ),
    };
    report.record(&code, check.severity, true, outcome);
}

fn with_hint(outcome: RuleOutcome, hint: Option<&'static str>) -> RuleOutcome {
    match hint {
        Some(h) if !outcome.passed => outcome.suggest(h),
        _ => outcome,
    }
}

/// Describe why `value` does not meet `expect`, or `None` when it does.
pub fn shape_error(value: &Value, expect: Expectation) -> Option<String> {
    let found = || format!("found {}", value_type_name(value));
    match expect {
        Expectation::String => match value.as_str() {
            Some(s) if !s.trim().is_empty() => None,
            Some(_) => Some("must not be empty".to_string()),
            None => Some(format!("must be a string, {}", found())),
        },
        Expectation::Bool => (!value.is_boolean()).then(|| format!("must be a boolean, {}", found())),
        Expectation::Object => (!value.is_object()).then(|| format!("must be an object, {}", found())),
        Expectation::Array => (!value.is_array()).then(|| format!("must be a list, {}", found())),
        Expectation::Url => match value.as_str() {
            None => Some(format!("must be a URL string, {}", found())),
            Some(raw) => match url::Url::parse(raw) {
                Ok(u) if matches!(u.scheme(), "http" | "https") => None,
                Ok(u) => Some(format!("must use http or https, not {}", u.scheme())),
                Err(e) => Some(format!("is not a valid URL ({}): {}", e, raw)),
            },
        },
        Expectation::Semver => match value.as_str() {
            None => Some(format!("must be a version string, {}", found())),
            Some(raw) => semver::Version::parse(raw)
                .err()
                .map(|e| format!("is not a semantic version ({}): {}", e, raw)),
        },
        Expectation::OneOf(allowed) => match value.as_str() {
            Some(s) if allowed.contains(&s) => None,
            Some(s) => Some(format!("must be one of {} (found \"{}\")", allowed.join(", "), s)),
            None => Some(format!("must be one of {}, {}", allowed.join(", "), found())),
        },
        Expectation::IntRange(min, max) => match value.as_i64() {
            Some(n) if (min..=max).contains(&n) => None,
            Some(n) => Some(format!("must be between {} and {} (found {})", min, max, n)),
            None => Some(format!("must be an integer, {}", found())),
        },
        Expectation::DnsLabel => match value.as_str() {
            Some(s) if DNS_LABEL_RE.is_match(s) => None,
            Some(s) => Some(format!("must be a DNS label (found \"{}\")", s)),
            None => Some(format!("must be a string, {}", found())),
        },
    }
}

/// Warn when an endpoint travels over plain http to a non-local host.
pub(crate) fn check_transport_security(
    block: &ExtensionBlock<'_>,
    field: &str,
    report: &mut PartialResult,
) {
    let Some(parsed) = block.str_field(field).and_then(|raw| url::Url::parse(raw).ok()) else {
        return;
    };
    let local = matches!(parsed.host_str(), Some("localhost" | "127.0.0.1" | "::1" | "[::1]"));
    let outcome = if parsed.scheme() == "http" && !local {
        RuleOutcome::fail(format!("extensions.{}.{} uses plain http", block.name, field))
            .at(block.pointer(field))
            .suggest("Use https for remote endpoints")
    } else {
        RuleOutcome::pass()
    };
    report.record(&block.code(&format!("{}.tls", field)), Severity::Medium, false, outcome);
}

/// Every validator this crate ships, in registration order.
pub fn builtin_validators() -> Vec<Box<dyn ExtensionValidator>> {
    vec![
        Box::new(CursorValidator),
        Box::new(LangflowValidator),
        Box::new(A2aValidator),
        Box::new(McpValidator),
        Box::new(KagentValidator),
        Box::new(CrewAiValidator),
    ]
}

/// Non-error issue for a key nobody registered.
pub fn unknown_extension_warning(name: &str) -> IssueDetail {
    IssueDetail::new("unknown-extension", format!("unknown extension: {}", name))
        .at(json_pointer(["extensions", name]))
        .with_severity(Severity::Low)
}
