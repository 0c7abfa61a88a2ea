//! Structural Validator - Core Manifest Shape
//!
//! Runs before any extension. `apiVersion` and `kind` form the gate: if
//! either fails, nothing downstream can be trusted and the run stops with
//! that single error. Every other rule accumulates.

use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;
use std::sync::Arc;
use tracing::debug;

use crate::context::ValidationContext;
use crate::error::{EngineError, Result};
use crate::manifest::{json_pointer, value_type_name, Kind, Manifest};
use crate::result::{IssueDetail, PartialResult};
use crate::rules::{Rule, RuleOutcome, RuleSet, Severity};

static API_VERSION_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^ossa/v\d+\.\d+\.\d+$").expect("static regex"));
static NAME_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[a-z0-9-]+$").expect("static regex"));

pub const MAX_NAME_LEN: usize = 100;

pub fn is_valid_api_version(raw: &str) -> bool {
    API_VERSION_RE.is_match(raw)
}

pub fn is_valid_name(raw: &str) -> bool {
    raw.len() <= MAX_NAME_LEN && NAME_RE.is_match(raw)
}

/// Schema versions this engine knows rules for.
pub const KNOWN_SCHEMA_VERSIONS: &[&str] =
    &["v0.2.2", "v0.2.5", "v0.3.0", "v0.3.1", "v0.3.2", "v0.3.3"];

/// Valid sampling temperature range for `spec.llm.temperature`.
pub const TEMPERATURE_RANGE: (f64, f64) = (0.0, 2.0);

/// Names of the built-in structural rules, gate first. Custom rules may not
/// reuse them.
pub const BUILTIN_RULE_NAMES: &[&str] = &[
    "api-version",
    "kind",
    "metadata-name",
    "metadata-version",
    "kind-requirements",
    "supported-version",
    "llm-temperature",
];

/// Text of a required string field, or the failed outcome saying why not.
fn required_text<'a>(
    raw: Option<&'a Value>,
    field: &str,
    path: &str,
) -> std::result::Result<&'a str, RuleOutcome> {
    match raw {
        None | Some(Value::Null) => Err(RuleOutcome::fail(format!("Missing {}", field)).at(path)),
        Some(Value::String(s)) if s.is_empty() => {
            Err(RuleOutcome::fail(format!("Missing {}", field)).at(path))
        }
        Some(Value::String(s)) => Ok(s),
        Some(other) => Err(RuleOutcome::fail(format!(
            "{} must be a string, found {}",
            field,
            value_type_name(other)
        ))
        .at(path)),
    }
}

// --- Gate Rules ---

pub struct ApiVersionRule;

impl Rule for ApiVersionRule {
    fn name(&self) -> &str {
        "api-version"
    }

    fn description(&self) -> &str {
        "apiVersion is present and shaped like ossa/vX.Y.Z"
    }

    fn severity(&self) -> Severity {
        Severity::Critical
    }

    fn check(&self, manifest: &Manifest, _ctx: &ValidationContext) -> RuleOutcome {
        let raw = match required_text(manifest.api_version.as_ref(), "apiVersion", "/apiVersion") {
            Ok(raw) => raw,
            Err(outcome) => return outcome.suggest("Set apiVersion, e.g. ossa/v0.3.0"),
        };
        if API_VERSION_RE.is_match(raw) {
            RuleOutcome::pass()
        } else {
            RuleOutcome::fail(format!("Invalid apiVersion: {}", raw))
                .at("/apiVersion")
                .suggest("apiVersion must match ossa/vMAJOR.MINOR.PATCH")
        }
    }
}

pub struct KindRule;

impl Rule for KindRule {
    fn name(&self) -> &str {
        "kind"
    }

    fn description(&self) -> &str {
        "kind is Agent, Task or Workflow"
    }

    fn severity(&self) -> Severity {
        Severity::Critical
    }

    fn check(&self, manifest: &Manifest, _ctx: &ValidationContext) -> RuleOutcome {
        let known: Vec<_> = Kind::ALL.iter().map(Kind::as_str).collect();
        let hint = format!("Use one of: {}", known.join(", "));
        match required_text(manifest.kind.as_ref(), "kind", "/kind") {
            Err(outcome) => outcome.suggest(hint),
            Ok(raw) if Kind::parse(raw).is_none() => {
                RuleOutcome::fail(format!("Invalid kind: {}", raw)).at("/kind").suggest(hint)
            }
            Ok(_) => RuleOutcome::pass(),
        }
    }
}

// --- Accumulating Rules ---

pub struct MetadataNameRule;

impl Rule for MetadataNameRule {
    fn name(&self) -> &str {
        "metadata-name"
    }

    fn description(&self) -> &str {
        "metadata.name is lowercase alphanumeric with dashes, at most 100 characters"
    }

    fn severity(&self) -> Severity {
        Severity::High
    }

    fn check(&self, manifest: &Manifest, _ctx: &ValidationContext) -> RuleOutcome {
        let path = "/metadata/name";
        match required_text(manifest.metadata.name.as_ref(), "metadata.name", path) {
            Err(outcome) => outcome,
            Ok(name) if name.len() > MAX_NAME_LEN => RuleOutcome::fail(format!(
                "metadata.name is {} characters, maximum is {}",
                name.len(),
                MAX_NAME_LEN
            ))
            .at(path),
            Ok(name) if !NAME_RE.is_match(name) => {
                RuleOutcome::fail(format!("Invalid metadata.name: {}", name))
                    .at(path)
                    .suggest(format!("Try {}", suggest_name(name)))
            }
            Ok(_) => RuleOutcome::pass(),
        }
    }
}

fn suggest_name(raw: &str) -> String {
    raw.chars()
        .map(|c| match c {
            'a'..='z' | '0'..='9' | '-' => c,
            'A'..='Z' => c.to_ascii_lowercase(),
            _ => '-',
        })
        .collect()
}

pub struct MetadataVersionRule;

impl Rule for MetadataVersionRule {
    fn name(&self) -> &str {
        "metadata-version"
    }

    fn description(&self) -> &str {
        "metadata.version is a semantic version"
    }

    fn severity(&self) -> Severity {
        Severity::High
    }

    fn check(&self, manifest: &Manifest, _ctx: &ValidationContext) -> RuleOutcome {
        let path = "/metadata/version";
        let hint = "Use a quoted MAJOR.MINOR.PATCH string, e.g. \"1.0.0\"";
        match required_text(manifest.metadata.version.as_ref(), "metadata.version", path) {
            Err(outcome) => outcome.suggest(hint),
            Ok(v) => match semver::Version::parse(v) {
                Ok(_) => RuleOutcome::pass(),
                Err(e) => RuleOutcome::fail(format!("Invalid metadata.version {}: {}", v, e))
                    .at(path)
                    .suggest(hint),
            },
        }
    }
}

pub struct KindRequirementsRule;

impl Rule for KindRequirementsRule {
    fn name(&self) -> &str {
        "kind-requirements"
    }

    fn description(&self) -> &str {
        "spec carries the fields its kind requires"
    }

    fn severity(&self) -> Severity {
        Severity::High
    }

    fn check(&self, manifest: &Manifest, _ctx: &ValidationContext) -> RuleOutcome {
        match manifest.parsed_kind() {
            Some(Kind::Agent) => {
                let has_role = manifest
                    .spec_field("role")
                    .and_then(Value::as_str)
                    .is_some_and(|r| !r.trim().is_empty());
                let has_llm = manifest.spec_field("llm").is_some_and(Value::is_object);
                if has_role || has_llm {
                    RuleOutcome::pass()
                } else {
                    RuleOutcome::fail("Agent must define spec.role or spec.llm")
                        .at("/spec/role")
                }
            }
            Some(Kind::Task) => {
                let has_any = ["execution", "input"]
                    .iter()
                    .any(|k| manifest.spec_field(k).is_some_and(Value::is_object));
                if has_any {
                    RuleOutcome::pass()
                } else {
                    RuleOutcome::fail("Task must define spec.execution or spec.input")
                        .at("/spec/execution")
                }
            }
            Some(Kind::Workflow) => match manifest.spec_field("steps") {
                Some(Value::Array(steps)) if !steps.is_empty() => RuleOutcome::pass(),
                Some(Value::Array(_)) => {
                    RuleOutcome::fail("Workflow spec.steps must not be empty").at("/spec/steps")
                }
                _ => RuleOutcome::fail("Workflow must define spec.steps as a list")
                    .at("/spec/steps"),
            },
            // Unreachable past the gate, but a rule never panics.
            None => RuleOutcome::fail("Cannot check spec without a known kind").at("/kind"),
        }
    }
}

pub struct SupportedVersionRule;

impl Rule for SupportedVersionRule {
    fn name(&self) -> &str {
        "supported-version"
    }

    fn description(&self) -> &str {
        "apiVersion targets a schema version this engine knows"
    }

    fn severity(&self) -> Severity {
        Severity::Low
    }

    fn mandatory(&self) -> bool {
        false
    }

    fn check(&self, manifest: &Manifest, _ctx: &ValidationContext) -> RuleOutcome {
        let Some(version) = manifest.schema_version() else {
            return RuleOutcome::pass();
        };
        if KNOWN_SCHEMA_VERSIONS.contains(&version) {
            return RuleOutcome::pass();
        }
        let outcome = RuleOutcome::fail(format!("No rules for schema version {}", version))
            .at("/apiVersion");
        match closest_known_version(version) {
            Some(closest) => outcome.suggest(format!("Closest known version is {}", closest)),
            None => outcome,
        }
    }
}

/// Highest known version not newer than `requested`.
pub fn closest_known_version(requested: &str) -> Option<&'static str> {
    let wanted = semver::Version::parse(requested.trim_start_matches('v')).ok()?;
    KNOWN_SCHEMA_VERSIONS
        .iter()
        .filter_map(|known| {
            let parsed = semver::Version::parse(known.trim_start_matches('v')).ok()?;
            (parsed <= wanted).then_some((parsed, *known))
        })
        .max_by(|a, b| a.0.cmp(&b.0))
        .map(|(_, known)| known)
}

pub struct LlmTemperatureRule;

impl Rule for LlmTemperatureRule {
    fn name(&self) -> &str {
        "llm-temperature"
    }

    fn description(&self) -> &str {
        "spec.llm.temperature lies within 0..=2"
    }

    fn severity(&self) -> Severity {
        Severity::Medium
    }

    fn mandatory(&self) -> bool {
        false
    }

    fn check(&self, manifest: &Manifest, _ctx: &ValidationContext) -> RuleOutcome {
        let path = "/spec/llm/temperature";
        let temperature = manifest
            .spec_field("llm")
            .and_then(|llm| llm.get("temperature"));
        match temperature {
            None => RuleOutcome::pass(),
            Some(value) => match value.as_f64() {
                Some(t) if (TEMPERATURE_RANGE.0..=TEMPERATURE_RANGE.1).contains(&t) => {
                    RuleOutcome::pass()
                }
                Some(t) => RuleOutcome::fail(format!("Unusual temperature value: {}", t))
                    .at(path)
                    .suggest("Keep temperature between 0 and 2"),
                None => RuleOutcome::fail("spec.llm.temperature must be a number").at(path),
            },
        }
    }
}

/// Structural checks plus any caller-supplied rules.
pub struct StructuralValidator {
    gate: Vec<Arc<dyn Rule>>,
    rules: RuleSet,
}

impl StructuralValidator {
    pub fn new() -> Self {
        let mut rules = RuleSet::new();
        let builtin: [Arc<dyn Rule>; 5] = [
            Arc::new(MetadataNameRule),
            Arc::new(MetadataVersionRule),
            Arc::new(KindRequirementsRule),
            Arc::new(SupportedVersionRule),
            Arc::new(LlmTemperatureRule),
        ];
        for rule in builtin {
            // Built-in names are distinct.
            let _ = rules.register(rule);
        }
        Self {
            gate: vec![Arc::new(ApiVersionRule), Arc::new(KindRule)],
            rules,
        }
    }

    /// Every built-in rule, gate first.
    pub fn rules(&self) -> impl Iterator<Item = &Arc<dyn Rule>> {
        self.gate.iter().chain(self.rules.iter())
    }

    pub fn rule_names(&self) -> Vec<&str> {
        self.rules().map(|r| r.name()).collect()
    }

    /// Fails only when a custom rule reuses a registered name.
    pub fn validate(&self, manifest: &Manifest, ctx: &ValidationContext) -> Result<PartialResult> {
        if let Some(clash) = ctx
            .options
            .custom_rules
            .iter()
            .find(|custom| self.gate.iter().any(|g| g.name() == custom.name()))
        {
            return Err(EngineError::DuplicateRule(clash.name().to_string()));
        }
        let rules = self.rules.merged(&ctx.options.custom_rules)?;
        let mut partial = PartialResult::new();

        for rule in &self.gate {
            let outcome = rule.check(manifest, ctx);
            let passed = outcome.passed;
            partial.record(rule.name(), rule.severity(), true, outcome);
            if !passed {
                debug!(rule = rule.name(), "structural gate failed");
                partial.fatal = true;
                return Ok(partial);
            }
        }

        for rule in rules.iter() {
            if ctx.options.skip_optional && !rule.mandatory() {
                continue;
            }
            let outcome = rule.check(manifest, ctx);
            partial.record(rule.name(), rule.severity(), rule.mandatory(), outcome);
        }

        if !ctx.options.skip_optional {
            self.advise(manifest, &mut partial);
        }

        Ok(partial)
    }

    fn advise(&self, manifest: &Manifest, partial: &mut PartialResult) {
        if manifest.metadata.description.as_ref().map_or(true, Value::is_null) {
            partial.note(
                IssueDetail::new("metadata-description", "Consider adding a description to metadata")
                    .at("/metadata/description"),
            );
        }
        if manifest.metadata.labels.is_empty() {
            partial.note(
                IssueDetail::new("metadata-labels", "Consider adding labels for better organization")
                    .at("/metadata/labels"),
            );
        }
        for (key, value) in &manifest.metadata.labels {
            if !value.is_string() {
                partial.note(
                    IssueDetail::new(
                        "metadata-labels",
                        format!("Label {} should be a string, found {}", key, value_type_name(value)),
                    )
                    .at(json_pointer(["metadata", "labels", key.as_str()])),
                );
            }
        }
    }
}

impl Default for StructuralValidator {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::ValidationOptions;
    use serde_json::json;

    fn manifest(value: Value) -> Manifest {
        Manifest::from_value(value).unwrap()
    }

    fn run(m: &Manifest, options: ValidationOptions) -> PartialResult {
        let ctx = ValidationContext::for_manifest(m, options);
        StructuralValidator::new().validate(m, &ctx).unwrap()
    }

    fn demo() -> Value {
        json!({
            "apiVersion": "ossa/v0.3.0",
            "kind": "Agent",
            "metadata": {"name": "demo-agent", "version": "1.0.0"},
            "spec": {"role": "assistant"}
        })
    }

    #[test]
    fn test_demo_agent_passes_every_rule() {
        let partial = run(&manifest(demo()), ValidationOptions::default());
        assert!(partial.errors.is_empty());
        assert!(partial.warnings.is_empty());
        assert_eq!(partial.total_checks, 7);
        assert_eq!(partial.passed_checks, 7);
        assert_eq!(partial.info.len(), 2);
    }

    #[test]
    fn test_missing_api_version_short_circuits() {
        let mut value = demo();
        value.as_object_mut().unwrap().remove("apiVersion");
        value["metadata"]["name"] = json!("BAD NAME");

        let partial = run(&manifest(value), ValidationOptions::default());
        assert!(partial.fatal);
        assert_eq!(partial.errors.len(), 1);
        assert_eq!(partial.errors[0].code(), "api-version");
        assert_eq!(partial.total_checks, 1);
    }

    #[test]
    fn test_unknown_kind_short_circuits() {
        let mut value = demo();
        value["kind"] = json!("Robot");

        let partial = run(&manifest(value), ValidationOptions::default());
        assert!(partial.fatal);
        assert_eq!(partial.errors.len(), 1);
        assert_eq!(partial.errors[0].path(), Some("/kind"));
        assert_eq!(partial.passed_checks, 1);
    }

    #[test]
    fn test_name_rules() {
        let mut value = demo();
        value["metadata"]["name"] = json!("a".repeat(101));
        let partial = run(&manifest(value), ValidationOptions::default());
        assert_eq!(partial.errors.len(), 1);
        assert!(partial.errors[0].detail().message.contains("maximum is 100"));

        let mut value = demo();
        value["metadata"]["name"] = json!("Demo_Agent");
        let partial = run(&manifest(value), ValidationOptions::default());
        assert_eq!(partial.errors[0].detail().suggestion.as_deref(), Some("Try demo-agent"));
    }

    #[test]
    fn test_workflow_requires_steps() {
        let mut value = demo();
        value["kind"] = json!("Workflow");
        value["spec"] = json!({"steps": []});
        let partial = run(&manifest(value), ValidationOptions::default());
        assert_eq!(partial.errors.len(), 1);
        assert_eq!(partial.errors[0].path(), Some("/spec/steps"));

        let mut value = demo();
        value["kind"] = json!("Workflow");
        value["spec"] = json!({"steps": [{"name": "fetch"}]});
        assert!(run(&manifest(value), ValidationOptions::default()).errors.is_empty());
    }

    #[test]
    fn test_task_requires_execution_or_input() {
        let mut value = demo();
        value["kind"] = json!("Task");
        value["spec"] = json!({"role": "worker"});
        let partial = run(&manifest(value), ValidationOptions::default());
        assert_eq!(partial.errors[0].code(), "kind-requirements");
    }

    #[test]
    fn test_agent_with_llm_only_passes() {
        let mut value = demo();
        value["spec"] = json!({"llm": {"provider": "anthropic", "model": "claude"}});
        assert!(run(&manifest(value), ValidationOptions::default()).errors.is_empty());
    }

    #[test]
    fn test_temperature_is_medium_warning() {
        let mut value = demo();
        value["spec"]["llm"] = json!({"temperature": 3.5});
        let partial = run(&manifest(value), ValidationOptions::default());
        assert!(partial.errors.is_empty());
        assert_eq!(partial.warnings.len(), 1);
        assert_eq!(partial.warnings[0].detail().severity, Some(Severity::Medium));
    }

    #[test]
    fn test_skip_optional_drops_best_practice_rules() {
        let mut value = demo();
        value["spec"]["llm"] = json!({"temperature": 3.5});
        let partial = run(&manifest(value), ValidationOptions::default().with_skip_optional(true));
        assert!(partial.warnings.is_empty());
        assert!(partial.info.is_empty());
        assert_eq!(partial.total_checks, 5);
    }

    #[test]
    fn test_unknown_schema_version_suggests_closest() {
        assert_eq!(closest_known_version("v0.3.9"), Some("v0.3.3"));
        assert_eq!(closest_known_version("v0.2.4"), Some("v0.2.2"));
        assert_eq!(closest_known_version("v0.1.0"), None);

        let mut value = demo();
        value["apiVersion"] = json!("ossa/v0.4.0");
        let partial = run(&manifest(value), ValidationOptions::default());
        assert_eq!(partial.warnings.len(), 1);
        assert_eq!(
            partial.warnings[0].detail().suggestion.as_deref(),
            Some("Closest known version is v0.3.3")
        );
    }

    #[test]
    fn test_custom_rule_clash_is_configuration_error() {
        use crate::rules::FnRule;

        // Bypass the checked setter; validate still refuses the clash.
        let m = manifest(demo());
        let mut options = ValidationOptions::default();
        options
            .custom_rules
            .push(Arc::new(FnRule::new("kind", Severity::Low, |_, _| RuleOutcome::pass())));
        let ctx = ValidationContext::for_manifest(&m, options);
        let err = StructuralValidator::new().validate(&m, &ctx).unwrap_err();
        assert!(err.is_configuration());
    }

    #[test]
    fn test_builtin_rule_names_match_rules() {
        assert_eq!(StructuralValidator::new().rule_names(), BUILTIN_RULE_NAMES);
    }

    #[test]
    fn test_wrong_types_are_violations() {
        let mut value = demo();
        value["metadata"]["name"] = json!(42);
        value["metadata"]["version"] = json!(1.0);
        value["metadata"]["labels"] = json!({"tier": 1, "team": "core"});
        let partial = run(&manifest(value), ValidationOptions::default());

        assert!(!partial.fatal);
        let codes: Vec<_> = partial.errors.iter().map(|e| e.code()).collect();
        assert_eq!(codes, vec!["metadata-name", "metadata-version"]);
        assert_eq!(partial.errors[0].detail().message, "metadata.name must be a string, found number");
        assert_eq!(partial.errors[1].path(), Some("/metadata/version"));
        assert_eq!(partial.info.len(), 2);
        assert_eq!(partial.info[1].path(), Some("/metadata/labels/tier"));
    }

    #[test]
    fn test_numeric_api_version_fails_gate() {
        let mut value = demo();
        value["apiVersion"] = json!(3);
        let partial = run(&manifest(value), ValidationOptions::default());
        assert!(partial.fatal);
        assert_eq!(partial.errors.len(), 1);
        assert_eq!(partial.errors[0].detail().message, "apiVersion must be a string, found number");
    }
}
