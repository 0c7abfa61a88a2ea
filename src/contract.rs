//! API-Contract Validator
//!
//! Checks an OpenAPI document the caller has already loaded. Fetching or
//! reading the document is never done here.

use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::{Map, Value};

use crate::error::{EngineError, Result};
use crate::manifest::{json_pointer, value_type_name};
use crate::result::PartialResult;
use crate::rules::{RuleOutcome, RuleScope, Severity};
use crate::structural::{is_valid_api_version, is_valid_name};

static OPENAPI_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^3\.\d+\.\d+$").expect("static regex"));

pub const HTTP_METHODS: &[&str] = &["get", "put", "post", "delete", "options", "head", "patch", "trace"];

/// Vendor extension carrying the OSSA binding of an API.
pub const OSSA_EXTENSION_KEY: &str = "x-ossa";

#[derive(Debug, Default)]
pub struct ContractValidator;

impl ContractValidator {
    pub fn new() -> Self {
        Self
    }

    pub fn scope(&self) -> RuleScope {
        RuleScope::ApiContract
    }

    pub fn validate(&self, document: &Value) -> Result<PartialResult> {
        let doc = document.as_object().ok_or_else(|| {
            EngineError::MalformedContract(format!(
                "expected a JSON object, found {}",
                value_type_name(document)
            ))
        })?;

        let mut report = PartialResult::new();
        self.check_version(doc, &mut report);
        self.check_info(doc, &mut report);
        self.check_paths(doc, &mut report);
        self.check_ossa_binding(doc, &mut report);
        Ok(report)
    }

    fn check_version(&self, doc: &Map<String, Value>, report: &mut PartialResult) {
        let outcome = match doc.get("openapi").and_then(Value::as_str) {
            Some(v) if OPENAPI_RE.is_match(v) => RuleOutcome::pass(),
            Some(v) => RuleOutcome::fail(format!("Unsupported openapi version: {}", v))
                .suggest("Use an OpenAPI 3.x document"),
            None => RuleOutcome::fail("Missing openapi version"),
        };
        report.record("openapi-version", Severity::Critical, true, outcome.at("/openapi"));
    }

    fn check_info(&self, doc: &Map<String, Value>, report: &mut PartialResult) {
        let info = doc.get("info").and_then(Value::as_object);
        for field in ["title", "version"] {
            let present = info
                .and_then(|i| i.get(field))
                .and_then(Value::as_str)
                .is_some_and(|s| !s.trim().is_empty());
            let outcome = if present {
                RuleOutcome::pass()
            } else {
                RuleOutcome::fail(format!("Missing info.{}", field))
            };
            report.record(
                &format!("info-{}", field),
                Severity::High,
                true,
                outcome.at(json_pointer(["info", field])),
            );
        }
    }

    fn check_paths(&self, doc: &Map<String, Value>, report: &mut PartialResult) {
        let paths = match doc.get("paths") {
            Some(Value::Object(p)) if !p.is_empty() => p,
            Some(Value::Object(_)) => {
                report.record("paths", Severity::High, true, RuleOutcome::fail("paths is empty").at("/paths"));
                return;
            }
            Some(other) => {
                report.record(
                    "paths",
                    Severity::High,
                    true,
                    RuleOutcome::fail(format!("paths must be an object, found {}", value_type_name(other)))
                        .at("/paths"),
                );
                return;
            }
            None => {
                report.record("paths", Severity::High, true, RuleOutcome::fail("Missing paths").at("/paths"));
                return;
            }
        };
        report.record("paths", Severity::High, true, RuleOutcome::pass());

        for (route, item) in paths {
            let Some(item) = item.as_object() else {
                continue;
            };
            for method in HTTP_METHODS {
                let Some(operation) = item.get(*method) else {
                    continue;
                };
                let has_id = operation
                    .get("operationId")
                    .and_then(Value::as_str)
                    .is_some_and(|s| !s.is_empty());
                let outcome = if has_id {
                    RuleOutcome::pass()
                } else {
                    RuleOutcome::fail(format!("{} {} has no operationId", method.to_uppercase(), route))
                        .at(json_pointer(["paths", route.as_str(), *method, "operationId"]))
                        .suggest("Agents address operations by operationId")
                };
                report.record("operation-id", Severity::Medium, false, outcome);
            }
        }
    }

    fn check_ossa_binding(&self, doc: &Map<String, Value>, report: &mut PartialResult) {
        let Some(binding) = doc.get(OSSA_EXTENSION_KEY) else {
            return;
        };
        let base = json_pointer([OSSA_EXTENSION_KEY]);

        let outcome = match binding.get("apiVersion").and_then(Value::as_str) {
            Some(v) if is_valid_api_version(v) => RuleOutcome::pass(),
            Some(v) => RuleOutcome::fail(format!("Invalid x-ossa.apiVersion: {}", v)),
            None => RuleOutcome::fail("x-ossa block is missing apiVersion"),
        };
        report.record("x-ossa-api-version", Severity::High, true, outcome.at(format!("{}/apiVersion", base)));

        if let Some(name) = binding.get("agent").and_then(|a| a.get("name")) {
            let outcome = match name.as_str() {
                Some(n) if is_valid_name(n) => RuleOutcome::pass(),
                _ => RuleOutcome::fail(format!("Invalid x-ossa.agent.name: {}", name)),
            };
            report.record("x-ossa-agent-name", Severity::High, true, outcome.at(format!("{}/agent/name", base)));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn petstore() -> Value {
        json!({
            "openapi": "3.1.0",
            "info": {"title": "Pets", "version": "1.0.0"},
            "paths": {
                "/pets": {
                    "get": {"operationId": "listPets"},
                    "post": {"summary": "create"},
                    "parameters": []
                }
            },
            "x-ossa": {"apiVersion": "ossa/v0.3.0", "agent": {"name": "pet-agent"}}
        })
    }

    #[test]
    fn test_missing_operation_id_is_warning() {
        let report = ContractValidator::new().validate(&petstore()).unwrap();
        assert!(report.valid());
        assert_eq!(report.warnings.len(), 1);
        assert_eq!(report.warnings[0].path(), Some("/paths/~1pets/post/operationId"));
        // version, title, version, paths, 2 operations, binding apiVersion + name
        assert_eq!(report.total_checks, 8);
    }

    #[test]
    fn test_swagger_two_rejected() {
        let mut doc = petstore();
        doc["openapi"] = json!("2.0");
        let report = ContractValidator::new().validate(&doc).unwrap();
        assert_eq!(report.errors.len(), 1);
        assert_eq!(report.errors[0].code(), "openapi-version");
    }

    #[test]
    fn test_bad_binding() {
        let mut doc = petstore();
        doc["x-ossa"] = json!({"apiVersion": "v1", "agent": {"name": "Pet Agent"}});
        let report = ContractValidator::new().validate(&doc).unwrap();
        let codes: Vec<_> = report.errors.iter().map(|i| i.code()).collect();
        assert_eq!(codes, vec!["x-ossa-api-version", "x-ossa-agent-name"]);
    }

    #[test]
    fn test_non_object_document() {
        let err = ContractValidator::new().validate(&json!("openapi")).unwrap_err();
        assert!(err.to_string().contains("Malformed API contract"));
    }
}
