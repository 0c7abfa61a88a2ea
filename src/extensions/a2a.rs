//! Agent-to-agent protocol. Still a draft, so it only runs with drafts included.

use serde_json::Value;

use super::{check_transport_security, Expectation, ExtensionBlock, ExtensionValidator, FieldCheck};
use crate::result::PartialResult;
use crate::rules::{RuleOutcome, Severity};

pub const AUTH_TYPES: &[&str] = &["none", "api_key", "oauth2", "mtls"];

const FIELDS: &[FieldCheck] = &[
    FieldCheck::required("endpoint", Expectation::Url, Severity::High),
    FieldCheck::optional("protocol_version", Expectation::Semver, Severity::Medium),
    FieldCheck::recommended("capabilities", Expectation::Array, Severity::Low)
        .hint("Advertise capabilities so peers can discover what this agent does"),
    FieldCheck::optional("auth.type", Expectation::OneOf(AUTH_TYPES), Severity::High),
];

pub struct A2aValidator;

impl ExtensionValidator for A2aValidator {
    fn name(&self) -> &str {
        "a2a"
    }

    fn description(&self) -> &str {
        "Agent-to-agent messaging protocol"
    }

    fn experimental(&self) -> bool {
        true
    }

    fn field_checks(&self) -> &[FieldCheck] {
        FIELDS
    }

    fn extra_checks(&self, block: &ExtensionBlock<'_>, report: &mut PartialResult) {
        check_transport_security(block, "endpoint", report);

        if let Some(caps) = block.get("capabilities").and_then(Value::as_array) {
            let all_named = caps.iter().all(|c| c.as_str().is_some_and(|s| !s.is_empty()));
            let outcome = if all_named {
                RuleOutcome::pass()
            } else {
                RuleOutcome::fail("extensions.a2a.capabilities must list non-empty strings")
                    .at(block.pointer("capabilities"))
            };
            report.record(&block.code("capabilities.items"), Severity::Medium, true, outcome);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_well_formed_block() {
        let report = A2aValidator.validate(Some(&json!({
            "endpoint": "https://agents.example.com/a2a",
            "protocol_version": "0.2.0",
            "capabilities": ["summarize", "translate"],
            "auth": {"type": "oauth2"}
        })));
        assert!(report.valid());
        assert!(report.warnings.is_empty());
        assert_eq!(report.total_checks, report.passed_checks);
    }

    #[test]
    fn test_bad_auth_and_capabilities() {
        let report = A2aValidator.validate(Some(&json!({
            "endpoint": "https://agents.example.com/a2a",
            "capabilities": ["summarize", 7],
            "auth": {"type": "password"}
        })));
        let codes: Vec<_> = report.errors.iter().map(|i| i.code()).collect();
        assert_eq!(codes, vec!["a2a.auth.type", "a2a.capabilities.items"]);
    }
}
