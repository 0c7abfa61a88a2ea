//! Langflow workflow orchestration.

use super::{check_transport_security, Expectation, ExtensionBlock, ExtensionValidator, FieldCheck};
use crate::result::PartialResult;
use crate::rules::Severity;

const FIELDS: &[FieldCheck] = &[
    FieldCheck::required("flow_id", Expectation::String, Severity::High)
        .hint("Set flow_id to the Langflow flow this agent runs"),
    FieldCheck::optional("endpoint", Expectation::Url, Severity::High),
    FieldCheck::optional("tweaks", Expectation::Object, Severity::Medium),
    FieldCheck::optional("timeout_seconds", Expectation::IntRange(1, 3600), Severity::Medium),
];

pub struct LangflowValidator;

impl ExtensionValidator for LangflowValidator {
    fn name(&self) -> &str {
        "langflow"
    }

    fn description(&self) -> &str {
        "Langflow visual workflow orchestration"
    }

    fn field_checks(&self) -> &[FieldCheck] {
        FIELDS
    }

    fn extra_checks(&self, block: &ExtensionBlock<'_>, report: &mut PartialResult) {
        check_transport_security(block, "endpoint", report);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_flow_id_required() {
        let report = LangflowValidator.validate(Some(&json!({"enabled": true})));
        assert_eq!(report.errors.len(), 1);
        assert_eq!(report.errors[0].path(), Some("/extensions/langflow/flow_id"));
    }

    #[test]
    fn test_timeout_range() {
        let report = LangflowValidator.validate(Some(&json!({"flow_id": "f-1", "timeout_seconds": 0})));
        assert_eq!(report.errors.len(), 1);
        assert!(report.errors[0].detail().message.contains("between 1 and 3600"));
    }

    #[test]
    fn test_plain_http_remote_endpoint_warns() {
        let report = LangflowValidator.validate(Some(&json!({
            "flow_id": "f-1",
            "endpoint": "http://langflow.example.com/api"
        })));
        assert!(report.valid());
        assert_eq!(report.warnings.len(), 1);
        assert_eq!(report.warnings[0].code(), "langflow.endpoint.tls");

        let local = LangflowValidator.validate(Some(&json!({
            "flow_id": "f-1",
            "endpoint": "http://localhost:7860"
        })));
        assert!(local.warnings.is_empty());
    }
}
