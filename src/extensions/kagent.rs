//! Kubernetes deployment via kagent.

use super::{Expectation, ExtensionValidator, FieldCheck};
use crate::rules::Severity;

const FIELDS: &[FieldCheck] = &[
    FieldCheck::optional("namespace", Expectation::DnsLabel, Severity::High),
    FieldCheck::optional("replicas", Expectation::IntRange(1, 100), Severity::Medium),
    FieldCheck::recommended("resources", Expectation::Object, Severity::Medium)
        .hint("Set resources.limits so the scheduler can place the agent"),
    FieldCheck::optional("resources.limits", Expectation::Object, Severity::Medium),
    FieldCheck::optional("service_account", Expectation::DnsLabel, Severity::Medium),
];

pub struct KagentValidator;

impl ExtensionValidator for KagentValidator {
    fn name(&self) -> &str {
        "kagent"
    }

    fn description(&self) -> &str {
        "Kubernetes agent deployment"
    }

    fn field_checks(&self) -> &[FieldCheck] {
        FIELDS
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_missing_resources_is_medium_warning() {
        let report = KagentValidator.validate(Some(&json!({"namespace": "agents", "replicas": 2})));
        assert!(report.valid());
        assert_eq!(report.warnings.len(), 1);
        assert_eq!(report.warnings[0].detail().severity, Some(Severity::Medium));
    }

    #[test]
    fn test_namespace_and_replicas_shape() {
        let report = KagentValidator.validate(Some(&json!({
            "namespace": "Agents_Prod",
            "replicas": 500,
            "resources": {"limits": {"cpu": "1"}}
        })));
        assert_eq!(report.errors.len(), 2);
    }
}
