//! Cursor IDE integration.

use serde_json::Value;

use super::{Expectation, ExtensionBlock, ExtensionValidator, FieldCheck};
use crate::result::PartialResult;
use crate::rules::{RuleOutcome, Severity};

pub const AGENT_TYPES: &[&str] = &["composer", "chat", "inline", "background"];

const FIELDS: &[FieldCheck] = &[
    FieldCheck::recommended("workspace_config.rules_file", Expectation::String, Severity::Low)
        .hint("Point rules_file at a .cursorrules file so the IDE picks up project conventions"),
    FieldCheck::optional("agent_type", Expectation::OneOf(AGENT_TYPES), Severity::High),
    FieldCheck::optional("capabilities", Expectation::Object, Severity::High),
    FieldCheck::optional("model.provider", Expectation::String, Severity::Medium),
    FieldCheck::optional("model.name", Expectation::String, Severity::Medium),
];

pub struct CursorValidator;

impl ExtensionValidator for CursorValidator {
    fn name(&self) -> &str {
        "cursor"
    }

    fn description(&self) -> &str {
        "Cursor IDE agent integration"
    }

    fn field_checks(&self) -> &[FieldCheck] {
        FIELDS
    }

    fn extra_checks(&self, block: &ExtensionBlock<'_>, report: &mut PartialResult) {
        let Some(caps) = block.get("capabilities").and_then(Value::as_object) else {
            return;
        };
        // Capability flags are switches; anything else is a typo for one.
        let bad: Vec<&str> = caps
            .iter()
            .filter(|(_, v)| !v.is_boolean())
            .map(|(k, _)| k.as_str())
            .collect();
        let outcome = if bad.is_empty() {
            RuleOutcome::pass()
        } else {
            RuleOutcome::fail(format!(
                "extensions.cursor.capabilities entries must be booleans: {}",
                bad.join(", ")
            ))
            .at(block.pointer("capabilities"))
        };
        report.record(&block.code("capabilities.flags"), Severity::High, true, outcome);
    }
}
