//! CrewAI crew membership.

use super::{Expectation, ExtensionValidator, FieldCheck};
use crate::rules::Severity;

const FIELDS: &[FieldCheck] = &[
    FieldCheck::required("role", Expectation::String, Severity::High),
    FieldCheck::recommended("goal", Expectation::String, Severity::Low)
        .hint("A goal keeps the crew manager's delegation focused"),
    FieldCheck::optional("backstory", Expectation::String, Severity::Low),
    FieldCheck::optional("allow_delegation", Expectation::Bool, Severity::Medium),
    FieldCheck::optional("max_iter", Expectation::IntRange(1, 100), Severity::Medium),
];

pub struct CrewAiValidator;

impl ExtensionValidator for CrewAiValidator {
    fn name(&self) -> &str {
        "crewai"
    }

    fn description(&self) -> &str {
        "CrewAI multi-agent crew"
    }

    fn field_checks(&self) -> &[FieldCheck] {
        FIELDS
    }
}
