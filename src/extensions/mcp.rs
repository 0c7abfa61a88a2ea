//! Model Context Protocol tool servers.

use super::{check_transport_security, Expectation, ExtensionBlock, ExtensionValidator, FieldCheck};
use crate::result::PartialResult;
use crate::rules::{RuleOutcome, Severity};

pub const TRANSPORTS: &[&str] = &["stdio", "http", "sse"];

const FIELDS: &[FieldCheck] = &[
    FieldCheck::required("transport", Expectation::OneOf(TRANSPORTS), Severity::High),
    FieldCheck::optional("server_url", Expectation::Url, Severity::High),
    FieldCheck::optional("command", Expectation::String, Severity::High),
    FieldCheck::recommended("tools", Expectation::Array, Severity::Low)
        .hint("List the tools this server exposes"),
    FieldCheck::optional("timeout_ms", Expectation::IntRange(100, 600_000), Severity::Medium),
];

pub struct McpValidator;

impl ExtensionValidator for McpValidator {
    fn name(&self) -> &str {
        "mcp"
    }

    fn description(&self) -> &str {
        "Model Context Protocol tool server"
    }

    fn field_checks(&self) -> &[FieldCheck] {
        FIELDS
    }

    fn extra_checks(&self, block: &ExtensionBlock<'_>, report: &mut PartialResult) {
        // stdio launches a process; the network transports need somewhere to connect.
        let (field, present) = match block.str_field("transport") {
            Some("stdio") => ("command", block.get("command").is_some()),
            Some("http" | "sse") => ("server_url", block.get("server_url").is_some()),
            _ => return,
        };
        let outcome = if present {
            RuleOutcome::pass()
        } else {
            RuleOutcome::fail(format!(
                "extensions.mcp.{} is required for the selected transport",
                field
            ))
            .at(block.pointer(field))
        };
        report.record(&block.code("transport.target"), Severity::High, true, outcome);

        check_transport_security(block, "server_url", report);
    }
}
