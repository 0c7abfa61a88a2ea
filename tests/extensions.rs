//! Extension Isolation Tests
//!
//! A platform block can only fail its own namespace.

use serde_json::{json, Value};

use ossa_compliance::{
    Engine, EngineError, ExtensionValidator, FieldCheck, Manifest, ValidationOptions,
    ValidatorRegistry,
};

fn with_extensions(extensions: Value) -> Value {
    json!({
        "apiVersion": "ossa/v0.3.0",
        "kind": "Agent",
        "metadata": {"name": "demo-agent", "version": "1.0.0"},
        "spec": {"role": "assistant"},
        "extensions": extensions
    })
}

#[test]
fn bad_block_only_fails_its_namespace() {
    let engine = Engine::with_builtin().unwrap();
    let result = engine
        .validate_value(
            with_extensions(json!({
                "cursor": {"enabled": true, "agent_type": "autopilot"},
                "langflow": {"enabled": true, "flow_id": "f-123", "endpoint": "https://flows.example.com"}
            })),
            ValidationOptions::default(),
        )
        .unwrap();

    assert!(!result.valid);
    assert!(!result.errors.is_empty());
    for issue in result.errors.iter().chain(result.warnings.iter()) {
        let path = issue.path().unwrap_or_default();
        assert!(path.starts_with("/extensions/cursor"), "unexpected issue at {path}");
    }
}

#[test]
fn issues_follow_registration_order() {
    let engine = Engine::with_builtin().unwrap();
    let result = engine
        .validate_value(
            with_extensions(json!({
                "crewai": {"enabled": true},
                "cursor": {"agent_type": 7}
            })),
            ValidationOptions::default(),
        )
        .unwrap();

    let codes: Vec<_> = result.errors.iter().map(|e| e.code()).collect();
    assert_eq!(codes, vec!["cursor.agent_type", "crewai.role"]);
}

#[test]
fn disabled_block_is_ignored() {
    let engine = Engine::with_builtin().unwrap();
    let enabled = engine
        .validate_value(with_extensions(json!({})), ValidationOptions::default())
        .unwrap();
    let disabled = engine
        .validate_value(
            with_extensions(json!({"mcp": {"enabled": false, "transport": "carrier-pigeon"}})),
            ValidationOptions::default(),
        )
        .unwrap();

    assert!(disabled.valid);
    assert_eq!(disabled.metadata.total_checks, enabled.metadata.total_checks);
    assert_eq!(disabled.score, 100);
}

#[test]
fn validate_extension_reads_only_its_block() {
    let engine = Engine::with_builtin().unwrap();
    let manifest = Manifest::from_value(with_extensions(json!({
        "kagent": {"namespace": "Prod_Agents"},
        "crewai": {"role": "researcher", "goal": "find sources"}
    })))
    .unwrap();

    let crew = engine.validate_extension("crewai", &manifest).unwrap();
    assert!(crew.valid());
    assert!(crew.warnings.is_empty());

    let kagent = engine.validate_extension("kagent", &manifest).unwrap();
    assert!(!kagent.valid());
    assert_eq!(kagent.errors[0].path(), Some("/extensions/kagent/namespace"));

    let absent = engine.validate_extension("mcp", &manifest).unwrap();
    assert!(absent.valid());
    assert_eq!(absent.total_checks, 0);
}

struct Zapier;

impl ExtensionValidator for Zapier {
    fn name(&self) -> &str {
        "zapier"
    }

    fn description(&self) -> &str {
        "Zapier automation hooks"
    }

    fn field_checks(&self) -> &[FieldCheck] {
        const FIELDS: &[FieldCheck] = &[FieldCheck::required(
            "zap_id",
            ossa_compliance::extensions::Expectation::String,
            ossa_compliance::Severity::High,
        )];
        FIELDS
    }
}

#[test]
fn third_party_validator_turns_unknown_into_checked() {
    let value = with_extensions(json!({"zapier": {"enabled": true}}));

    let builtin = Engine::with_builtin().unwrap();
    let before = builtin.validate_value(value.clone(), ValidationOptions::default()).unwrap();
    assert!(before.valid);
    assert_eq!(before.warnings[0].code(), "unknown-extension");

    let mut registry = ValidatorRegistry::with_builtin().unwrap();
    registry.register(Box::new(Zapier)).unwrap();
    let err = registry.register(Box::new(Zapier)).unwrap_err();
    assert!(matches!(err, EngineError::DuplicateValidator(_)));

    let engine = Engine::new(registry);
    let after = engine.validate_value(value, ValidationOptions::default()).unwrap();
    assert!(!after.valid);
    assert_eq!(after.errors[0].code(), "zapier.zap_id");
    assert!(after.warnings.is_empty());
}
