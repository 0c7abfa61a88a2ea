//! Rule Engine - Single Entry Point
//!
//! Structural checks always run first. Extension validators follow in
//! registration order, then the engine scores and seals the result. The
//! engine holds no per-call state, so one instance can serve many threads.

use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, info, info_span, warn};
use uuid::Uuid;

use crate::context::{SubjectType, ValidationContext, ValidationOptions};
use crate::contract::ContractValidator;
use crate::error::{EngineError, Result};
use crate::extensions::{builtin_validators, unknown_extension_warning, ExtensionReport, ExtensionValidator};
use crate::hashing::compute_digest;
use crate::manifest::{value_type_name, Manifest};
use crate::result::{PartialResult, ResultMetadata, ValidationResult};
use crate::rules::{RuleOutcome, Severity};
use crate::scoring::{compliance_score, promote_strict, FATAL_SCORE};
use crate::structural::StructuralValidator;
use crate::VALIDATOR_VERSION;

/// Lifecycle of one validation run.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum RunState {
    Pending,
    Running,
    Completed,
    FatalShortCircuit,
}

impl RunState {
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::FatalShortCircuit)
    }

    pub fn can_advance_to(self, next: RunState) -> bool {
        matches!(
            (self, next),
            (Self::Pending, Self::Running)
                | (Self::Running, Self::Completed)
                | (Self::Running, Self::FatalShortCircuit)
        )
    }
}

struct Run {
    state: RunState,
}

impl Run {
    fn new() -> Self {
        Self {
            state: RunState::Pending,
        }
    }

    fn advance(&mut self, next: RunState) {
        debug_assert!(
            self.state.can_advance_to(next),
            "illegal run transition {:?} -> {:?}",
            self.state,
            next
        );
        self.state = next;
    }
}

/// Extension validators keyed by the namespace they own, kept in
/// registration order.
#[derive(Default)]
pub struct ValidatorRegistry {
    validators: Vec<Box<dyn ExtensionValidator>>,
}

impl ValidatorRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry holding every platform validator this crate ships.
    pub fn with_builtin() -> Result<Self> {
        let mut registry = Self::new();
        for validator in builtin_validators() {
            registry.register(validator)?;
        }
        Ok(registry)
    }

    /// Register a validator under its own name. Names are never overwritten.
    pub fn register(&mut self, validator: Box<dyn ExtensionValidator>) -> Result<()> {
        if self.get(validator.name()).is_some() {
            return Err(EngineError::DuplicateValidator(validator.name().to_string()));
        }
        self.validators.push(validator);
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<&dyn ExtensionValidator> {
        self.validators
            .iter()
            .find(|v| v.name() == name)
            .map(|v| v.as_ref())
    }

    pub fn iter(&self) -> impl Iterator<Item = &dyn ExtensionValidator> {
        self.validators.iter().map(|v| v.as_ref())
    }

    pub fn names(&self) -> Vec<&str> {
        self.validators.iter().map(|v| v.name()).collect()
    }

    pub fn len(&self) -> usize {
        self.validators.len()
    }

    pub fn is_empty(&self) -> bool {
        self.validators.is_empty()
    }
}

pub struct Engine {
    structural: StructuralValidator,
    contract: ContractValidator,
    registry: ValidatorRegistry,
}

impl Engine {
    pub fn new(registry: ValidatorRegistry) -> Self {
        Self {
            structural: StructuralValidator::new(),
            contract: ContractValidator::new(),
            registry,
        }
    }

    /// Engine with every built-in platform validator registered.
    pub fn with_builtin() -> Result<Self> {
        Ok(Self::new(ValidatorRegistry::with_builtin()?))
    }

    pub fn registry(&self) -> &ValidatorRegistry {
        &self.registry
    }

    pub fn structural(&self) -> &StructuralValidator {
        &self.structural
    }

    /// Validate a whole manifest.
    ///
    /// Non-compliance is reported through the returned result. `Err` means
    /// the rule set itself is misconfigured (a custom rule reusing a name).
    pub fn validate(&self, manifest: &Manifest, ctx: &ValidationContext) -> Result<ValidationResult> {
        let run_id = Uuid::new_v4();
        let subject = manifest.metadata.name_str().unwrap_or("<unnamed>");
        let span = info_span!("ossa.validate", run_id = %run_id, subject = %subject);
        let _guard = span.enter();

        let mut run = Run::new();
        let digest = compute_digest(manifest)?;
        let structural = self.structural.validate(manifest, ctx)?;
        run.advance(RunState::Running);

        if structural.fatal {
            let reason = structural
                .errors
                .first()
                .map(|e| e.detail().message.clone())
                .unwrap_or_default();
            warn!(event = "validate.short_circuit", reason = %reason);
            run.advance(RunState::FatalShortCircuit);
            return Ok(self.seal(structural, FATAL_SCORE, ctx, run.state, Some(digest)));
        }

        let strict = ctx.options.strict;
        let mut merged = PartialResult::new();
        fold(&mut merged, structural, strict);

        if !manifest.extensions.is_null() && !manifest.extensions.is_object() {
            let mut block = PartialResult::new();
            block.record(
                "extensions",
                Severity::High,
                true,
                RuleOutcome::fail(format!(
                    "extensions must be an object, found {}",
                    value_type_name(&manifest.extensions)
                ))
                .at("/extensions"),
            );
            fold(&mut merged, block, strict);
        }

        for validator in self.registry.iter() {
            let Some(raw) = manifest.extension(validator.name()) else {
                continue;
            };
            if validator.experimental() && !ctx.options.include_drafts {
                debug!(extension = validator.name(), "skipping experimental extension");
                continue;
            }
            let report = validator.validate(Some(raw));
            debug!(
                scope = %validator.scope(),
                errors = report.errors.len(),
                warnings = report.warnings.len(),
                "extension validated"
            );
            fold(&mut merged, report, strict);
        }

        for name in manifest.extension_names() {
            if self.registry.get(name).is_none() {
                warn!(event = "validate.unknown_extension", extension = %name);
                merged.warning(unknown_extension_warning(name));
            }
        }

        let score = compliance_score(merged.passed_checks, merged.total_checks);
        run.advance(RunState::Completed);
        let result = self.seal(merged, score, ctx, run.state, Some(digest));
        info!(
            event = "validate.completed",
            valid = result.valid,
            score = result.score,
            errors = result.errors.len(),
            warnings = result.warnings.len(),
            "validation completed"
        );
        Ok(result)
    }

    /// Parse a raw JSON manifest and validate it against its own schema version.
    pub fn validate_value(&self, value: Value, options: ValidationOptions) -> Result<ValidationResult> {
        let manifest = Manifest::from_value(value)?;
        let ctx = ValidationContext::for_manifest(&manifest, options);
        self.validate(&manifest, &ctx)
    }

    /// Run one platform's checks in isolation, experimental or not.
    pub fn validate_extension(&self, name: &str, manifest: &Manifest) -> Result<ExtensionReport> {
        let validator = self
            .registry
            .get(name)
            .ok_or_else(|| EngineError::UnknownExtension(name.to_string()))?;
        Ok(validator.validate(manifest.extension(name)))
    }

    /// Validate an already-loaded OpenAPI document.
    pub fn validate_contract(&self, document: &Value, ctx: &ValidationContext) -> Result<ValidationResult> {
        let span = info_span!("ossa.validate_contract", run_id = %Uuid::new_v4());
        let _guard = span.enter();

        let mut run = Run::new();
        let digest = compute_digest(document)?;
        let report = self.contract.validate(document)?;
        run.advance(RunState::Running);
        debug!(scope = %self.contract.scope(), checks = report.total_checks, "contract checked");

        let mut merged = PartialResult::new();
        fold(&mut merged, report, ctx.options.strict);
        let score = compliance_score(merged.passed_checks, merged.total_checks);
        run.advance(RunState::Completed);

        let mut ctx = ctx.clone();
        ctx.subject_type = SubjectType::ApiContract;
        let result = self.seal(merged, score, &ctx, run.state, Some(digest));
        info!(event = "validate_contract.completed", valid = result.valid, score = result.score);
        Ok(result)
    }

    fn seal(
        &self,
        partial: PartialResult,
        score: u8,
        ctx: &ValidationContext,
        state: RunState,
        subject_digest: Option<String>,
    ) -> ValidationResult {
        debug_assert!(state.is_terminal());
        let metadata = ResultMetadata {
            validator_version: VALIDATOR_VERSION.to_string(),
            target_version: ctx.subject_version.clone(),
            timestamp: Utc::now(),
            subject_type: ctx.subject_type,
            total_checks: partial.total_checks,
            passed_checks: partial.passed_checks,
            state,
            subject_digest,
        };
        ValidationResult::assemble(partial, score, metadata)
    }
}

/// Promote (in strict mode) before appending so issues keep the order of
/// the validator that produced them.
fn fold(merged: &mut PartialResult, mut partial: PartialResult, strict: bool) {
    if strict {
        promote_strict(&mut partial);
    }
    merged.absorb(partial);
}
