//! OSSA Compliance - Manifest Validation Engine
//!
//! # Guarantees
//! 1. Structure Before Extensions
//! 2. Violations Are Data, Not Errors
//! 3. Extensions Are Isolated
//! 4. Unknown Extensions Never Break Validation
//! 5. Deterministic Scores

pub mod context;
pub mod contract;
pub mod engine;
pub mod error;
pub mod extensions;
pub mod format;
pub mod hashing;
pub mod manifest;
pub mod result;
pub mod rules;
pub mod scoring;
pub mod structural;

pub use context::{SubjectType, ValidationContext, ValidationOptions};
pub use engine::{Engine, RunState, ValidatorRegistry};
pub use error::{EngineError, Result};
pub use extensions::{ExtensionReport, ExtensionValidator, FieldCheck};
pub use format::{render, OutputFormat};
pub use manifest::{Kind, Manifest, Metadata};
pub use result::{IssueDetail, ValidationIssue, ValidationResult};
pub use rules::{FnRule, Rule, RuleOutcome, RuleScope, Severity};

pub const VALIDATOR_VERSION: &str = env!("CARGO_PKG_VERSION");
