//! Engine error taxonomy.
//!
//! Only setup problems and unusable input surface as errors. Rule
//! violations are data and live inside [`crate::ValidationResult`].

use thiserror::Error;

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("Duplicate rule name: {0}")]
    DuplicateRule(String),

    #[error("Extension validator already registered: {0}")]
    DuplicateValidator(String),

    #[error("No validator registered for extension: {0}")]
    UnknownExtension(String),

    #[error("Malformed manifest: {0}")]
    MalformedManifest(String),

    #[error("Malformed API contract: {0}")]
    MalformedContract(String),

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl EngineError {
    /// Configuration errors are raised while assembling rules and validators,
    /// never during a validation run.
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            Self::DuplicateRule(_) | Self::DuplicateValidator(_) | Self::Config(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, EngineError>;
