//! Validation Options and Run Context

use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs;
use std::path::Path;
use std::sync::Arc;

use crate::error::{EngineError, Result};
use crate::manifest::Manifest;
use crate::rules::Rule;
use crate::structural::BUILTIN_RULE_NAMES;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum SubjectType {
    ManifestStructural,
    Extension,
    ApiContract,
}

impl fmt::Display for SubjectType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::ManifestStructural => "manifest-structural",
            Self::Extension => "extension",
            Self::ApiContract => "api-contract",
        })
    }
}

/// Caller-facing knobs for a validation run.
#[derive(Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct ValidationOptions {
    /// Promote medium-or-higher warnings to errors.
    #[serde(default)]
    pub strict: bool,
    /// Run validators for experimental extensions.
    #[serde(default)]
    pub include_drafts: bool,
    /// Skip rules that are not mandatory.
    #[serde(default)]
    pub skip_optional: bool,
    /// Extra structural rules, evaluated after the built-in set.
    #[serde(skip)]
    pub custom_rules: Vec<Arc<dyn Rule>>,
}

impl ValidationOptions {
    pub fn with_strict(mut self, strict: bool) -> Self {
        self.strict = strict;
        self
    }

    pub fn with_include_drafts(mut self, include: bool) -> Self {
        self.include_drafts = include;
        self
    }

    pub fn with_skip_optional(mut self, skip: bool) -> Self {
        self.skip_optional = skip;
        self
    }

    /// Add a custom structural rule. A name already used by a built-in rule
    /// or an earlier custom rule is a configuration error.
    pub fn with_custom_rule(mut self, rule: impl Rule + 'static) -> Result<Self> {
        let name = rule.name();
        let taken = BUILTIN_RULE_NAMES.contains(&name)
            || self.custom_rules.iter().any(|r| r.name() == name);
        if taken {
            return Err(EngineError::DuplicateRule(name.to_string()));
        }
        self.custom_rules.push(Arc::new(rule));
        Ok(self)
    }

    /// Load options from a JSON file. Custom rules cannot be expressed in a
    /// file and are always empty.
    pub fn from_json_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        serde_json::from_str(&content)
            .map_err(|e| EngineError::Config(format!("{}: {}", path.display(), e)))
    }
}

impl fmt::Debug for ValidationOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let custom: Vec<&str> = self.custom_rules.iter().map(|r| r.name()).collect();
        f.debug_struct("ValidationOptions")
            .field("strict", &self.strict)
            .field("include_drafts", &self.include_drafts)
            .field("skip_optional", &self.skip_optional)
            .field("custom_rules", &custom)
            .finish()
    }
}

/// Immutable context shared by every rule in one run.
#[derive(Debug, Clone)]
pub struct ValidationContext {
    pub subject_type: SubjectType,
    pub subject_version: String,
    pub options: ValidationOptions,
}

impl ValidationContext {
    pub fn new(
        subject_type: SubjectType,
        subject_version: impl Into<String>,
        options: ValidationOptions,
    ) -> Self {
        Self {
            subject_type,
            subject_version: subject_version.into(),
            options,
        }
    }

    /// Context for a whole-manifest run, targeting the manifest's own schema version.
    pub fn for_manifest(manifest: &Manifest, options: ValidationOptions) -> Self {
        let version = manifest.schema_version().unwrap_or("unknown");
        Self::new(SubjectType::ManifestStructural, version, options)
    }
}
