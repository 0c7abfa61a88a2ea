//! Manifest Model - Read-Only Subject Under Test
//!
//! Loading from disk or git is a caller concern. The engine only accepts
//! an in-memory JSON value and never mutates it.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

use crate::error::{EngineError, Result};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum Kind {
    Agent,
    Task,
    Workflow,
}

impl Kind {
    pub const ALL: [Kind; 3] = [Kind::Agent, Kind::Task, Kind::Workflow];

    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "Agent" => Some(Self::Agent),
            "Task" => Some(Self::Task),
            "Workflow" => Some(Self::Workflow),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Agent => "Agent",
            Self::Task => "Task",
            Self::Workflow => "Workflow",
        }
    }
}

impl std::fmt::Display for Kind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Metadata {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<Value>,
    #[serde(default, deserialize_with = "object_or_empty", skip_serializing_if = "Map::is_empty")]
    pub labels: Map<String, Value>,
    #[serde(default, deserialize_with = "object_or_empty", skip_serializing_if = "Map::is_empty")]
    pub annotations: Map<String, Value>,
}

impl Metadata {
    pub fn name_str(&self) -> Option<&str> {
        self.name.as_ref().and_then(Value::as_str)
    }

    pub fn version_str(&self) -> Option<&str> {
        self.version.as_ref().and_then(Value::as_str)
    }
}

/// An OSSA manifest.
///
/// Scalar fields stay raw JSON so a number where a string belongs is a rule
/// violation, not a parse failure. Only a non-object root is rejected.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Manifest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_version: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<Value>,
    #[serde(default, deserialize_with = "lenient")]
    pub metadata: Metadata,
    #[serde(default, skip_serializing_if = "Value::is_null")]
    pub spec: Value,
    #[serde(default, skip_serializing_if = "Value::is_null")]
    pub extensions: Value,
}

/// Deserialize `T`, falling back to its default when the shape is wrong.
/// Rules then report the fields as missing at their own paths.
fn lenient<'de, D, T>(deserializer: D) -> std::result::Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned + Default,
{
    let value = Value::deserialize(deserializer)?;
    Ok(serde_json::from_value(value).unwrap_or_default())
}

fn object_or_empty<'de, D>(deserializer: D) -> std::result::Result<Map<String, Value>, D::Error>
where
    D: Deserializer<'de>,
{
    match Value::deserialize(deserializer)? {
        Value::Object(map) => Ok(map),
        _ => Ok(Map::new()),
    }
}

impl Manifest {
    /// Build a manifest from an already-parsed JSON value.
    pub fn from_value(value: Value) -> Result<Self> {
        if !value.is_object() {
            return Err(EngineError::MalformedManifest(format!(
                "expected a JSON object, found {}",
                value_type_name(&value)
            )));
        }
        serde_json::from_value(value).map_err(|e| EngineError::MalformedManifest(e.to_string()))
    }

    pub fn from_json_str(raw: &str) -> Result<Self> {
        let value: Value = serde_json::from_str(raw)?;
        Self::from_value(value)
    }

    pub fn api_version_str(&self) -> Option<&str> {
        self.api_version.as_ref().and_then(Value::as_str)
    }

    pub fn kind_str(&self) -> Option<&str> {
        self.kind.as_ref().and_then(Value::as_str)
    }

    pub fn parsed_kind(&self) -> Option<Kind> {
        self.kind_str().and_then(Kind::parse)
    }

    /// Version part of `apiVersion`, e.g. `v0.3.0` for `ossa/v0.3.0`.
    pub fn schema_version(&self) -> Option<&str> {
        self.api_version_str().and_then(|v| v.strip_prefix("ossa/"))
    }

    pub fn spec_field(&self, key: &str) -> Option<&Value> {
        self.spec.get(key)
    }

    /// Raw payload under `extensions.<name>`.
    pub fn extension(&self, name: &str) -> Option<&Value> {
        self.extensions.get(name)
    }

    pub fn extension_names(&self) -> impl Iterator<Item = &str> {
        self.extensions
            .as_object()
            .into_iter()
            .flat_map(|map| map.keys().map(String::as_str))
    }
}

/// Resolve a dotted field name (`auth.type`) inside an object.
pub fn lookup<'a>(root: &'a Map<String, Value>, dotted: &str) -> Option<&'a Value> {
    let mut parts = dotted.split('.');
    let mut current = root.get(parts.next()?)?;
    for part in parts {
        current = current.as_object()?.get(part)?;
    }
    Some(current)
}

/// RFC 6901 pointer built from path segments.
pub fn json_pointer<'a>(segments: impl IntoIterator<Item = &'a str>) -> String {
    let mut out = String::new();
    for segment in segments {
        out.push('/');
        out.push_str(&segment.replace('~', "~0").replace('/', "~1"));
    }
    out
}

pub fn value_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
