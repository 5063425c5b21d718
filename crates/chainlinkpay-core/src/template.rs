//! Contract template definitions shared by the registry and the generator.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Contract template identifier.
///
/// One closed enumeration serves the mapper, the registry and the generator.
/// `Unknown` is what the mapper returns when no template fits; it never has a
/// registry entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TemplateId {
    Escrow,
    Split,
    Subscription,
    Unknown,
}

impl TemplateId {
    /// Ids that can be backed by a concrete template, in registry order.
    pub const CONCRETE: [TemplateId; 3] = [Self::Escrow, Self::Split, Self::Subscription];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Escrow => "ESCROW",
            Self::Split => "SPLIT",
            Self::Subscription => "SUBSCRIPTION",
            Self::Unknown => "UNKNOWN",
        }
    }

    pub fn is_concrete(&self) -> bool {
        !matches!(self, Self::Unknown)
    }
}

impl fmt::Display for TemplateId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Error)]
#[error("unknown template id: {0}")]
pub struct ParseTemplateIdError(pub String);

impl FromStr for TemplateId {
    type Err = ParseTemplateIdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "ESCROW" => Ok(Self::Escrow),
            "SPLIT" => Ok(Self::Split),
            "SUBSCRIPTION" => Ok(Self::Subscription),
            "UNKNOWN" => Ok(Self::Unknown),
            _ => Err(ParseTemplateIdError(s.to_string())),
        }
    }
}

/// Declared type of a placeholder slot, deciding how its value is sanitised.
///
/// Template files may name types this crate does not know; those land in
/// `Other` and are rejected at generation time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum PlaceholderType {
    Uint,
    Principal,
    String,
    Buffer,
    Other(String),
}

impl PlaceholderType {
    pub fn as_str(&self) -> &str {
        match self {
            Self::Uint => "uint",
            Self::Principal => "principal",
            Self::String => "string",
            Self::Buffer => "buffer",
            Self::Other(name) => name.as_str(),
        }
    }
}

impl From<String> for PlaceholderType {
    fn from(s: String) -> Self {
        match s.as_str() {
            "uint" => Self::Uint,
            "principal" => Self::Principal,
            "string" => Self::String,
            "buffer" => Self::Buffer,
            _ => Self::Other(s),
        }
    }
}

impl From<PlaceholderType> for String {
    fn from(t: PlaceholderType) -> Self {
        match t {
            PlaceholderType::Other(name) => name,
            other => other.as_str().to_string(),
        }
    }
}

impl fmt::Display for PlaceholderType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A `{{key}}` slot declared by a template.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlaceholderSpec {
    pub key: String,
    #[serde(rename = "type")]
    pub kind: PlaceholderType,
    pub required: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl PlaceholderSpec {
    pub fn required(key: &str, kind: PlaceholderType, description: &str) -> Self {
        Self {
            key: key.to_string(),
            kind,
            required: true,
            description: Some(description.to_string()),
        }
    }

    pub fn optional(key: &str, kind: PlaceholderType, description: &str) -> Self {
        Self {
            required: false,
            ..Self::required(key, kind, description)
        }
    }

    /// The literal marker this slot occupies in template source.
    pub fn marker(&self) -> String {
        format!("{{{{{}}}}}", self.key)
    }
}

/// A canonical contract template. Immutable once registered.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContractTemplate {
    pub id: TemplateId,
    pub name: String,
    pub description: String,
    pub version: String,
    pub source: String,
    pub placeholders: Vec<PlaceholderSpec>,
}

impl ContractTemplate {
    pub fn placeholder(&self, key: &str) -> Option<&PlaceholderSpec> {
        self.placeholders.iter().find(|p| p.key == key)
    }

    pub fn required_keys(&self) -> impl Iterator<Item = &str> {
        self.placeholders
            .iter()
            .filter(|p| p.required)
            .map(|p| p.key.as_str())
    }
}

/// Caller-supplied placeholder values, untyped at the boundary.
pub type TemplateInput = BTreeMap<String, serde_json::Value>;

/// Generation metadata recorded alongside the rendered source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContractMetadata {
    pub version: String,
    /// Substituted keys, in template declaration order.
    pub filled_keys: Vec<String>,
}

/// Output of a successful generation call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GeneratedContract {
    pub template_id: TemplateId,
    pub source: String,
    pub metadata: ContractMetadata,
}
