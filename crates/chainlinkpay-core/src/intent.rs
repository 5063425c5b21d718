//! Types produced by intent extraction and mapping.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::template::{TemplateId, TemplateInput};

/// Domain tags recognised in free-form text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Keyword {
    Escrow,
    Split,
    Subscription,
    Delivery,
    Deadline,
}

impl Keyword {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Escrow => "escrow",
            Self::Split => "split",
            Self::Subscription => "subscription",
            Self::Delivery => "delivery",
            Self::Deadline => "deadline",
        }
    }
}

/// A recurring or relative time span. Exactly one side is set by the extractor.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Period {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub blocks: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub days: Option<u64>,
}

impl Period {
    pub fn blocks(n: u64) -> Self {
        Self {
            blocks: Some(n),
            days: None,
        }
    }

    pub fn days(n: u64) -> Self {
        Self {
            blocks: None,
            days: Some(n),
        }
    }
}

/// An absolute deadline. Reserved: the extractor does not produce these yet.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Deadline {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub block_height: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub days: Option<u64>,
}

/// Candidate parameters pulled out of one piece of text.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExtractedParams {
    /// Human STX units, not yet scaled to micro-STX.
    pub amounts: Vec<f64>,
    pub principals: Vec<String>,
    pub percentages: Vec<u32>,
    pub periods: Vec<Period>,
    pub deadlines: Vec<Deadline>,
    pub keywords: Vec<Keyword>,
}

impl ExtractedParams {
    pub fn has_keyword(&self, keyword: Keyword) -> bool {
        self.keywords.contains(&keyword)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IssueLevel {
    Error,
    Warning,
}

/// A diagnostic attached to an intent or produced by source validation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Issue {
    pub level: IssueLevel,
    pub message: String,
}

impl Issue {
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            level: IssueLevel::Error,
            message: message.into(),
        }
    }

    pub fn warning(message: impl Into<String>) -> Self {
        Self {
            level: IssueLevel::Warning,
            message: message.into(),
        }
    }

    pub fn is_error(&self) -> bool {
        self.level == IssueLevel::Error
    }
}

/// Best-guess interpretation of a request. Callers must surface
/// `confidence` and `suggestions` before treating the placeholders as final.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Intent {
    pub template: TemplateId,
    pub placeholders: BTreeMap<String, String>,
    pub confidence: f64,
    pub issues: Vec<Issue>,
    pub suggestions: Vec<String>,
}

impl Intent {
    /// Placeholder values as generator input; each value stays a JSON string.
    pub fn to_template_input(&self) -> TemplateInput {
        self.placeholders
            .iter()
            .map(|(k, v)| (k.clone(), serde_json::Value::String(v.clone())))
            .collect()
    }
}
