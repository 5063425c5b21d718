//! Placeholder interpolation with type-specific sanitisation.
//!
//! Generation is all-or-nothing: the first missing required key or invalid
//! value aborts the call and no partial contract is returned.

use std::sync::LazyLock;

use chainlinkpay_core::{
    ContractMetadata, ContractTemplate, GeneratedContract, PlaceholderSpec, PlaceholderType,
    TemplateInput, is_principal,
};
use regex::Regex;
use serde_json::Value;
use tracing::debug;

use crate::error::GenerateError;

/// Longest accepted `string` placeholder value, in characters.
pub const MAX_STRING_CHARS: usize = 256;

static BUFFER_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^0x[0-9a-f]+$").unwrap());

/// Fill `template` with `input`.
pub fn generate_contract(
    template: &ContractTemplate,
    input: &TemplateInput,
) -> Result<GeneratedContract, GenerateError> {
    if let Some(key) = template.required_keys().find(|key| !input.contains_key(*key)) {
        return Err(GenerateError::MissingPlaceholder {
            key: key.to_string(),
        });
    }

    // Sanitise everything before touching the source.
    let mut rendered = Vec::new();
    for spec in &template.placeholders {
        if let Some(value) = input.get(&spec.key) {
            rendered.push((spec, sanitize_value(spec, value)?));
        }
    }

    let mut source = template.source.clone();
    for (spec, value) in &rendered {
        source = source.replace(&spec.marker(), value);
    }

    for key in input.keys().filter(|k| template.placeholder(k).is_none()) {
        debug!(template = %template.id, key = %key, "ignoring undeclared input key");
    }

    let filled_keys: Vec<String> = rendered.iter().map(|(spec, _)| spec.key.clone()).collect();
    debug!(template = %template.id, filled = filled_keys.len(), "contract generated");

    Ok(GeneratedContract {
        template_id: template.id,
        source,
        metadata: ContractMetadata {
            version: template.version.clone(),
            filled_keys,
        },
    })
}

/// Render one value as Clarity source text for its declared type.
pub fn sanitize_value(spec: &PlaceholderSpec, value: &Value) -> Result<String, GenerateError> {
    let key = || spec.key.clone();
    match &spec.kind {
        PlaceholderType::Principal => match value {
            Value::String(s) if is_principal(s) => Ok(s.clone()),
            _ => Err(GenerateError::InvalidPrincipal { key: key() }),
        },
        PlaceholderType::Uint => sanitize_uint(value)
            .map(|n| format!("u{n}"))
            .ok_or_else(|| GenerateError::InvalidUint { key: key() }),
        PlaceholderType::String => match value {
            Value::String(s) => {
                let len = s.chars().count();
                if len > MAX_STRING_CHARS {
                    return Err(GenerateError::StringTooLong {
                        key: key(),
                        len,
                        max: MAX_STRING_CHARS,
                    });
                }
                Ok(format!("\"{}\"", escape_string(s)))
            }
            _ => Err(GenerateError::InvalidString { key: key() }),
        },
        PlaceholderType::Buffer => match value {
            Value::String(s) => {
                let lower = s.to_ascii_lowercase();
                if BUFFER_RE.is_match(&lower) {
                    Ok(lower)
                } else {
                    Err(GenerateError::InvalidBuffer { key: key() })
                }
            }
            _ => Err(GenerateError::InvalidBuffer { key: key() }),
        },
        PlaceholderType::Other(kind) => Err(GenerateError::UnsupportedPlaceholderType {
            key: key(),
            kind: kind.clone(),
        }),
    }
}

/// Coerce to a non-negative integer, flooring fractions.
fn sanitize_uint(value: &Value) -> Option<u128> {
    let n = match value {
        Value::Number(n) => {
            if let Some(u) = n.as_u64() {
                return Some(u128::from(u));
            }
            n.as_f64()?
        }
        Value::String(s) => {
            let s = s.trim();
            if s.is_empty() {
                return None;
            }
            if s.bytes().all(|b| b.is_ascii_digit()) {
                return s.parse::<u128>().ok();
            }
            s.parse::<f64>().ok()?
        }
        _ => return None,
    };

    if !n.is_finite() || n < 0.0 {
        return None;
    }
    let floored = n.floor();
    // u128::MAX as f64 rounds up to 2^128.
    if floored >= u128::MAX as f64 {
        return None;
    }
    Some(floored as u128)
}

/// Escape a value for a Clarity string literal and break up `{{`/`}}` so it
/// cannot form a placeholder marker.
fn escape_string(s: &str) -> String {
    let mut out = s.replace('\\', "\\\\").replace('"', "\\\"");
    // A single pass leaves `{{` behind in runs such as `{{{`.
    while out.contains("{{") {
        out = out.replace("{{", "{ {");
    }
    while out.contains("}}") {
        out = out.replace("}}", "} }");
    }
    out
}
