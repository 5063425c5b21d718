//! Natural-language intent layer: pattern extraction and template mapping.

mod extract;
mod mapper;

pub use extract::{MAX_PRINCIPALS, extract_params};
pub use mapper::{MapperConfig, map_to_intent, map_to_intent_with};

use chainlinkpay_core::Intent;
use tracing::debug;

/// Extract parameters from `text` and map them to an intent.
pub fn interpret_natural_language(text: &str) -> Intent {
    interpret_with(text, &MapperConfig::default())
}

pub fn interpret_with(text: &str, config: &MapperConfig) -> Intent {
    let params = extract_params(text);
    let intent = map_to_intent_with(&params, config);
    debug!(
        template = %intent.template,
        confidence = intent.confidence,
        principals = params.principals.len(),
        suggestions = intent.suggestions.len(),
        "interpreted request"
    );
    intent
}
