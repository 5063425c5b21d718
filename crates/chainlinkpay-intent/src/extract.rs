//! Pattern-based parameter extraction from free-form payment requests.
//!
//! Extraction is total: text with no recognisable content yields empty
//! sequences, never an error.

use std::sync::LazyLock;

use chainlinkpay_core::{ExtractedParams, Keyword, Period, find_principals};
use regex::Regex;

/// Upper bound on principals reported per input.
pub const MAX_PRINCIPALS: usize = 10;

/// A number token with an optional trailing unit. Units that belong to the
/// percentage and period detectors are captured too so they can be skipped.
static AMOUNT_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(\d+(?:\.\d+)?)(?:\s*(ustx|stx|%|days?|blocks?|\$))?").unwrap()
});

static PERCENT_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\b(\d{1,3})%").unwrap());

static DAYS_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?i)\b(\d+)\s*days?\b").unwrap());

static BLOCKS_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\b(\d+)\s*blocks?\b").unwrap());

/// Keyword tests, each evaluated independently and in this order.
static KEYWORD_RES: LazyLock<Vec<(Keyword, Regex)>> = LazyLock::new(|| {
    [
        (Keyword::Escrow, r"(?i)escrow"),
        (Keyword::Split, r"(?i)split|share|percentage"),
        (
            Keyword::Subscription,
            r"(?i)subscribe|subscription|every month|monthly|period",
        ),
        (Keyword::Delivery, r"(?i)deliver|delivery|milestone"),
        (Keyword::Deadline, r"(?i)deadline|expire"),
    ]
    .into_iter()
    .map(|(kw, pat)| (kw, Regex::new(pat).unwrap()))
    .collect()
});

/// Extract candidate parameters from `text`.
pub fn extract_params(text: &str) -> ExtractedParams {
    ExtractedParams {
        amounts: extract_amounts(text),
        principals: find_principals(text)
            .take(MAX_PRINCIPALS)
            .map(str::to_string)
            .collect(),
        percentages: extract_percentages(text),
        periods: extract_periods(text),
        deadlines: Vec::new(),
        keywords: extract_keywords(text),
    }
}

fn extract_amounts(text: &str) -> Vec<f64> {
    AMOUNT_RE
        .captures_iter(text)
        .filter(|caps| {
            caps.get(2).is_none_or(|unit| {
                let unit = unit.as_str().to_ascii_lowercase();
                matches!(unit.as_str(), "ustx" | "stx" | "$")
            })
        })
        .filter_map(|caps| caps[1].parse::<f64>().ok())
        .filter(|n| n.is_finite())
        .collect()
}

fn extract_percentages(text: &str) -> Vec<u32> {
    PERCENT_RE
        .captures_iter(text)
        .filter_map(|caps| caps[1].parse::<u32>().ok())
        .filter(|pct| *pct <= 100)
        .collect()
}

/// At most one day-based and one block-based entry, days first.
fn extract_periods(text: &str) -> Vec<Period> {
    let mut periods = Vec::with_capacity(2);
    if let Some(days) = first_count(&DAYS_RE, text) {
        periods.push(Period::days(days));
    }
    if let Some(blocks) = first_count(&BLOCKS_RE, text) {
        periods.push(Period::blocks(blocks));
    }
    periods
}

fn first_count(re: &Regex, text: &str) -> Option<u64> {
    re.captures(text)
        .and_then(|caps| caps[1].parse::<u64>().ok())
}

fn extract_keywords(text: &str) -> Vec<Keyword> {
    KEYWORD_RES
        .iter()
        .filter(|(_, re)| re.is_match(text))
        .map(|(kw, _)| *kw)
        .collect()
}
