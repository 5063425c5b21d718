//! Template selection and placeholder population from extracted parameters.
//!
//! Selection is a fixed priority list (first match wins):
//!
//! 1. `escrow` keyword → ESCROW
//! 2. `split` keyword, or two or more percentages → SPLIT
//! 3. `subscription` keyword, or any period → SUBSCRIPTION
//! 4. otherwise → UNKNOWN
//!
//! Placeholders are filled positionally (first principal is the buyer, and so
//! on). The result is a guess; `suggestions` and `confidence` tell the caller
//! how much to trust it.

use std::collections::BTreeMap;

use chainlinkpay_core::{ExtractedParams, Intent, Keyword, TemplateId};
use serde::{Deserialize, Serialize};

const MICRO_STX_PER_STX: f64 = 1_000_000.0;

const BASE_CONFIDENCE: f64 = 0.5;
const TEMPLATE_BONUS: f64 = 0.3;
const EVIDENCE_BONUS: f64 = 0.2;

/// Tunables for [`map_to_intent_with`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct MapperConfig {
    /// Day-to-block conversion for day-based periods.
    pub blocks_per_day: u64,
    /// Cap confidence at 1.0.
    pub clamp_confidence: bool,
}

impl Default for MapperConfig {
    fn default() -> Self {
        Self {
            blocks_per_day: 144,
            clamp_confidence: true,
        }
    }
}

/// Map extracted parameters to an intent using the default config.
pub fn map_to_intent(params: &ExtractedParams) -> Intent {
    map_to_intent_with(params, &MapperConfig::default())
}

pub fn map_to_intent_with(params: &ExtractedParams, config: &MapperConfig) -> Intent {
    let template = select_template(params);

    let mut placeholders = BTreeMap::new();
    let mut suggestions = Vec::new();

    match template {
        TemplateId::Escrow => fill_escrow(params, &mut placeholders, &mut suggestions),
        TemplateId::Split => fill_split(params, &mut placeholders, &mut suggestions),
        TemplateId::Subscription => {
            fill_subscription(params, config, &mut placeholders, &mut suggestions)
        }
        TemplateId::Unknown => {}
    }

    Intent {
        template,
        placeholders,
        confidence: score(template, params, config),
        issues: Vec::new(),
        suggestions,
    }
}

fn select_template(params: &ExtractedParams) -> TemplateId {
    if params.has_keyword(Keyword::Escrow) {
        TemplateId::Escrow
    } else if params.has_keyword(Keyword::Split) || params.percentages.len() >= 2 {
        TemplateId::Split
    } else if params.has_keyword(Keyword::Subscription) || !params.periods.is_empty() {
        TemplateId::Subscription
    } else {
        TemplateId::Unknown
    }
}

fn score(template: TemplateId, params: &ExtractedParams, config: &MapperConfig) -> f64 {
    let mut confidence = BASE_CONFIDENCE;
    if template.is_concrete() {
        confidence += TEMPLATE_BONUS;
    }
    // One bonus, however many of these hold.
    if params.principals.len() >= 2 || params.percentages.len() >= 2 || !params.periods.is_empty()
    {
        confidence += EVIDENCE_BONUS;
    }
    if config.clamp_confidence {
        confidence = confidence.clamp(0.0, 1.0);
    }
    confidence
}

fn fill_escrow(
    params: &ExtractedParams,
    placeholders: &mut BTreeMap<String, String>,
    suggestions: &mut Vec<String>,
) {
    put_principal(placeholders, "buyer", params, 0);
    put_principal(placeholders, "seller", params, 1);
    put_principal(placeholders, "arbiter", params, 2);

    let deadline = params
        .deadlines
        .first()
        .and_then(|d| d.block_height)
        .or_else(|| params.periods.first().and_then(|p| p.blocks))
        .unwrap_or(0);
    placeholders.insert("deadline-height".into(), deadline.to_string());
    placeholders.insert("amount-ustx".into(), first_amount_ustx(params));

    if params.principals.len() < 2 {
        suggestions.push("Specify both buyer and seller addresses.".into());
    }
    if params.principals.len() < 3 {
        suggestions.push("Add an arbiter address to resolve disputes.".into());
    }
    if deadline == 0 {
        suggestions.push(
            "Set a deadline (in blocks) after which the buyer can be refunded.".into(),
        );
    }
}

fn fill_split(
    params: &ExtractedParams,
    placeholders: &mut BTreeMap<String, String>,
    suggestions: &mut Vec<String>,
) {
    put_principal(placeholders, "recipient-a", params, 0);
    put_principal(placeholders, "recipient-b", params, 1);

    let pct_a = params.percentages.first().copied().unwrap_or(0);
    let pct_b = params.percentages.get(1).copied().unwrap_or(0);
    placeholders.insert("pct-a".into(), pct_a.to_string());
    placeholders.insert("pct-b".into(), pct_b.to_string());

    if pct_a + pct_b != 100 {
        suggestions.push(format!(
            "Ensure percentages add up to 100 (currently {pct_a} + {pct_b} = {}).",
            pct_a + pct_b
        ));
    }
}

fn fill_subscription(
    params: &ExtractedParams,
    config: &MapperConfig,
    placeholders: &mut BTreeMap<String, String>,
    suggestions: &mut Vec<String>,
) {
    put_principal(placeholders, "provider", params, 0);
    put_principal(placeholders, "subscriber", params, 1);

    let period = params
        .periods
        .first()
        .and_then(|p| {
            p.blocks
                .or_else(|| p.days.map(|d| d.saturating_mul(config.blocks_per_day)))
        })
        .unwrap_or(0);
    placeholders.insert("period".into(), period.to_string());
    placeholders.insert("price-ustx".into(), first_amount_ustx(params));

    if period == 0 {
        suggestions.push("Specify a billing period in blocks or days.".into());
    }
}

/// Positional principal, omitted when the text named fewer principals.
fn put_principal(
    placeholders: &mut BTreeMap<String, String>,
    key: &str,
    params: &ExtractedParams,
    index: usize,
) {
    if let Some(principal) = params.principals.get(index) {
        placeholders.insert(key.to_string(), principal.clone());
    }
}

/// First amount scaled to micro-STX and rounded, `0` when none was found.
fn first_amount_ustx(params: &ExtractedParams) -> String {
    let stx = params.amounts.first().copied().unwrap_or(0.0);
    format!("{:.0}", (stx * MICRO_STX_PER_STX).round())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chainlinkpay_core::{Deadline, Period};

    const A: &str = "SP2J6ZY48GV1EZ5V2V5RB9MP66SW86PYKKNRV9EJ7";
    const B: &str = "SP3FBR2AGK5H9QBDH3EEN6DF8EK8JY7RX8QJ5SVTE";
    const C: &str = "SP1HTBVD3JG9C05J7HBJTHGR0GGW7KXW28M5JS8QE";

    fn params(keywords: &[Keyword]) -> ExtractedParams {
        ExtractedParams {
            keywords: keywords.to_vec(),
            ..Default::default()
        }
    }

    fn principals(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    // ── Selection ──

    #[test]
    fn escrow_keyword_wins_over_everything() {
        let mut p = params(&[Keyword::Split, Keyword::Subscription, Keyword::Escrow]);
        p.percentages = vec![50, 50];
        p.periods = vec![Period::days(30)];
        assert_eq!(map_to_intent(&p).template, TemplateId::Escrow);
    }

    #[test]
    fn two_percentages_select_split_without_keyword() {
        let mut p = params(&[]);
        p.percentages = vec![70, 30];
        assert_eq!(map_to_intent(&p).template, TemplateId::Split);
    }

    #[test]
    fn one_percentage_is_not_enough_for_split() {
        let mut p = params(&[]);
        p.percentages = vec![70];
        assert_eq!(map_to_intent(&p).template, TemplateId::Unknown);
    }

    #[test]
    fn split_beats_subscription() {
        let mut p = params(&[Keyword::Subscription, Keyword::Split]);
        p.periods = vec![Period::blocks(10)];
        assert_eq!(map_to_intent(&p).template, TemplateId::Split);
    }

    #[test]
    fn period_alone_selects_subscription() {
        let mut p = params(&[]);
        p.periods = vec![Period::blocks(4320)];
        assert_eq!(map_to_intent(&p).template, TemplateId::Subscription);
    }

    #[test]
    fn unknown_has_no_placeholders_or_suggestions() {
        let intent = map_to_intent(&params(&[Keyword::Delivery]));
        assert_eq!(intent.template, TemplateId::Unknown);
        assert!(intent.placeholders.is_empty());
        assert!(intent.suggestions.is_empty());
        assert!(intent.issues.is_empty());
        assert_eq!(intent.confidence, 0.5);
    }

    // ── Escrow ──

    #[test]
    fn escrow_fills_all_five_placeholders() {
        let mut p = params(&[Keyword::Escrow, Keyword::Deadline]);
        p.principals = principals(&[A, B, C]);
        p.amounts = vec![5.0];
        p.periods = vec![Period::blocks(100)];

        let intent = map_to_intent(&p);
        assert_eq!(intent.placeholders["buyer"], A);
        assert_eq!(intent.placeholders["seller"], B);
        assert_eq!(intent.placeholders["arbiter"], C);
        assert_eq!(intent.placeholders["deadline-height"], "100");
        assert_eq!(intent.placeholders["amount-ustx"], "5000000");
        assert!(intent.suggestions.is_empty(), "{:?}", intent.suggestions);
        assert_eq!(intent.confidence, 1.0);
    }

    #[test]
    fn escrow_prefers_explicit_deadline_height() {
        let mut p = params(&[Keyword::Escrow]);
        p.deadlines = vec![Deadline {
            block_height: Some(900),
            days: None,
        }];
        p.periods = vec![Period::blocks(100)];
        let intent = map_to_intent(&p);
        assert_eq!(intent.placeholders["deadline-height"], "900");
    }

    #[test]
    fn escrow_day_period_does_not_count_as_deadline() {
        let mut p = params(&[Keyword::Escrow]);
        p.periods = vec![Period::days(3), Period::blocks(100)];
        let intent = map_to_intent(&p);
        assert_eq!(intent.placeholders["deadline-height"], "0");
    }

    #[test]
    fn escrow_missing_parties_and_deadline_suggestions() {
        let mut p = params(&[Keyword::Escrow]);
        p.principals = principals(&[A]);
        let intent = map_to_intent(&p);

        assert_eq!(intent.placeholders["buyer"], A);
        assert!(!intent.placeholders.contains_key("seller"));
        assert!(!intent.placeholders.contains_key("arbiter"));
        assert_eq!(intent.placeholders["amount-ustx"], "0");
        assert_eq!(intent.suggestions.len(), 3);
        assert!(intent.suggestions[0].contains("buyer and seller"));
        assert!(intent.suggestions[1].contains("arbiter"));
        assert!(intent.suggestions[2].contains("deadline"));
        // Concrete template, no supporting evidence.
        assert_eq!(intent.confidence, 0.8);
    }

    #[test]
    fn escrow_amount_rounds_to_micro_stx() {
        let mut p = params(&[Keyword::Escrow]);
        p.amounts = vec![1.2345675, 9.0];
        let intent = map_to_intent(&p);
        assert_eq!(intent.placeholders["amount-ustx"], "1234568");
    }

    // ── Split ──

    #[test]
    fn split_summing_to_hundred_has_no_suggestion() {
        let mut p = params(&[]);
        p.principals = principals(&[A, B]);
        p.percentages = vec![60, 40];
        let intent = map_to_intent(&p);
        assert_eq!(intent.placeholders["recipient-a"], A);
        assert_eq!(intent.placeholders["recipient-b"], B);
        assert_eq!(intent.placeholders["pct-a"], "60");
        assert_eq!(intent.placeholders["pct-b"], "40");
        assert!(intent.suggestions.is_empty());
    }

    #[test]
    fn split_not_summing_to_hundred_is_flagged() {
        let mut p = params(&[]);
        p.percentages = vec![60, 30];
        let intent = map_to_intent(&p);
        assert_eq!(intent.suggestions.len(), 1);
        assert!(intent.suggestions[0].contains("add up to 100"));
    }

    #[test]
    fn split_defaults_missing_percentages_to_zero() {
        let intent = map_to_intent(&params(&[Keyword::Split]));
        assert_eq!(intent.placeholders["pct-a"], "0");
        assert_eq!(intent.placeholders["pct-b"], "0");
        assert_eq!(intent.suggestions.len(), 1);
    }

    // ── Subscription ──

    #[test]
    fn subscription_uses_blocks_directly() {
        let mut p = params(&[Keyword::Subscription]);
        p.principals = principals(&[A, B]);
        p.periods = vec![Period::blocks(4320)];
        p.amounts = vec![10.0];
        let intent = map_to_intent(&p);
        assert_eq!(intent.placeholders["provider"], A);
        assert_eq!(intent.placeholders["subscriber"], B);
        assert_eq!(intent.placeholders["period"], "4320");
        assert_eq!(intent.placeholders["price-ustx"], "10000000");
        assert!(intent.suggestions.is_empty());
    }

    #[test]
    fn subscription_converts_days_to_blocks() {
        let mut p = params(&[]);
        p.periods = vec![Period::days(30), Period::blocks(7)];
        let intent = map_to_intent(&p);
        assert_eq!(intent.placeholders["period"], "4320");
    }

    #[test]
    fn subscription_conversion_follows_config() {
        let mut p = params(&[]);
        p.periods = vec![Period::days(2)];
        let config = MapperConfig {
            blocks_per_day: 100,
            ..Default::default()
        };
        let intent = map_to_intent_with(&p, &config);
        assert_eq!(intent.placeholders["period"], "200");
    }

    #[test]
    fn subscription_without_period_is_flagged() {
        let intent = map_to_intent(&params(&[Keyword::Subscription]));
        assert_eq!(intent.placeholders["period"], "0");
        assert_eq!(intent.suggestions.len(), 1);
        assert!(intent.suggestions[0].contains("billing period"));
    }

    // ── Confidence ──

    #[test]
    fn evidence_bonus_applies_once() {
        let mut p = params(&[Keyword::Split]);
        p.principals = principals(&[A, B]);
        p.percentages = vec![50, 50];
        p.periods = vec![Period::days(1)];
        assert_eq!(map_to_intent(&p).confidence, 1.0);
    }

    #[test]
    fn unknown_with_two_principals_gets_evidence_bonus() {
        let mut p = params(&[]);
        p.principals = principals(&[A, B]);
        let intent = map_to_intent(&p);
        assert_eq!(intent.template, TemplateId::Unknown);
        assert!((intent.confidence - 0.7).abs() < 1e-9);
    }

    #[test]
    fn confidence_never_exceeds_one() {
        let mut p = params(&[Keyword::Escrow]);
        p.principals = principals(&[A, B, C]);
        p.percentages = vec![10, 90];
        p.periods = vec![Period::blocks(5)];
        for clamp in [true, false] {
            let config = MapperConfig {
                clamp_confidence: clamp,
                ..Default::default()
            };
            let c = map_to_intent_with(&p, &config).confidence;
            assert!((0.0..=1.0).contains(&c), "confidence {c}");
        }
    }
}
