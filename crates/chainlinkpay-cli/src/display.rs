//! Human-readable rendering for the `pretty` output format.
//!
//! Every printer writes a `=== title ===` header followed by labelled
//! sections with a fixed-width key column.

use chainlinkpay_contracts::{IntegrityStatus, TemplateSummary};
use chainlinkpay_core::{ContractTemplate, GeneratedContract, Intent, Issue, IssueLevel};

use crate::draft::{Draft, DraftOutcome, Drafted};

const MAX_FINGERPRINT_CHARS: usize = 16;

// ── Public API ──

pub fn print_intent(intent: &Intent) {
    println!("=== Intent: {} ===", intent.template);
    println!("  {:<26} {:.2}", "confidence", intent.confidence);
    println!();

    if !intent.placeholders.is_empty() {
        println!("Placeholders");
        for (key, value) in &intent.placeholders {
            println!("  {:<26} {}", key, value);
        }
        println!();
    }

    if !intent.suggestions.is_empty() {
        println!("Suggestions");
        for suggestion in &intent.suggestions {
            println!("  - {suggestion}");
        }
        println!();
    }
}

pub fn print_draft(draft: &Draft) {
    print_contract(&draft.contract);
    print_issues(&draft.issues);
}

pub fn print_outcome(outcome: &DraftOutcome) {
    print_intent(&outcome.intent);
    match &outcome.drafted {
        Drafted::Generated { draft } => print_draft(draft),
        Drafted::NoTemplate => println!("No template matched; refine the request and try again."),
        Drafted::Failed { reason } => println!("Draft failed: {reason}"),
    }
}

pub fn print_contract(contract: &GeneratedContract) {
    println!(
        "=== {} contract (template v{}) ===",
        contract.template_id, contract.metadata.version
    );
    println!(
        "  {:<26} {}",
        "filled",
        contract.metadata.filled_keys.join(", ")
    );
    println!();
    println!("{}", contract.source.trim_end());
    println!();
}

pub fn print_issues(issues: &[Issue]) {
    if issues.is_empty() {
        println!("Validation: OK");
        return;
    }
    println!("Validation ({} issue(s))", issues.len());
    for issue in issues {
        let level = match issue.level {
            IssueLevel::Error => "error",
            IssueLevel::Warning => "warning",
        };
        println!("  {:<26} {}", level, issue.message);
    }
}

pub fn print_summaries(summaries: &[TemplateSummary]) {
    println!("=== Templates ({}) ===", summaries.len());
    println!();
    for s in summaries {
        println!("{} ({})", s.id, s.name);
        println!("  {:<26} {}", "version", s.version);
        println!("  {:<26} {}", "placeholders", s.placeholder_keys.join(", "));
        println!("  {:<26} {}", "fingerprint", short(&s.fingerprint));
        println!("  {:<26} {}", "integrity", integrity_label(&s.integrity));
        println!();
    }
}

pub fn print_template(template: &ContractTemplate) {
    println!("=== {} v{} ===", template.name, template.version);
    println!("{}", template.description);
    println!();

    println!("Placeholders");
    for spec in &template.placeholders {
        let required = if spec.required { "required" } else { "optional" };
        print!("  {:<26} {:<10} {:<9}", spec.key, spec.kind.as_str(), required);
        if let Some(description) = &spec.description {
            print!(" {description}");
        }
        println!();
    }
    println!();
    println!("{}", template.source.trim_end());
}

pub fn print_fingerprints(fingerprints: &[(&str, String)]) {
    for (algorithm, fingerprint) in fingerprints {
        println!("  {:<26} {}", algorithm, fingerprint);
    }
}

// ── Helpers ──

fn integrity_label(status: &IntegrityStatus) -> String {
    match status {
        IntegrityStatus::Verified => "verified".to_string(),
        IntegrityStatus::Mismatch {
            expected: None, ..
        } => "MISMATCH (no expected fingerprint)".to_string(),
        IntegrityStatus::Mismatch {
            expected: Some(expected),
            ..
        } => format!("MISMATCH (expected {})", short(expected)),
        IntegrityStatus::Unverifiable { reason } => format!("unverifiable: {reason}"),
    }
}

fn short(fingerprint: &str) -> String {
    if fingerprint.len() > MAX_FINGERPRINT_CHARS {
        format!("{}...", &fingerprint[..MAX_FINGERPRINT_CHARS])
    } else {
        fingerprint.to_string()
    }
}
