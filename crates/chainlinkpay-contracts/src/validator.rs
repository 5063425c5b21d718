//! Static checks over generated Clarity source.
//!
//! Validation is advisory: issues are returned as data and the caller decides
//! whether an error blocks deployment. It re-checks for leftover placeholder
//! markers independently of the generator.

use std::sync::LazyLock;

use chainlinkpay_core::Issue;
use regex::Regex;

/// Approximate deployable size ceiling, in characters.
pub const MAX_SOURCE_CHARS: usize = 16_000;

const PUBLIC_FUNCTION_MARKER: &str = "(define-public";

static UNFILLED_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\{\{[^{}]*\}\}").unwrap());

pub fn validate_clarity_source(source: &str) -> Vec<Issue> {
    let mut issues = Vec::new();

    if !source.contains(PUBLIC_FUNCTION_MARKER) {
        issues.push(Issue::warning(
            "No public functions found; the contract may not be usable.",
        ));
    }

    let len = source.chars().count();
    if len > MAX_SOURCE_CHARS {
        issues.push(Issue::warning(format!(
            "Contract source is {len} characters, above the {MAX_SOURCE_CHARS}-character limit."
        )));
    }

    let unfilled: Vec<&str> = UNFILLED_RE.find_iter(source).map(|m| m.as_str()).collect();
    if !unfilled.is_empty() {
        issues.push(Issue::error(format!(
            "Unfilled placeholders remain: {}",
            unfilled.join(", ")
        )));
    }

    if let Some(problem) = paren_imbalance(source) {
        issues.push(Issue::error(format!("Unbalanced parentheses: {problem}")));
    }

    issues
}

/// Describe the first parenthesis imbalance outside string literals and `;;`
/// comments, if any.
fn paren_imbalance(source: &str) -> Option<String> {
    let mut depth: usize = 0;
    let mut in_string = false;
    let mut escaped = false;

    for (line_no, line) in source.lines().enumerate() {
        let mut chars = line.chars().peekable();
        while let Some(c) = chars.next() {
            if in_string {
                match c {
                    _ if escaped => escaped = false,
                    '\\' => escaped = true,
                    '"' => in_string = false,
                    _ => {}
                }
                continue;
            }
            match c {
                '"' => in_string = true,
                ';' if chars.peek() == Some(&';') => break,
                '(' => depth += 1,
                ')' => {
                    if depth == 0 {
                        return Some(format!("unexpected ')' on line {}", line_no + 1));
                    }
                    depth -= 1;
                }
                _ => {}
            }
        }
    }

    if in_string {
        Some("unterminated string literal".to_string())
    } else if depth > 0 {
        Some(format!("{depth} unclosed '('"))
    } else {
        None
    }
}
