//! Stacks principal recognition.
//!
//! A principal is `S`, then `T` (testnet) or `P` (mainnet), then the c32 body of
//! a standard address, optionally followed by a contract name:
//!
//! - `SP2J6ZY48GV1EZ5V2V5RB9MP66SW86PYKKNRV9EJ7`
//! - `ST1PQHQKV0RJXZFY1DGX8MNSNYVE3VGZJSRTPGZGM.escrow-v1`
//!
//! The body must hold at least [`MIN_BODY_LEN`] upper-case alphanumerics so that
//! ordinary words like `STX` or `SPLIT` are never read as addresses. A match
//! always ends on an alphanumeric, so trailing sentence punctuation is left out.

use std::sync::LazyLock;

use regex::Regex;

pub const MIN_BODY_LEN: usize = 10;

const PATTERN: &str = r"S[TP][0-9A-Z]{10,}(?:[0-9A-Za-z.\-]*[0-9A-Za-z])?";

static SCAN_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(&format!(r"\b{PATTERN}")).unwrap());

static EXACT_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(&format!("^{PATTERN}$")).unwrap());

/// Whether `s` is, in its entirety, a principal.
pub fn is_principal(s: &str) -> bool {
    EXACT_RE.is_match(s)
}

/// Principals in `text`, in order of appearance, duplicates included.
pub fn find_principals(text: &str) -> impl Iterator<Item = &str> {
    SCAN_RE.find_iter(text).map(|m| m.as_str())
}

#[cfg(test)]
mod tests {
    use super::*;

    const MAINNET: &str = "SP2J6ZY48GV1EZ5V2V5RB9MP66SW86PYKKNRV9EJ7";
    const TESTNET: &str = "ST1PQHQKV0RJXZFY1DGX8MNSNYVE3VGZJSRTPGZGM";

    #[test]
    fn standard_principals() {
        assert!(is_principal(MAINNET));
        assert!(is_principal(TESTNET));
    }

    #[test]
    fn contract_principal() {
        assert!(is_principal(&format!("{TESTNET}.escrow-v1")));
    }

    #[test]
    fn rejects_short_words_and_junk() {
        assert!(!is_principal("STX"));
        assert!(!is_principal("SPLIT"));
        assert!(!is_principal("not-an-address"));
        assert!(!is_principal(""));
        assert!(!is_principal(&format!("{MAINNET} ")));
        assert!(!is_principal(&format!("{MAINNET}.")));
        assert!(!is_principal(&MAINNET.to_lowercase()));
    }

    #[test]
    fn wrong_network_letter() {
        assert!(!is_principal(&MAINNET.replacen("SP", "SX", 1)));
    }

    #[test]
    fn scan_keeps_order_and_duplicates() {
        let text = format!("pay {MAINNET} then {TESTNET}, and {MAINNET} again");
        let found: Vec<&str> = find_principals(&text).collect();
        assert_eq!(found, vec![MAINNET, TESTNET, MAINNET]);
    }

    #[test]
    fn scan_drops_trailing_punctuation() {
        let text = format!("send it to {MAINNET}.");
        let found: Vec<&str> = find_principals(&text).collect();
        assert_eq!(found, vec![MAINNET]);
    }

    #[test]
    fn scan_ignores_currency_word() {
        let text = "Escrow payment of 5 STX";
        assert_eq!(find_principals(text).count(), 0);
    }
}
