//! Template integrity verification.
//!
//! A template's trimmed source is fingerprinted and compared against a table
//! of expected values keyed by template id. Template authors must update the
//! tables below whenever a file under `templates/` changes (`chainlinkpay
//! fingerprint --file <path>` prints both values).
//!
//! Two algorithms are available:
//!
//! - `Sha256`: content digest; detects deliberate tampering. The default.
//! - `Rolling32`: 32-bit `h * 31 + c` rolling hash over UTF-16 code units,
//!   printed as unsigned hex. A drift detector only: collisions are trivial to
//!   construct.
//!
//! Verification has three outcomes ([`IntegrityStatus`]). A template without an
//! expected entry fails closed. When verification cannot run at all, the
//! caller's [`UnverifiablePolicy`] decides.

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;

use chainlinkpay_core::{ContractTemplate, TemplateId};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use tracing::warn;

const EXPECTED_SHA256: [(TemplateId, &str); 3] = [
    (
        TemplateId::Escrow,
        "ada733f7e10521a59ab693d2d1ce66b97d708e856c5413cd541342a28f42d89c",
    ),
    (
        TemplateId::Split,
        "1dde275454c2f146ef6e01f42b7ebe17b662a4a7a6be6ee9e7c59618eeee802f",
    ),
    (
        TemplateId::Subscription,
        "2f12645018ba6056b7de1c734338fe6fe9c3ddc1d5d1e0217d4d50d3aff37576",
    ),
];

const EXPECTED_ROLLING32: [(TemplateId, &str); 3] = [
    (TemplateId::Escrow, "26bf0e8"),
    (TemplateId::Split, "94e79368"),
    (TemplateId::Subscription, "d26e02f2"),
];

static DEFAULT_CHECKER: LazyLock<IntegrityChecker> =
    LazyLock::new(|| IntegrityChecker::builtin(FingerprintAlgorithm::Sha256));

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FingerprintAlgorithm {
    #[default]
    Sha256,
    Rolling32,
}

impl FingerprintAlgorithm {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Sha256 => "sha256",
            Self::Rolling32 => "rolling32",
        }
    }

    /// Fingerprint of `source` with surrounding whitespace trimmed.
    pub fn fingerprint(&self, source: &str) -> String {
        match self {
            Self::Sha256 => sha256_fingerprint(source),
            Self::Rolling32 => rolling_fingerprint(source),
        }
    }

    /// Check that `expected` is a well-formed value for this algorithm.
    fn check_expected(&self, expected: &str) -> Result<(), String> {
        let max_len = match self {
            Self::Sha256 => 64,
            Self::Rolling32 => 8,
        };
        let well_formed = match self {
            Self::Sha256 => expected.len() == max_len,
            Self::Rolling32 => !expected.is_empty() && expected.len() <= max_len,
        } && expected.bytes().all(|b| b.is_ascii_hexdigit());

        if well_formed {
            Ok(())
        } else {
            Err(format!(
                "expected {} fingerprint is malformed: {expected:?}",
                self.as_str()
            ))
        }
    }
}

impl fmt::Display for FingerprintAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FingerprintAlgorithm {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "sha256" => Ok(Self::Sha256),
            "rolling32" => Ok(Self::Rolling32),
            other => Err(format!("unknown fingerprint algorithm: {other}")),
        }
    }
}

pub fn sha256_fingerprint(source: &str) -> String {
    hex::encode(Sha256::digest(source.trim().as_bytes()))
}

pub fn rolling_fingerprint(source: &str) -> String {
    let hash = source
        .trim()
        .encode_utf16()
        .fold(0i32, |h, unit| h.wrapping_mul(31).wrapping_add(i32::from(unit)));
    format!("{:x}", hash as u32)
}

/// Outcome of one verification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "camelCase")]
pub enum IntegrityStatus {
    /// Verification ran and the fingerprint matched.
    Verified,
    /// Verification ran and failed. `expected` is `None` when the template id
    /// has no entry in the table.
    Mismatch {
        expected: Option<String>,
        actual: String,
    },
    /// Verification could not run.
    Unverifiable { reason: String },
}

/// What to do when verification could not run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UnverifiablePolicy {
    /// Proceed, logging a warning. Availability over strictness.
    #[default]
    Trust,
    Reject,
}

impl FromStr for UnverifiablePolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "trust" => Ok(Self::Trust),
            "reject" => Ok(Self::Reject),
            other => Err(format!("unknown unverifiable policy: {other}")),
        }
    }
}

/// Expected fingerprints an author ships alongside a template, one per
/// algorithm.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExpectedFingerprints {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sha256: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rolling32: Option<String>,
}

impl ExpectedFingerprints {
    pub fn get(&self, algorithm: FingerprintAlgorithm) -> Option<&str> {
        match algorithm {
            FingerprintAlgorithm::Sha256 => self.sha256.as_deref(),
            FingerprintAlgorithm::Rolling32 => self.rolling32.as_deref(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct IntegrityChecker {
    algorithm: FingerprintAlgorithm,
    expected: HashMap<TemplateId, String>,
    policy: UnverifiablePolicy,
}

impl IntegrityChecker {
    /// Checker over the shipped expected-fingerprint table for `algorithm`.
    pub fn builtin(algorithm: FingerprintAlgorithm) -> Self {
        let table: &[(TemplateId, &str)] = match algorithm {
            FingerprintAlgorithm::Sha256 => &EXPECTED_SHA256,
            FingerprintAlgorithm::Rolling32 => &EXPECTED_ROLLING32,
        };
        Self::new(
            algorithm,
            table
                .iter()
                .map(|(id, fp)| (*id, fp.to_string()))
                .collect(),
        )
    }

    pub fn new(algorithm: FingerprintAlgorithm, expected: HashMap<TemplateId, String>) -> Self {
        Self {
            algorithm,
            expected,
            policy: UnverifiablePolicy::default(),
        }
    }

    pub fn with_policy(mut self, policy: UnverifiablePolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Replace the expected fingerprint for `id`.
    pub fn set_expected(&mut self, id: TemplateId, fingerprint: impl Into<String>) {
        self.expected.insert(id, fingerprint.into());
    }

    /// Drop the expected fingerprint for `id`; its templates then fail closed.
    pub fn clear_expected(&mut self, id: TemplateId) {
        self.expected.remove(&id);
    }

    pub fn algorithm(&self) -> FingerprintAlgorithm {
        self.algorithm
    }

    pub fn policy(&self) -> UnverifiablePolicy {
        self.policy
    }

    pub fn check(&self, template: &ContractTemplate) -> IntegrityStatus {
        let Some(expected) = self.expected.get(&template.id) else {
            return IntegrityStatus::Mismatch {
                expected: None,
                actual: self.algorithm.fingerprint(&template.source),
            };
        };
        if let Err(reason) = self.algorithm.check_expected(expected) {
            return IntegrityStatus::Unverifiable { reason };
        }

        let actual = self.algorithm.fingerprint(&template.source);
        if actual.eq_ignore_ascii_case(expected) {
            IntegrityStatus::Verified
        } else {
            IntegrityStatus::Mismatch {
                expected: Some(expected.clone()),
                actual,
            }
        }
    }

    /// Boolean gate: `check` with the configured policy applied.
    pub fn verify(&self, template: &ContractTemplate) -> bool {
        match self.check(template) {
            IntegrityStatus::Verified => true,
            IntegrityStatus::Mismatch { expected, actual } => {
                warn!(
                    id = %template.id,
                    algorithm = %self.algorithm,
                    expected = expected.as_deref().unwrap_or("<none>"),
                    actual = %actual,
                    "template integrity mismatch"
                );
                false
            }
            IntegrityStatus::Unverifiable { reason } => {
                let trusted = self.policy == UnverifiablePolicy::Trust;
                warn!(
                    id = %template.id,
                    reason = %reason,
                    trusted,
                    "template integrity could not be verified"
                );
                trusted
            }
        }
    }
}

/// SHA-256 verification against the shipped table, trusting unverifiable
/// results.
pub fn verify_template_integrity(template: &ContractTemplate) -> bool {
    DEFAULT_CHECKER.verify(template)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::{get_template, registry};

    fn escrow() -> ContractTemplate {
        get_template(TemplateId::Escrow).unwrap().clone()
    }

    #[test]
    fn rolling_matches_known_values() {
        assert_eq!(rolling_fingerprint(""), "0");
        assert_eq!(rolling_fingerprint("a"), "61");
        assert_eq!(rolling_fingerprint("ab"), "c21");
        assert_eq!(rolling_fingerprint("hello world"), "6aefe2c4");
    }

    #[test]
    fn rolling_folds_negative_accumulator_to_unsigned() {
        assert_eq!(rolling_fingerprint("(define-public (go) (ok u1))"), "877e8a72");
    }

    #[test]
    fn rolling_counts_utf16_units() {
        assert_eq!(rolling_fingerprint("é€"), "3ce3");
    }

    #[test]
    fn sha256_known_value() {
        assert_eq!(
            sha256_fingerprint("hello world"),
            "b94d27b9934d3e08a52e52d7da7dabfac484efe37a5380ee9088f7ace2efcde9"
        );
    }

    #[test]
    fn fingerprints_ignore_surrounding_whitespace() {
        for algo in [FingerprintAlgorithm::Sha256, FingerprintAlgorithm::Rolling32] {
            assert_eq!(algo.fingerprint("  x \n\n"), algo.fingerprint("x"));
            assert_ne!(algo.fingerprint("x y"), algo.fingerprint("xy"));
        }
    }

    #[test]
    fn builtins_verify_under_both_algorithms() {
        for algo in [FingerprintAlgorithm::Sha256, FingerprintAlgorithm::Rolling32] {
            let checker = IntegrityChecker::builtin(algo);
            for template in registry().iter() {
                assert_eq!(
                    checker.check(template),
                    IntegrityStatus::Verified,
                    "{algo} {}",
                    template.id
                );
                assert!(checker.verify(template));
            }
        }
    }

    #[test]
    fn edited_source_is_a_mismatch() {
        let mut t = escrow();
        t.source = t.source.replace("u401", "u499");
        let checker = IntegrityChecker::builtin(FingerprintAlgorithm::Sha256);
        match checker.check(&t) {
            IntegrityStatus::Mismatch { expected, actual } => {
                assert_eq!(expected.as_deref(), Some(EXPECTED_SHA256[0].1));
                assert_ne!(actual, EXPECTED_SHA256[0].1);
            }
            other => panic!("expected mismatch, got {other:?}"),
        }
        assert!(!checker.verify(&t));
        assert!(!verify_template_integrity(&t));
    }

    #[test]
    fn whitespace_only_edit_still_verifies() {
        let mut t = escrow();
        t.source = format!("\n\n{}   \n", t.source);
        assert!(verify_template_integrity(&t));
    }

    #[test]
    fn missing_entry_fails_closed_even_when_trusting() {
        let checker = IntegrityChecker::new(FingerprintAlgorithm::Sha256, HashMap::new())
            .with_policy(UnverifiablePolicy::Trust);
        let t = escrow();
        assert!(matches!(
            checker.check(&t),
            IntegrityStatus::Mismatch { expected: None, .. }
        ));
        assert!(!checker.verify(&t));
    }

    #[test]
    fn malformed_expected_is_unverifiable_and_policy_decides() {
        let expected = HashMap::from([(TemplateId::Escrow, "not-hex".to_string())]);
        let t = escrow();

        let trusting = IntegrityChecker::new(FingerprintAlgorithm::Sha256, expected.clone());
        assert!(matches!(trusting.check(&t), IntegrityStatus::Unverifiable { .. }));
        assert_eq!(trusting.policy(), UnverifiablePolicy::Trust);
        assert!(trusting.verify(&t));

        let strict = IntegrityChecker::new(FingerprintAlgorithm::Sha256, expected)
            .with_policy(UnverifiablePolicy::Reject);
        assert!(!strict.verify(&t));
    }

    #[test]
    fn wrong_length_for_algorithm_is_unverifiable() {
        // A rolling value in a SHA-256 table.
        let expected = HashMap::from([(TemplateId::Escrow, "26bf0e8".to_string())]);
        let checker = IntegrityChecker::new(FingerprintAlgorithm::Sha256, expected);
        assert!(matches!(checker.check(&escrow()), IntegrityStatus::Unverifiable { .. }));
    }

    #[test]
    fn expected_entries_can_be_replaced_and_cleared() {
        let mut t = escrow();
        t.source.push_str("\n(define-read-only (extra) u1)");
        let mut checker = IntegrityChecker::builtin(FingerprintAlgorithm::Rolling32);
        assert!(!checker.verify(&t));

        checker.set_expected(t.id, rolling_fingerprint(&t.source));
        assert_eq!(checker.check(&t), IntegrityStatus::Verified);

        checker.clear_expected(t.id);
        assert!(matches!(
            checker.check(&t),
            IntegrityStatus::Mismatch { expected: None, .. }
        ));
    }

    #[test]
    fn expected_fingerprints_by_algorithm() {
        let fps: ExpectedFingerprints =
            serde_json::from_str(r#"{"sha256": "ab", "rolling32": "cd"}"#).unwrap();
        assert_eq!(fps.get(FingerprintAlgorithm::Sha256), Some("ab"));
        assert_eq!(fps.get(FingerprintAlgorithm::Rolling32), Some("cd"));
        assert_eq!(ExpectedFingerprints::default().get(FingerprintAlgorithm::Sha256), None);
    }

    #[test]
    fn parse_algorithm_and_policy() {
        assert_eq!(
            "SHA256".parse::<FingerprintAlgorithm>().unwrap(),
            FingerprintAlgorithm::Sha256
        );
        assert_eq!(
            "rolling32".parse::<FingerprintAlgorithm>().unwrap(),
            FingerprintAlgorithm::Rolling32
        );
        assert!("md5".parse::<FingerprintAlgorithm>().is_err());
        assert_eq!(
            "reject".parse::<UnverifiablePolicy>().unwrap(),
            UnverifiablePolicy::Reject
        );
    }

    #[test]
    fn status_serialises_with_tag() {
        let json = serde_json::to_value(IntegrityStatus::Mismatch {
            expected: None,
            actual: "ab".into(),
        })
        .unwrap();
        assert_eq!(json["status"], "mismatch");
        assert_eq!(json["actual"], "ab");
    }
}
