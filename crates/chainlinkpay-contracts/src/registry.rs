//! Canonical contract templates.
//!
//! Built-in templates are Clarity files compiled into the binary and assembled
//! once per process. The registry is never mutated after construction; callers
//! that need different templates build their own with
//! [`TemplateRegistry::with_overrides`].

use std::path::Path;
use std::sync::LazyLock;

use chainlinkpay_core::{ContractTemplate, PlaceholderSpec, PlaceholderType, TemplateId};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::TemplateLoadError;
use crate::integrity::{ExpectedFingerprints, IntegrityChecker, IntegrityStatus};

const ESCROW_SOURCE: &str = include_str!("../templates/escrow.clar");
const SPLIT_SOURCE: &str = include_str!("../templates/split.clar");
const SUBSCRIPTION_SOURCE: &str = include_str!("../templates/subscription.clar");

const BUILTIN_VERSION: &str = "1.0.0";

static BUILTIN: LazyLock<TemplateRegistry> = LazyLock::new(|| TemplateRegistry {
    templates: vec![escrow_template(), split_template(), subscription_template()],
});

/// The process-wide built-in registry.
pub fn registry() -> &'static TemplateRegistry {
    &BUILTIN
}

/// Look up a built-in template.
pub fn get_template(id: TemplateId) -> Option<&'static ContractTemplate> {
    BUILTIN.get(id)
}

/// Ordered set of templates, at most one per id.
#[derive(Debug, Clone)]
pub struct TemplateRegistry {
    templates: Vec<ContractTemplate>,
}

/// One registry entry as seen by the introspection interface.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TemplateSummary {
    pub id: TemplateId,
    pub name: String,
    pub version: String,
    pub placeholder_keys: Vec<String>,
    pub fingerprint: String,
    pub integrity: IntegrityStatus,
}

/// One entry of a template override file: a template plus the fingerprints
/// its author expects it to have.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct TemplateOverride {
    #[serde(flatten)]
    pub template: ContractTemplate,
    #[serde(default)]
    pub fingerprints: ExpectedFingerprints,
}

impl TemplateOverride {
    /// Parse a JSON array of override entries.
    pub fn from_json(json: &str) -> Result<Vec<Self>, TemplateLoadError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn from_file(path: &Path) -> Result<Vec<Self>, TemplateLoadError> {
        if !path.exists() {
            return Err(TemplateLoadError::NotFound(path.to_path_buf()));
        }
        let json = std::fs::read_to_string(path)?;
        Self::from_json(&json)
    }
}

impl TemplateRegistry {
    pub fn get(&self, id: TemplateId) -> Option<&ContractTemplate> {
        self.templates.iter().find(|t| t.id == id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &ContractTemplate> {
        self.templates.iter()
    }

    pub fn len(&self) -> usize {
        self.templates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.templates.is_empty()
    }

    /// A copy of this registry where `overrides` replace templates of the same
    /// id and new ids are appended. `UNKNOWN` can never be registered.
    pub fn with_overrides(
        &self,
        overrides: Vec<ContractTemplate>,
    ) -> Result<Self, TemplateLoadError> {
        let mut templates = self.templates.clone();
        for template in overrides {
            if !template.id.is_concrete() {
                return Err(TemplateLoadError::NotRegistrable(template.id));
            }
            debug!(id = %template.id, version = %template.version, "template override");
            match templates.iter_mut().find(|t| t.id == template.id) {
                Some(slot) => *slot = template,
                None => templates.push(template),
            }
        }
        Ok(Self { templates })
    }

    /// Layer author-supplied `overrides` over this registry and record each
    /// entry's expected fingerprint in `checker`.
    ///
    /// An entry that carries no fingerprint for the checker's algorithm has no
    /// expected value afterwards, so it fails verification.
    pub fn with_checked_overrides(
        &self,
        overrides: Vec<TemplateOverride>,
        checker: &mut IntegrityChecker,
    ) -> Result<Self, TemplateLoadError> {
        let (templates, fingerprints): (Vec<_>, Vec<_>) = overrides
            .into_iter()
            .map(|entry| (entry.template, entry.fingerprints))
            .unzip();
        let ids: Vec<TemplateId> = templates.iter().map(|t| t.id).collect();
        let registry = self.with_overrides(templates)?;

        for (id, expected) in ids.into_iter().zip(fingerprints) {
            match expected.get(checker.algorithm()) {
                Some(fingerprint) => checker.set_expected(id, fingerprint),
                None => {
                    warn!(
                        id = %id,
                        algorithm = %checker.algorithm(),
                        "override template has no expected fingerprint; it will fail integrity"
                    );
                    checker.clear_expected(id);
                }
            }
        }
        Ok(registry)
    }

    /// Introspection: every template with its fingerprint and integrity status
    /// under `checker`.
    pub fn describe(&self, checker: &IntegrityChecker) -> Vec<TemplateSummary> {
        self.templates
            .iter()
            .map(|t| TemplateSummary {
                id: t.id,
                name: t.name.clone(),
                version: t.version.clone(),
                placeholder_keys: t.placeholders.iter().map(|p| p.key.clone()).collect(),
                fingerprint: checker.algorithm().fingerprint(&t.source),
                integrity: checker.check(t),
            })
            .collect()
    }
}

// ── Built-in definitions ──

fn escrow_template() -> ContractTemplate {
    ContractTemplate {
        id: TemplateId::Escrow,
        name: "Escrow".into(),
        description: "Buyer-funded escrow released by the buyer or an arbiter, \
                      refundable after a deadline."
            .into(),
        version: BUILTIN_VERSION.into(),
        source: ESCROW_SOURCE.into(),
        placeholders: vec![
            principal("buyer", "Address that funds the escrow"),
            principal("seller", "Address paid on release"),
            principal("arbiter", "Address that settles disputes"),
            uint(
                "deadline-height",
                "Block height after which the buyer may be refunded",
            ),
            uint("amount-ustx", "Escrowed amount in micro-STX"),
        ],
    }
}

fn split_template() -> ContractTemplate {
    ContractTemplate {
        id: TemplateId::Split,
        name: "Revenue Split".into(),
        description: "Divides every payment between two recipients by fixed percentages.".into(),
        version: BUILTIN_VERSION.into(),
        source: SPLIT_SOURCE.into(),
        placeholders: vec![
            principal("recipient-a", "First recipient"),
            principal("recipient-b", "Second recipient"),
            uint("pct-a", "First recipient's share in percent"),
            uint("pct-b", "Second recipient's share in percent"),
        ],
    }
}

fn subscription_template() -> ContractTemplate {
    ContractTemplate {
        id: TemplateId::Subscription,
        name: "Subscription".into(),
        description: "Recurring fixed-price payment from a subscriber to a provider.".into(),
        version: BUILTIN_VERSION.into(),
        source: SUBSCRIPTION_SOURCE.into(),
        placeholders: vec![
            principal("provider", "Address that receives payments"),
            principal("subscriber", "Address that pays"),
            uint("period", "Blocks between payments"),
            uint("price-ustx", "Price per period in micro-STX"),
        ],
    }
}

fn principal(key: &str, description: &str) -> PlaceholderSpec {
    PlaceholderSpec::required(key, PlaceholderType::Principal, description)
}

fn uint(key: &str, description: &str) -> PlaceholderSpec {
    PlaceholderSpec::required(key, PlaceholderType::Uint, description)
}
