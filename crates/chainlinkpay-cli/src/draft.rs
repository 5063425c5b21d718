//! Drafting pipeline: text → intent → template lookup → integrity gate →
//! generation → validation.

use std::path::Path;

use anyhow::{Context, bail};
use chainlinkpay_contracts::{
    IntegrityChecker, TemplateOverride, TemplateRegistry, generate_contract,
    validate_clarity_source,
};
use chainlinkpay_core::{
    ContractTemplate, GeneratedContract, Intent, Issue, TemplateId, TemplateInput,
};
use chainlinkpay_intent::{MapperConfig, interpret_with};
use serde::Serialize;
use serde_json::Value;
use tracing::debug;

/// A generated contract and what the validator said about it.
#[derive(Debug, Clone, Serialize)]
pub struct Draft {
    pub contract: GeneratedContract,
    pub issues: Vec<Issue>,
}

impl Draft {
    pub fn has_errors(&self) -> bool {
        self.issues.iter().any(Issue::is_error)
    }
}

/// What happened after interpretation.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "status", rename_all = "camelCase")]
pub enum Drafted {
    /// No template matched the request.
    NoTemplate,
    Generated { draft: Draft },
    /// A template matched but was refused by the integrity gate or could not
    /// be filled.
    Failed { reason: String },
}

/// Result of [`Pipeline::draft`]. The intent is always kept so its
/// suggestions reach the user whatever happened downstream.
#[derive(Debug, Clone, Serialize)]
pub struct DraftOutcome {
    pub intent: Intent,
    #[serde(flatten)]
    pub drafted: Drafted,
}

impl DraftOutcome {
    /// The draft, when one was generated.
    pub fn draft(&self) -> Option<&Draft> {
        match &self.drafted {
            Drafted::Generated { draft } => Some(draft),
            _ => None,
        }
    }
}

pub struct Pipeline {
    registry: TemplateRegistry,
    checker: IntegrityChecker,
    mapper: MapperConfig,
}

impl Pipeline {
    pub fn new(
        registry: TemplateRegistry,
        checker: IntegrityChecker,
        mapper: MapperConfig,
    ) -> Self {
        Self {
            registry,
            checker,
            mapper,
        }
    }

    /// Layer a JSON file of override entries over the registry. Each entry's
    /// expected fingerprint replaces the shipped one; entries without one
    /// fail the integrity gate.
    pub fn with_template_overrides(mut self, path: &Path) -> anyhow::Result<Self> {
        let overrides = TemplateOverride::from_file(path)
            .with_context(|| format!("loading template overrides from {}", path.display()))?;
        self.registry = self
            .registry
            .with_checked_overrides(overrides, &mut self.checker)
            .context("registering template overrides")?;
        Ok(self)
    }

    pub fn registry(&self) -> &TemplateRegistry {
        &self.registry
    }

    pub fn checker(&self) -> &IntegrityChecker {
        &self.checker
    }

    pub fn interpret(&self, text: &str) -> Intent {
        interpret_with(text, &self.mapper)
    }

    /// Resolve `id` and refuse it unless it passes the integrity gate.
    pub fn template(&self, id: TemplateId) -> anyhow::Result<&ContractTemplate> {
        let Some(template) = self.registry.get(id) else {
            bail!("no template registered for {id}");
        };
        if !self.checker.verify(template) {
            bail!(
                "template {id} failed {} integrity verification; refusing to generate",
                self.checker.algorithm()
            );
        }
        Ok(template)
    }

    pub fn generate(&self, id: TemplateId, input: &TemplateInput) -> anyhow::Result<Draft> {
        let template = self.template(id)?;
        let contract = generate_contract(template, input)
            .with_context(|| format!("generating {id} contract"))?;
        let issues = validate_clarity_source(&contract.source);
        debug!(template = %id, issues = issues.len(), "draft validated");
        Ok(Draft { contract, issues })
    }

    /// Full pipeline from free-form text. `edits` override the intent's
    /// placeholder values key by key.
    pub fn draft(&self, text: &str, edits: TemplateInput) -> DraftOutcome {
        let intent = self.interpret(text);
        if !intent.template.is_concrete() {
            debug!("no template matched; returning intent only");
            return DraftOutcome {
                intent,
                drafted: Drafted::NoTemplate,
            };
        }

        let mut input = intent.to_template_input();
        input.extend(edits);
        let drafted = match self.generate(intent.template, &input) {
            Ok(draft) => Drafted::Generated { draft },
            Err(e) => {
                debug!(template = %intent.template, error = %e, "draft failed");
                Drafted::Failed {
                    reason: format!("{e:#}"),
                }
            }
        };
        DraftOutcome { intent, drafted }
    }
}

/// Parse repeated `key=value` arguments. Values stay strings; the generator
/// coerces them per placeholder type.
pub fn parse_assignments(args: &[String]) -> anyhow::Result<TemplateInput> {
    let mut input = TemplateInput::new();
    for arg in args {
        let Some((key, value)) = arg.split_once('=') else {
            bail!("expected key=value, got `{arg}`");
        };
        let key = key.trim();
        if key.is_empty() {
            bail!("empty placeholder key in `{arg}`");
        }
        input.insert(key.to_string(), Value::String(value.to_string()));
    }
    Ok(input)
}
