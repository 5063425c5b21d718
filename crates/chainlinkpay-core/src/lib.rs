//! Core types for ChainLinkPay contract generation: templates, intents, and the
//! shared Stacks principal pattern.

pub mod intent;
pub mod principal;
pub mod template;

pub use intent::{Deadline, ExtractedParams, Intent, Issue, IssueLevel, Keyword, Period};
pub use principal::{find_principals, is_principal};
pub use template::{
    ContractMetadata, ContractTemplate, GeneratedContract, ParseTemplateIdError, PlaceholderSpec,
    PlaceholderType, TemplateId, TemplateInput,
};
