//! Contract layer: template registry, integrity verification, placeholder
//! generation, and static validation of Clarity source.

mod error;
pub mod generator;
pub mod integrity;
pub mod registry;
pub mod validator;

pub use error::{GenerateError, TemplateLoadError};
pub use generator::{MAX_STRING_CHARS, generate_contract, sanitize_value};
pub use integrity::{
    ExpectedFingerprints, FingerprintAlgorithm, IntegrityChecker, IntegrityStatus,
    UnverifiablePolicy, verify_template_integrity,
};
pub use registry::{TemplateOverride, TemplateRegistry, TemplateSummary, get_template, registry};
pub use validator::{MAX_SOURCE_CHARS, validate_clarity_source};
