use thiserror::Error;

/// Generation failure. Every variant names the placeholder key it concerns.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum GenerateError {
    #[error("missing required placeholder: {key}")]
    MissingPlaceholder { key: String },

    #[error("Invalid principal for {key}")]
    InvalidPrincipal { key: String },

    #[error("Invalid uint for {key}")]
    InvalidUint { key: String },

    #[error("String too long for {key}: {len} characters (max {max})")]
    StringTooLong { key: String, len: usize, max: usize },

    #[error("Invalid string for {key}")]
    InvalidString { key: String },

    #[error("Buffer must be hex for {key}")]
    InvalidBuffer { key: String },

    #[error("Unsupported placeholder type `{kind}` for {key}")]
    UnsupportedPlaceholderType { key: String, kind: String },
}

impl GenerateError {
    /// The placeholder key the failure is about.
    pub fn key(&self) -> &str {
        match self {
            Self::MissingPlaceholder { key }
            | Self::InvalidPrincipal { key }
            | Self::InvalidUint { key }
            | Self::StringTooLong { key, .. }
            | Self::InvalidString { key }
            | Self::InvalidBuffer { key }
            | Self::UnsupportedPlaceholderType { key, .. } => key,
        }
    }
}

/// Failure loading caller-supplied templates.
#[derive(Debug, Error)]
pub enum TemplateLoadError {
    #[error("template file not found: {0}")]
    NotFound(std::path::PathBuf),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("template {0} cannot be registered")]
    NotRegistrable(chainlinkpay_core::TemplateId),
}
