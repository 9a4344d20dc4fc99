//! Error types for formwork engine operations.

/// Errors surfaced by the engine boundary.
///
/// Runtime evaluation never fails; these cover malformed schema documents,
/// configuration, and the submit gate.
#[derive(Debug, thiserror::Error)]
pub enum FormError {
    /// The raw schema document does not have the tabs → sections → contents shape.
    #[error("invalid schema at {path}: {message}")]
    InvalidSchema { path: String, message: String },

    /// Submission was requested while required fields are not validated.
    #[error("Missing required fields")]
    MissingRequiredFields { missing: Vec<String> },

    /// The engine configuration could not be parsed.
    #[error("invalid config: {0}")]
    Config(#[from] toml::de::Error),

    /// A value could not be (de)serialized.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl FormError {
    pub(crate) fn invalid_schema(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidSchema {
            path: path.into(),
            message: message.into(),
        }
    }
}
