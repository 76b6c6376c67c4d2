use rust_decimal::Decimal;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum MicroloanError {
    /// Non-positive principal or term reached the pricing engine. Upstream
    /// validation should have rejected it.
    #[error("Invalid quote input: {field} — {reason}")]
    InvalidQuoteInput { field: String, reason: String },

    #[error("{field} out of range: must be between {min} and {max}")]
    OutOfRange {
        field: String,
        min: Decimal,
        max: Decimal,
    },

    #[error("Repayment period of {term_days} days is not offered (allowed: {allowed})")]
    UnsupportedTerm { term_days: u32, allowed: String },

    #[error("Network error: {0}")]
    Network(String),

    #[error("Backend error ({status}): {message}")]
    Backend { status: u16, message: String },

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Serialization error: {0}")]
    SerializationError(String),
}

impl MicroloanError {
    /// Errors a borrower can act on (fix the input, retry the request).
    /// Everything else points at a bug or a broken deployment.
    pub fn is_user_facing(&self) -> bool {
        matches!(
            self,
            MicroloanError::OutOfRange { .. }
                | MicroloanError::UnsupportedTerm { .. }
                | MicroloanError::Network(_)
                | MicroloanError::Backend { .. }
        )
    }

    pub fn is_retryable(&self) -> bool {
        match self {
            MicroloanError::Network(_) => true,
            MicroloanError::Backend { status, .. } => *status >= 500,
            _ => false,
        }
    }

    /// The input field an inline validation message belongs to, if any.
    pub fn field(&self) -> Option<&str> {
        match self {
            MicroloanError::InvalidQuoteInput { field, .. } => Some(field),
            MicroloanError::OutOfRange { field, .. } => Some(field),
            MicroloanError::UnsupportedTerm { .. } => Some("term_days"),
            _ => None,
        }
    }
}

impl From<serde_json::Error> for MicroloanError {
    fn from(e: serde_json::Error) -> Self {
        MicroloanError::SerializationError(e.to_string())
    }
}

impl From<toml::de::Error> for MicroloanError {
    fn from(e: toml::de::Error) -> Self {
        MicroloanError::Config(e.to_string())
    }
}
