use thiserror::Error;

use crate::schema::ValidationIssue;

pub type Result<T> = std::result::Result<T, ClerkError>;

/// Everything that can go wrong between form state and a rendered result.
#[derive(Debug, Error)]
pub enum ClerkError {
    /// Missing or unusable credential/settings. Raised before any network call.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// Connection, DNS, TLS or timeout failure talking to the endpoint.
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// The endpoint answered, but with a non-success status.
    #[error("endpoint returned status {status}: {body}")]
    HttpStatus { status: u16, body: String },

    /// The endpoint answered with something that is not a valid result.
    /// `raw` keeps the text we got for diagnosis.
    #[error("generation error: {message}")]
    Generation {
        message: String,
        raw: Option<String>,
    },

    /// Malformed input caught on the client side.
    #[error("invalid input: {0}")]
    Validation(String),
}

impl ClerkError {
    pub fn generation(message: impl Into<String>) -> Self {
        ClerkError::Generation {
            message: message.into(),
            raw: None,
        }
    }

    pub fn generation_with_raw(message: impl Into<String>, raw: impl Into<String>) -> Self {
        ClerkError::Generation {
            message: message.into(),
            raw: Some(raw.into()),
        }
    }

    pub(crate) fn schema_mismatch(issues: &[ValidationIssue], raw: &str) -> Self {
        let listed = issues
            .iter()
            .map(|i| i.to_string())
            .collect::<Vec<_>>()
            .join("; ");
        Self::generation_with_raw(format!("response does not match schema: {listed}"), raw)
    }

    /// True for failures of the network exchange itself.
    pub fn is_transport(&self) -> bool {
        matches!(self, ClerkError::Transport(_) | ClerkError::HttpStatus { .. })
    }

    /// Raw response text attached to a generation failure, if any.
    pub fn raw_response(&self) -> Option<&str> {
        match self {
            ClerkError::Generation { raw, .. } => raw.as_deref(),
            _ => None,
        }
    }
}
