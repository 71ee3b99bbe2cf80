//! Error taxonomy shared by every planner operation.

use thiserror::Error;

/// Errors raised while building matrices, tours or rendered routes.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PlannerError {
    /// A parameter or input value was rejected.
    #[error("invalid input: {0}")]
    Validation(String),

    /// Fewer locations were supplied than the operation needs.
    #[error("at least {required} locations are required, got {actual}")]
    InsufficientData { required: usize, actual: usize },

    /// A referenced location name is not part of the location set.
    #[error("location not found: {name}")]
    NotFound { name: String },

    /// The provider could not be reached (timeout, refused connection).
    #[error("routing provider unavailable at {url}: {message}")]
    ProviderUnavailable { url: String, message: String },

    /// The provider answered with a non-success status or code.
    #[error("routing provider returned status {status} ({code}): {message}")]
    Provider {
        status: u16,
        code: String,
        message: String,
    },

    /// The provider answered, but the payload does not match its contract.
    #[error("malformed provider response: {0}")]
    MalformedResponse(String),

    /// Reading or writing a stored artifact failed.
    #[error("storage error at {path}: {message}")]
    Storage { path: String, message: String },
}

/// Coarse classification for callers choosing messaging and retry guidance.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    BadInput,
    NotFound,
    Upstream,
    Storage,
}

pub type Result<T> = std::result::Result<T, PlannerError>;

impl PlannerError {
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    pub fn malformed(message: impl Into<String>) -> Self {
        Self::MalformedResponse(message.into())
    }

    pub fn not_found(name: impl Into<String>) -> Self {
        Self::NotFound { name: name.into() }
    }

    pub fn storage(path: impl Into<String>, message: impl ToString) -> Self {
        Self::Storage {
            path: path.into(),
            message: message.to_string(),
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Validation(_) | Self::InsufficientData { .. } => ErrorKind::BadInput,
            Self::NotFound { .. } => ErrorKind::NotFound,
            Self::ProviderUnavailable { .. } | Self::Provider { .. } | Self::MalformedResponse(_) => {
                ErrorKind::Upstream
            }
            Self::Storage { .. } => ErrorKind::Storage,
        }
    }

    /// Whether repeating the same call later could succeed.
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::ProviderUnavailable { .. })
            || matches!(self, Self::Provider { status, .. } if *status >= 500 || *status == 429)
    }
}
