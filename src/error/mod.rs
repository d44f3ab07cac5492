//! Error handling module.
//!
//! `NoidError` is the single error type returned by the template engine, the
//! minter and the path resolver. `StorageError` is what state stores return;
//! the minter translates it depending on whether a read or a write failed.

pub mod codes;

pub use codes::{ErrorCategory, ErrorCode};

/// Crate-level error type.
#[derive(Debug, thiserror::Error)]
pub enum NoidError {
    /// Template string could not be parsed.
    #[error("Invalid template: {0}")]
    InvalidTemplate(String),

    /// Persisted minter state could not be read.
    #[error("Minter state unavailable: {0}")]
    StateUnavailable(#[source] StorageError),

    /// Minter state could not be written after a candidate was accepted.
    #[error("Failed to persist minter state: {0}")]
    Persistence(#[source] StorageError),

    /// Sequence space of a bounded template has been used up.
    #[error("Sequence exhausted for template: {0}")]
    SequenceExhausted(String),

    /// URI does not have the shape produced by the resolver.
    #[error("Malformed URI: {0}")]
    MalformedUri(String),

    /// Persisted state belongs to a different template.
    #[error("State template {found:?} does not match minter template {expected:?}")]
    TemplateMismatch {
        /// Template the minter was built with.
        expected: String,
        /// Template recorded in the state.
        found: String,
    },

    /// Invalid configuration value.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Process-wide settings were already initialized.
    #[error("Settings already initialized")]
    AlreadyConfigured,
}

impl NoidError {
    /// Get the error code for this error.
    #[must_use]
    pub const fn error_code(&self) -> ErrorCode {
        match self {
            Self::InvalidTemplate(_) => ErrorCode::INVALID_TEMPLATE,
            Self::InvalidConfig(_) => ErrorCode::INVALID_CONFIG,
            Self::AlreadyConfigured => ErrorCode::ALREADY_CONFIGURED,
            Self::StateUnavailable(_) => ErrorCode::STATE_UNAVAILABLE,
            Self::Persistence(_) => ErrorCode::PERSISTENCE_FAILED,
            Self::TemplateMismatch { .. } => ErrorCode::TEMPLATE_MISMATCH,
            Self::SequenceExhausted(_) => ErrorCode::SEQUENCE_EXHAUSTED,
            Self::MalformedUri(_) => ErrorCode::MALFORMED_URI,
        }
    }

    /// Whether retrying the same call may succeed.
    ///
    /// Only storage failures are transient; everything else is decided by
    /// configuration or input.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        matches!(self, Self::StateUnavailable(_) | Self::Persistence(_))
    }
}

/// State storage error type.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    /// Serialization/deserialization error.
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Lock acquisition failed.
    #[error("Failed to acquire lock: {0}")]
    LockFailed(String),

    /// File I/O error.
    #[error("File I/O error: {0}")]
    FileIO(String),

    /// Backend not available.
    #[error("Storage backend unavailable")]
    Unavailable,
}

impl From<std::io::Error> for StorageError {
    fn from(err: std::io::Error) -> Self {
        Self::FileIO(err.to_string())
    }
}

impl From<serde_json::Error> for StorageError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}

/// Result type alias using `NoidError`.
pub type Result<T> = std::result::Result<T, NoidError>;

/// Result type alias using `StorageError`.
pub type StorageResult<T> = std::result::Result<T, StorageError>;
