//! Error code constants.
//!
//! Error codes are organized by category:
//! - 1xxx: Template and configuration errors
//! - 2xxx: Minter state errors
//! - 3xxx: Sequence errors
//! - 4xxx: Resolution errors

/// Error code type with semantic categories.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ErrorCode(i32);

impl ErrorCode {
    // ===== Template/Configuration Errors (1xxx) =====

    /// Template string is malformed.
    pub const INVALID_TEMPLATE: Self = Self(1001);

    /// Invalid configuration parameters.
    pub const INVALID_CONFIG: Self = Self(1002);

    /// Settings were installed twice.
    pub const ALREADY_CONFIGURED: Self = Self(1003);

    // ===== State Errors (2xxx) =====

    /// State medium unreachable on read.
    pub const STATE_UNAVAILABLE: Self = Self(2001);

    /// State write failed.
    pub const PERSISTENCE_FAILED: Self = Self(2002);

    /// Persisted state belongs to another template.
    pub const TEMPLATE_MISMATCH: Self = Self(2003);

    // ===== Sequence Errors (3xxx) =====

    /// Sequence exhausted (reached limit).
    pub const SEQUENCE_EXHAUSTED: Self = Self(3001);

    // ===== Resolution Errors (4xxx) =====

    /// URI could not be translated to an identifier.
    pub const MALFORMED_URI: Self = Self(4001);

    /// Get the error code as an i32.
    #[must_use]
    pub const fn as_i32(self) -> i32 {
        self.0
    }

    /// Get the category of this error code.
    #[must_use]
    pub const fn category(&self) -> ErrorCategory {
        match self.0 {
            1000..=1999 => ErrorCategory::Configuration,
            2000..=2999 => ErrorCategory::State,
            3000..=3999 => ErrorCategory::Sequence,
            4000..=4999 => ErrorCategory::Resolution,
            _ => ErrorCategory::Unknown,
        }
    }
}

impl std::fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<ErrorCode> for i32 {
    fn from(code: ErrorCode) -> Self {
        code.0
    }
}

/// Error category based on error code range.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// Template or configuration errors (1xxx).
    Configuration,
    /// Minter state errors (2xxx).
    State,
    /// Sequence errors (3xxx).
    Sequence,
    /// URI/path resolution errors (4xxx).
    Resolution,
    /// Unknown category.
    Unknown,
}

impl std::fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Configuration => write!(f, "configuration"),
            Self::State => write!(f, "state"),
            Self::Sequence => write!(f, "sequence"),
            Self::Resolution => write!(f, "resolution"),
            Self::Unknown => write!(f, "unknown"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_code_values() {
        assert_eq!(ErrorCode::INVALID_TEMPLATE.as_i32(), 1001);
        assert_eq!(ErrorCode::STATE_UNAVAILABLE.as_i32(), 2001);
        assert_eq!(ErrorCode::SEQUENCE_EXHAUSTED.as_i32(), 3001);
        assert_eq!(ErrorCode::MALFORMED_URI.as_i32(), 4001);
    }

    #[test]
    fn test_error_categories() {
        assert_eq!(
            ErrorCode::INVALID_TEMPLATE.category(),
            ErrorCategory::Configuration
        );
        assert_eq!(
            ErrorCode::PERSISTENCE_FAILED.category(),
            ErrorCategory::State
        );
        assert_eq!(
            ErrorCode::SEQUENCE_EXHAUSTED.category(),
            ErrorCategory::Sequence
        );
        assert_eq!(ErrorCode::MALFORMED_URI.category(), ErrorCategory::Resolution);
        assert_eq!(ErrorCode(42).category(), ErrorCategory::Unknown);
    }
}
