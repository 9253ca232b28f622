//! Error types for the confirmation engine
//!
//! Two classes of failure:
//! - **Validation problems**: user-correctable, collected exhaustively before
//!   anything is written, surfaced together in one [`ValidationFailure`]
//! - **Integrity faults**: conditions validation should have ruled out; they
//!   abort the transaction and are logged, not shown as guidance

use indexmap::IndexSet;
use labflow_store::StoreError;
use serde::{Deserialize, Serialize};

/// Main engine error type
#[derive(Debug, thiserror::Error)]
pub enum ConfirmError {
    /// The request failed validation; nothing was persisted
    #[error("{0}")]
    Validation(ValidationFailure),

    /// Execution hit a state validation should have prevented
    #[error("integrity fault: {0}")]
    Integrity(String),

    /// Storage failed
    #[error("store error: {0}")]
    Store(#[from] StoreError),

    /// Configuration could not be loaded
    #[error("configuration error: {0}")]
    Config(String),
}

impl ConfirmError {
    /// Build an integrity fault
    #[inline]
    pub fn integrity(message: impl Into<String>) -> Self {
        Self::Integrity(message.into())
    }

    /// Check if the caller can fix the request and resubmit
    #[inline]
    #[must_use]
    pub fn is_user_correctable(&self) -> bool {
        matches!(self, Self::Validation(_))
    }

    /// Check if resubmitting the same request may succeed
    #[inline]
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Store(e) if e.is_retryable())
    }

    /// Problems reported by validation, if that is why the request failed
    #[must_use]
    pub fn problems(&self) -> Option<&[String]> {
        match self {
            Self::Validation(failure) => Some(failure.problems()),
            _ => None,
        }
    }
}

impl From<ValidationFailure> for ConfirmError {
    fn from(value: ValidationFailure) -> Self {
        Self::Validation(value)
    }
}

/// Every problem found while validating one request
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationFailure {
    message: String,
    problems: Vec<String>,
}

impl ValidationFailure {
    /// Create from collected problems, keeping their order
    #[must_use]
    pub fn new(message: impl Into<String>, problems: IndexSet<String>) -> Self {
        Self {
            message: message.into(),
            problems: problems.into_iter().collect(),
        }
    }

    /// Summary line
    #[inline]
    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Individual problems, in the order they were found
    #[inline]
    #[must_use]
    pub fn problems(&self) -> &[String] {
        &self.problems
    }
}

impl std::fmt::Display for ValidationFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({} problems)", self.message, self.problems.len())?;
        for problem in &self.problems {
            write!(f, "\n  - {problem}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn failure() -> ValidationFailure {
        let mut problems = IndexSet::new();
        problems.insert("No labware specified.".to_string());
        problems.insert("Unknown comment IDs: [4].".to_string());
        problems.insert("No labware specified.".to_string());
        ValidationFailure::new("The request could not be validated.", problems)
    }

    #[test]
    fn validation_failure_keeps_distinct_problems_in_order() {
        let failure = failure();
        assert_eq!(
            failure.problems(),
            ["No labware specified.", "Unknown comment IDs: [4]."]
        );
    }

    #[test]
    fn validation_failure_display_lists_problems() {
        let text = failure().to_string();
        assert!(text.starts_with("The request could not be validated. (2 problems)"));
        assert!(text.contains("\n  - Unknown comment IDs: [4]."));
    }

    #[test]
    fn error_classes() {
        let validation = ConfirmError::from(failure());
        assert!(validation.is_user_correctable());
        assert_eq!(validation.problems().map(<[String]>::len), Some(2));

        let integrity = ConfirmError::integrity("plan action vanished");
        assert!(!integrity.is_user_correctable());
        assert!(integrity.problems().is_none());

        let conflict = ConfirmError::from(StoreError::Conflict { base: 0, current: 1 });
        assert!(conflict.is_retryable());
        assert!(!integrity.is_retryable());
    }
}
