//! Error types for linkeval.

use thiserror::Error;

/// Result type for linkeval operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Error type for linkeval operations.
///
/// Only data-integrity problems in the ground truth are fatal; knowledge-base
/// lookup misses are handled by falling back to the `OTHER` type, and
/// degenerate aggregates report 0.0 instead of failing.
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum Error {
    /// A ground-truth label references a parent id that does not exist.
    #[error("Ground truth label {label} references nonexistent parent {parent}")]
    MissingParent {
        /// Id of the offending label.
        label: u32,
        /// The referenced parent id.
        parent: u32,
    },

    /// Parent/children links of two labels are not mutual inverses.
    #[error("Ground truth label {label} has inconsistent parent/child links with {other}")]
    InconsistentLinks {
        /// Id of the offending label.
        label: u32,
        /// Id of the label it disagrees with.
        other: u32,
    },

    /// The factor recursion revisited a label before it was memoized,
    /// meaning the ground-truth tree contains a cycle.
    #[error("Cycle detected in ground truth tree at label {label}")]
    FactorCycle {
        /// Id of the label at which the cycle was detected.
        label: u32,
    },

    /// A span lies outside the article text.
    #[error("Span [{start}, {end}) exceeds article length {len}")]
    SpanOutOfBounds {
        /// Span start (char offset).
        start: usize,
        /// Span end (char offset, exclusive).
        end: usize,
        /// Article length in chars.
        len: usize,
    },

    /// Serialization of a case or report failed.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl Error {
    /// Create a missing-parent error.
    pub fn missing_parent(label: u32, parent: u32) -> Self {
        Error::MissingParent { label, parent }
    }

    /// Create a factor-cycle error.
    pub fn factor_cycle(label: u32) -> Self {
        Error::FactorCycle { label }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = Error::missing_parent(7, 3);
        assert!(err.to_string().contains("nonexistent parent 3"));

        let err = Error::factor_cycle(2);
        assert!(err.to_string().contains("label 2"));
    }
}
