//! Error types for the Mutado core library
//!
//! This module defines the error handling system for Mutado, using thiserror
//! for ergonomic error definitions and anyhow for flexible error contexts.
//! Every core failure surfaces at configuration/build time; an absent child
//! during a non-creating lookup is an `Option`, not an error.

use std::fmt;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Main error type for Mutado operations
#[derive(Error, Debug)]
pub enum Error {
    /// A path's static root type does not match the node it is traversed against
    #[error("Structural mismatch: expected {expected}, found {actual}")]
    StructuralMismatch {
        expected: String,
        actual: String,
    },

    /// Traversal or extraction encountered an expression shape it has no rule for
    #[error("Unsupported expression shape: {shape} in {context}")]
    UnsupportedExpression {
        shape: String,
        context: String,
    },

    /// Member access against an object type that does not declare the member
    #[error("Unknown member: {object} has no member '{member}'")]
    UnknownMember {
        object: String,
        member: String,
    },

    /// Indexer access against a type that carries no indexer
    #[error("Missing indexer: type {ty} has no indexer")]
    MissingIndexer {
        ty: String,
    },

    /// Indexer parameters must fold to compile-time constants
    #[error("Non-constant indexer parameter: {expression}")]
    NonConstantIndexer {
        expression: String,
    },

    /// Filter extraction met a link it cannot rewrite
    #[error("Filter extraction failed: {message} at link {link}")]
    FilterExtraction {
        message: String,
        link: String,
    },

    /// Expression evaluation failed against live data
    #[error("Evaluation error: {message} at {path}")]
    Evaluation {
        message: String,
        path: String,
    },

    /// JSON parsing and serialization errors
    #[error("JSON error: {message}")]
    Json {
        message: String,
        #[source]
        source: serde_json::Error,
    },

    /// Generic internal error with context
    #[error("Internal error: {message}")]
    Internal {
        message: String,
        #[source]
        source: anyhow::Error,
    },
}

/// Convenience type alias for Results using our Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Severity levels for validation findings
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Severity {
    /// Informational, no action required
    Info,
    /// Warning, should be reviewed
    Warning,
    /// Error, the record is not acceptable
    Error,
    /// Critical, processing must stop
    Critical,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Info => write!(f, "info"),
            Severity::Warning => write!(f, "warning"),
            Severity::Error => write!(f, "error"),
            Severity::Critical => write!(f, "critical"),
        }
    }
}

impl Error {
    /// Build an unsupported-shape error from any debuggable expression node
    pub fn unsupported(shape: impl fmt::Display, context: impl Into<String>) -> Self {
        Error::UnsupportedExpression {
            shape: shape.to_string(),
            context: context.into(),
        }
    }
}

// Conversion implementations
impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Json {
            message: err.to_string(),
            source: err,
        }
    }
}

impl From<anyhow::Error> for Error {
    fn from(err: anyhow::Error) -> Self {
        Error::Internal {
            message: err.to_string(),
            source: err,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = Error::StructuralMismatch {
            expected: "A".to_string(),
            actual: "B".to_string(),
        };
        assert_eq!(err.to_string(), "Structural mismatch: expected A, found B");
    }

    #[test]
    fn test_unsupported_helper() {
        let err = Error::unsupported("Binary", "traversal");
        assert!(err.to_string().contains("Binary"));
        assert!(err.to_string().contains("traversal"));
    }

    #[test]
    fn test_severity_ordering() {
        assert!(Severity::Info < Severity::Warning);
        assert!(Severity::Warning < Severity::Error);
        assert!(Severity::Error < Severity::Critical);
    }

    #[test]
    fn test_severity_display() {
        assert_eq!(Severity::Warning.to_string(), "warning");
        assert_eq!(Severity::Critical.to_string(), "critical");
    }
}
