//! Error types for factgraph-core.
//!
//! Every failure mode named in the specification's error table is a
//! variant here. Nothing in this crate panics outside of `#[cfg(test)]`
//! code and documented internal invariants; callers always get a
//! `FactResult<T>`.
//!
//! `GivenNotFound` is kept as a variant so a `FactSource` implementation
//! can return it explicitly, but the runner itself never surfaces it — a
//! missing given is recovered into an empty result sequence (see
//! `runtime::runner`).

use thiserror::Error;

/// Crate-wide result alias.
pub type FactResult<T> = Result<T, FactError>;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum FactError {
    #[error("invalid syntax at offset {offset}: {message}")]
    InvalidSyntax { message: String, offset: usize },

    #[error("invalid specification (label {label:?}): {message}")]
    InvalidSpecification { message: String, label: Option<String> },

    #[error("invalid fact: {message}")]
    InvalidFact { message: String },

    #[error("circular dependency: {message}")]
    CircularDependency { message: String },

    #[error("hydration conflict: {message}")]
    HydrationConflict { message: String },

    #[error("given not found")]
    GivenNotFound,

    #[error("forbidden: {message}")]
    Forbidden { message: String },

    #[error("internal invariant violated: {message}")]
    Internal { message: String },
}

impl FactError {
    pub fn invalid_syntax(message: impl Into<String>, offset: usize) -> Self {
        Self::InvalidSyntax {
            message: message.into(),
            offset,
        }
    }

    pub fn invalid_specification(message: impl Into<String>) -> Self {
        Self::InvalidSpecification {
            message: message.into(),
            label: None,
        }
    }

    pub fn invalid_specification_at(message: impl Into<String>, label: impl Into<String>) -> Self {
        Self::InvalidSpecification {
            message: message.into(),
            label: Some(label.into()),
        }
    }

    pub fn invalid_fact(message: impl Into<String>) -> Self {
        Self::InvalidFact {
            message: message.into(),
        }
    }

    pub fn circular_dependency(message: impl Into<String>) -> Self {
        Self::CircularDependency {
            message: message.into(),
        }
    }

    pub fn hydration_conflict(message: impl Into<String>) -> Self {
        Self::HydrationConflict {
            message: message.into(),
        }
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::Forbidden {
            message: message.into(),
        }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }
}
