//! factgraph-core
//!
//! Core primitives for a historical fact database: an append-only,
//! content-addressed DAG of immutable records ("facts") connected by
//! named predecessor edges, queried by a declarative graph-pattern
//! language ("specifications").
//!
//! This crate provides:
//! - the fact model and canonical hashing (`model`, `determinism::hashing`)
//! - a topological sorter for fact batches (`sorter`)
//! - the specification AST, descriptive-string parser/printer, skeleton
//!   builder, connectivity validator, and alpha-renamer (`spec`)
//! - the specification runner, inverter, and feed decomposer/cache
//!   (`runtime`)
//! - a generic compilation pipeline tying parsing, validation, and
//!   skeleton/feed registration together (`pipeline`)
//!
//! The crate does no I/O: concrete storage backends, network
//! transports, authentication/authorization, and cryptographic signing
//! are external collaborators that consume the interfaces defined here
//! (see `runtime::source::FactSource`), not part of this crate.

pub mod config;
pub mod determinism;
pub mod errors;
pub mod model;
pub mod pipeline;
pub mod runtime;
pub mod sorter;
pub mod spec;

pub use crate::errors::{FactError, FactResult};

/// Common version string for the descriptive-string DSL and skeleton
/// wire format.
pub const SPEC_LANGUAGE_VERSION: &str = "v1";

/// Convenience re-exports for common call sites.
pub mod prelude {
    pub use crate::config::{CoreConfig, HashAlgorithm, LimitsConfig, RunnerConfig};
    pub use crate::determinism::hashing::hash_fact;
    pub use crate::model::{
        DeclaredFact, Declaration, FactEnvelope, FactRecord, FactReference, FieldMap, FieldValue,
        PredecessorMap, PredecessorValue, Signature,
    };
    pub use crate::runtime::source::FactSource;
    pub use crate::runtime::value::Value;
    pub use crate::sorter::topological_sort;
    pub use crate::spec::ast::Specification;
    pub use crate::spec::parser::parse_specification;
    pub use crate::{FactError, FactResult};
}
