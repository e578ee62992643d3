//! The fact model and declaration list.
//!
//! This module defines the strongly-typed Rust representation of facts:
//! references, predecessor maps, records, envelopes, and the
//! declaration list used by the textual prelude. It holds no hashing
//! logic itself — see `crate::determinism::hashing` for canonical
//! encoding and digest computation.

pub mod declaration;
pub mod fact;

pub use declaration::{DeclaredFact, Declaration};
pub use fact::{
    fact_reference_equals, unique_fact_references, FactEnvelope, FactRecord, FactReference,
    FieldMap, FieldValue, PredecessorMap, PredecessorValue, Signature,
};
