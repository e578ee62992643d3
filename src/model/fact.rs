//! The fact model.
//!
//! Facts are immutable, content-addressed records connected by named
//! predecessor edges. This module defines the pure data types; it holds
//! no hashing logic itself (see `crate::determinism::hashing`).

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// A reference to a fact by its type and content hash.
///
/// `fact_type` is a namespaced, dot-separated identifier (e.g.
/// `"MyApp.Office"`). `hash` is the base64 digest produced by
/// `crate::determinism::hashing::hash_fact`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct FactReference {
    #[serde(rename = "type")]
    pub fact_type: String,
    pub hash: String,
}

impl FactReference {
    pub fn new(fact_type: impl Into<String>, hash: impl Into<String>) -> Self {
        Self {
            fact_type: fact_type.into(),
            hash: hash.into(),
        }
    }

    /// Join key used by the sorter and storage planners: `"{type}:{hash}"`.
    pub fn join_key(&self) -> String {
        format!("{}:{}", self.fact_type, self.hash)
    }
}

/// Structural equality between two references. Exposed as a free
/// function (rather than relying solely on `PartialEq`) since several
/// call sites read more clearly naming the comparison directly.
pub fn fact_reference_equals(a: &FactReference, b: &FactReference) -> bool {
    a.fact_type == b.fact_type && a.hash == b.hash
}

/// Deduplicate a sequence of fact references, preserving the order of
/// first occurrence.
pub fn unique_fact_references(refs: impl IntoIterator<Item = FactReference>) -> Vec<FactReference> {
    let mut seen = std::collections::BTreeSet::new();
    let mut out = Vec::new();
    for r in refs {
        let key = r.join_key();
        if seen.insert(key) {
            out.push(r);
        }
    }
    out
}

/// A predecessor role's value: either a single reference or an ordered
/// sequence of references. Both forms are distinguished and both
/// permitted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PredecessorValue {
    Single(FactReference),
    Many(Vec<FactReference>),
}

impl PredecessorValue {
    /// All references carried by this role value, in declared order.
    pub fn references(&self) -> Vec<&FactReference> {
        match self {
            PredecessorValue::Single(r) => vec![r],
            PredecessorValue::Many(rs) => rs.iter().collect(),
        }
    }

    pub fn is_many(&self) -> bool {
        matches!(self, PredecessorValue::Many(_))
    }
}

/// A mapping from role name to predecessor value. Role names are
/// lexicographically ordered by construction (`BTreeMap`), which is
/// exactly the order the canonical hasher requires.
pub type PredecessorMap = BTreeMap<String, PredecessorValue>;

/// A JSON-literal field value: null, boolean, number, or UTF-8 string.
/// This is deliberately narrower than a general `serde_json::Value` —
/// facts never carry arrays or nested objects as field values.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    Null,
    Bool(bool),
    Number(serde_json::Number),
    String(String),
}

impl FieldValue {
    pub fn is_null(&self) -> bool {
        matches!(self, FieldValue::Null)
    }
}

/// A mapping from field name to field value, ordered lexicographically
/// by construction.
pub type FieldMap = BTreeMap<String, FieldValue>;

/// An immutable fact record.
///
/// Invariant (enforced by construction helpers in
/// `crate::determinism::hashing`, not by this type alone): `hash` equals
/// `hash_fact(&fields, &predecessors)`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FactRecord {
    #[serde(rename = "type")]
    pub fact_type: String,
    pub hash: String,
    pub predecessors: PredecessorMap,
    pub fields: FieldMap,
}

impl FactRecord {
    pub fn reference(&self) -> FactReference {
        FactReference::new(self.fact_type.clone(), self.hash.clone())
    }

    /// All distinct predecessor references, across every role, in
    /// lexicographic role order then declared sequence order.
    pub fn predecessor_references(&self) -> Vec<FactReference> {
        let mut out = Vec::new();
        for value in self.predecessors.values() {
            for r in value.references() {
                out.push(r.clone());
            }
        }
        out
    }
}

/// A fact record plus an ordered set of opaque signatures.
///
/// Signatures are opaque to the core: it neither produces nor verifies
/// them. Equality is defined on the contained record's `(type, hash)`
/// only — two envelopes wrapping the same fact are equal regardless of
/// which signatures they carry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FactEnvelope {
    pub fact: FactRecord,
    pub signatures: Vec<Signature>,
}

/// An opaque `(publicKey, signature)` pair. The core does not interpret
/// either field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Signature {
    pub public_key: String,
    pub signature: String,
}

impl PartialEq for FactEnvelope {
    fn eq(&self, other: &Self) -> bool {
        fact_reference_equals(&self.fact.reference(), &other.fact.reference())
    }
}
impl Eq for FactEnvelope {}
