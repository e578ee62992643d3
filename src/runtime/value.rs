//! The dynamic projection value.
//!
//! Projections return heterogeneous trees whose shape is determined at
//! runtime by the specification being run, not by a static Rust type.
//! `Value` is the recursive tagged variant the runner builds results in;
//! callers deserialize or pattern-match on it at the process boundary.

use crate::model::fact::{FieldMap, FieldValue};

#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null,
    Bool(bool),
    Num(serde_json::Number),
    Str(String),
    Fact(Box<FactTree>),
    List(Vec<Value>),
    /// Field order is preserved (insertion order), matching the
    /// projection's component order rather than a sorted map.
    Object(Vec<(String, Value)>),
}

impl From<&FieldValue> for Value {
    fn from(v: &FieldValue) -> Self {
        match v {
            FieldValue::Null => Value::Null,
            FieldValue::Bool(b) => Value::Bool(*b),
            FieldValue::Number(n) => Value::Num(n.clone()),
            FieldValue::String(s) => Value::Str(s.clone()),
        }
    }
}

/// A hydrated fact: itself plus its predecessors, recursively hydrated,
/// matching the fact model's `(type, hash, fields, predecessors)` shape.
/// Produced by `crate::runtime::source::FactSource::hydrate`.
#[derive(Debug, Clone, PartialEq)]
pub struct FactTree {
    pub fact_type: String,
    pub hash: String,
    pub fields: FieldMap,
    pub predecessors: PredecessorTree,
}

pub type PredecessorTree = std::collections::BTreeMap<String, FactTreeRef>;

#[derive(Debug, Clone, PartialEq)]
pub enum FactTreeRef {
    Single(Box<FactTree>),
    Many(Vec<FactTree>),
}
