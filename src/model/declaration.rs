//! Declarations: a textual prelude binding local names to facts or
//! references.
//!
//! A `Declaration` is an ordered list of `(name, DeclaredFact)` pairs.
//! Names are unique within a declaration; later entries may reference
//! earlier ones by name when building predecessor maps (that resolution
//! happens in `crate::spec::parser`, which knows how to turn `ident`
//! references in `factExpr` into already-declared `FactReference`s).

use crate::errors::{FactError, FactResult};
use crate::model::fact::{FactRecord, FactReference};

/// A fact named in a declaration: either a full record to be hashed and
/// saved, or a bare reference to a fact assumed to already exist.
#[derive(Debug, Clone, PartialEq)]
pub enum DeclaredFact {
    Full(FactRecord),
    Reference(FactReference),
}

impl DeclaredFact {
    pub fn reference(&self) -> FactReference {
        match self {
            DeclaredFact::Full(r) => r.reference(),
            DeclaredFact::Reference(r) => r.clone(),
        }
    }
}

/// An ordered, name-unique list of declared facts.
#[derive(Debug, Clone, Default)]
pub struct Declaration {
    entries: Vec<(String, DeclaredFact)>,
}

impl Declaration {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a new declaration entry. Fails with `InvalidFact` if the
    /// name is already declared — names are unique within a declaration.
    /// Callers building declarations programmatically are expected to
    /// declare in dependency order: a `factExpr` of `ident` form ("reuse
    /// a prior declaration") can only resolve to something already
    /// declared.
    pub fn push(&mut self, name: impl Into<String>, fact: DeclaredFact) -> FactResult<()> {
        let name = name.into();
        if self.entries.iter().any(|(n, _)| n == &name) {
            return Err(FactError::invalid_fact(format!(
                "duplicate declaration name: {name}"
            )));
        }
        self.entries.push((name, fact));
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &DeclaredFact)> {
        self.entries.iter().map(|(n, f)| (n.as_str(), f))
    }

    /// Resolve a name to its declared fact, searching only entries
    /// declared up to (but not including) `before_index` — used when
    /// validating that a `factExpr` of `ident` form only reuses a prior
    /// declaration.
    pub fn resolve_before(&self, name: &str, before_index: usize) -> Option<&DeclaredFact> {
        self.entries[..before_index.min(self.entries.len())]
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, f)| f)
    }

    pub fn resolve(&self, name: &str) -> Option<&DeclaredFact> {
        self.entries.iter().find(|(n, _)| n == name).map(|(_, f)| f)
    }
}
