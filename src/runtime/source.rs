//! The fact source capability.
//!
//! The runner, inverter, and feed decomposer depend only on this trait —
//! never on a concrete storage backend. All four operations are
//! potentially suspending (a remote or on-disk store may need to block):
//! modeled here as `async fn`s via `async-trait`, so any executor can
//! drive them.

use async_trait::async_trait;

use crate::errors::FactResult;
use crate::model::fact::{FactReference, FactRecord};
use crate::runtime::value::FactTree;

#[async_trait]
pub trait FactSource: Send + Sync {
    /// Look up a fact by reference. `Ok(None)` means the fact is simply
    /// absent from this source — not an error.
    async fn find_fact(&self, reference: &FactReference) -> FactResult<Option<FactRecord>>;

    /// References of `reference`'s predecessors along `role_name`,
    /// restricted to `predecessor_type`.
    async fn get_predecessors(
        &self,
        reference: &FactReference,
        role_name: &str,
        predecessor_type: &str,
    ) -> FactResult<Vec<FactReference>>;

    /// References of facts of type `successor_type` that hold `reference`
    /// as their `role_name` predecessor.
    async fn get_successors(
        &self,
        reference: &FactReference,
        role_name: &str,
        successor_type: &str,
    ) -> FactResult<Vec<FactReference>>;

    /// Materialize `reference` with its transitive predecessors as a
    /// tree. Returns `HydrationConflict` if the ancestor closure is
    /// incomplete or inconsistent — a reference that should resolve to
    /// exactly one fact resolving to zero or more than one.
    async fn hydrate(&self, reference: &FactReference) -> FactResult<FactTree>;
}
