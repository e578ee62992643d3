//! The topological sorter.
//!
//! Orders a batch of fact records so that every predecessor precedes
//! every successor within the batch. Predecessors that are not present
//! in the input batch are permitted and ignored — the sorter assumes
//! they already exist in the fact source. Cycles (only reachable by
//! tampering with records after hashing, since content addressing makes
//! the fact DAG acyclic by construction) are reported as
//! `CircularDependency`.
//!
//! Uses Kahn's algorithm: nodes are input records keyed by
//! `"{type}:{hash}"`, edges run predecessor → successor, and ties among
//! equal in-degree nodes are broken by input order (stable), matching
//! the determinism posture of `crate::determinism::stable_sort`.

use std::collections::{BTreeMap, VecDeque};

use crate::errors::{FactError, FactResult};
use crate::model::fact::FactRecord;

/// Sort `records` so every predecessor (that is itself present in the
/// batch) appears before its successors.
pub fn topological_sort(records: Vec<FactRecord>) -> FactResult<Vec<FactRecord>> {
    let n = records.len();

    // Map join-key -> index into `records`, and detect duplicate facts in
    // the same batch (not a spec'd invariant violation, but a degenerate
    // input we should not silently misorder).
    let mut index_of: BTreeMap<String, usize> = BTreeMap::new();
    for (i, r) in records.iter().enumerate() {
        index_of.insert(r.reference().join_key(), i);
    }

    // Build edges: predecessor index -> successor indices, restricted to
    // predecessors present in this batch. Track in-degree (number of
    // in-batch predecessors) per node.
    let mut successors: Vec<Vec<usize>> = vec![Vec::new(); n];
    let mut in_degree: Vec<usize> = vec![0; n];

    for (i, r) in records.iter().enumerate() {
        for pred_ref in r.predecessor_references() {
            if let Some(&pred_idx) = index_of.get(&pred_ref.join_key()) {
                successors[pred_idx].push(i);
                in_degree[i] += 1;
            }
        }
    }

    // Kahn's algorithm. A `VecDeque` used as a FIFO queue seeded in input
    // order preserves stability among nodes that become ready at the same
    // time.
    let mut ready: VecDeque<usize> = (0..n).filter(|&i| in_degree[i] == 0).collect();
    let mut order: Vec<usize> = Vec::with_capacity(n);
    let mut emitted = vec![false; n];

    while let Some(i) = ready.pop_front() {
        order.push(i);
        emitted[i] = true;
        for &succ in &successors[i] {
            in_degree[succ] -= 1;
            if in_degree[succ] == 0 {
                ready.push_back(succ);
            }
        }
    }

    if order.len() != n {
        return Err(FactError::circular_dependency(
            "batch contains a predecessor cycle",
        ));
    }

    let sorted: Vec<FactRecord> = order.into_iter().map(|i| records[i].clone()).collect();
    validate_order(&sorted)?;
    Ok(sorted)
}

/// Secondary pass: re-scan the emitted order and assert the
/// predecessor-before-successor property holds. Any violation here is an
/// internal bug in `topological_sort`, not a caller error.
fn validate_order(sorted: &[FactRecord]) -> FactResult<()> {
    let mut position: BTreeMap<String, usize> = BTreeMap::new();
    for (i, r) in sorted.iter().enumerate() {
        position.insert(r.reference().join_key(), i);
    }

    for (i, r) in sorted.iter().enumerate() {
        for pred_ref in r.predecessor_references() {
            if let Some(&pred_pos) = position.get(&pred_ref.join_key()) {
                if pred_pos >= i {
                    return Err(FactError::internal(
                        "topological sort produced an order violating predecessor-before-successor",
                    ));
                }
            }
        }
    }
    Ok(())
}
