//! A minimal in-memory `FactSource` shared by the crate's integration
//! tests: test-only scaffolding, not a shipped storage backend.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;

use factgraph_core::prelude::*;
use factgraph_core::runtime::value::{FactTree, FactTreeRef, PredecessorTree};

pub struct MemorySource {
    records: HashMap<String, FactRecord>,
    successors_by_predecessor: Mutex<HashMap<String, Vec<(String, String)>>>,
}

impl MemorySource {
    pub fn new(records: Vec<FactRecord>) -> Self {
        let mut by_key = HashMap::new();
        let mut successors_by_predecessor: HashMap<String, Vec<(String, String)>> = HashMap::new();
        for r in &records {
            by_key.insert(r.reference().join_key(), r.clone());
        }
        for r in &records {
            for (role, value) in &r.predecessors {
                let refs: Vec<&FactReference> = match value {
                    PredecessorValue::Single(x) => vec![x],
                    PredecessorValue::Many(xs) => xs.iter().collect(),
                };
                for pred_ref in refs {
                    successors_by_predecessor
                        .entry(pred_ref.join_key())
                        .or_default()
                        .push((role.clone(), r.reference().join_key()));
                }
            }
        }
        Self {
            records: by_key,
            successors_by_predecessor: Mutex::new(successors_by_predecessor),
        }
    }
}

#[async_trait]
impl FactSource for MemorySource {
    async fn find_fact(&self, reference: &FactReference) -> FactResult<Option<FactRecord>> {
        Ok(self.records.get(&reference.join_key()).cloned())
    }

    async fn get_predecessors(
        &self,
        reference: &FactReference,
        role_name: &str,
        predecessor_type: &str,
    ) -> FactResult<Vec<FactReference>> {
        let record = match self.records.get(&reference.join_key()) {
            Some(r) => r,
            None => return Ok(Vec::new()),
        };
        let mut out = Vec::new();
        match record.predecessors.get(role_name) {
            Some(PredecessorValue::Single(r)) if r.fact_type == predecessor_type => {
                out.push(r.clone());
            }
            Some(PredecessorValue::Many(refs)) => {
                out.extend(refs.iter().filter(|r| r.fact_type == predecessor_type).cloned());
            }
            _ => {}
        }
        Ok(out)
    }

    async fn get_successors(
        &self,
        reference: &FactReference,
        role_name: &str,
        successor_type: &str,
    ) -> FactResult<Vec<FactReference>> {
        let map = self.successors_by_predecessor.lock().unwrap();
        let mut out = Vec::new();
        if let Some(entries) = map.get(&reference.join_key()) {
            for (role, succ_key) in entries {
                if role == role_name {
                    if let Some(rec) = self.records.get(succ_key) {
                        if rec.fact_type == successor_type {
                            out.push(rec.reference());
                        }
                    }
                }
            }
        }
        Ok(out)
    }

    async fn hydrate(&self, reference: &FactReference) -> FactResult<FactTree> {
        let record = self
            .records
            .get(&reference.join_key())
            .ok_or_else(|| FactError::hydration_conflict("reference does not resolve to any fact"))?;
        let mut predecessors = PredecessorTree::new();
        for (role, value) in &record.predecessors {
            match value {
                PredecessorValue::Single(r) => {
                    let tree = self.hydrate(r).await?;
                    predecessors.insert(role.clone(), FactTreeRef::Single(Box::new(tree)));
                }
                PredecessorValue::Many(refs) => {
                    let mut trees = Vec::new();
                    for r in refs {
                        trees.push(self.hydrate(r).await?);
                    }
                    predecessors.insert(role.clone(), FactTreeRef::Many(trees));
                }
            }
        }
        Ok(FactTree {
            fact_type: record.fact_type.clone(),
            hash: record.hash.clone(),
            fields: record.fields.clone(),
            predecessors,
        })
    }
}

/// Install a `tracing` subscriber that prints to the test harness's
/// captured stdout, so `cargo test -- --nocapture` shows the crate's
/// `trace!`/`debug!` instrumentation. Safe to call from multiple tests
/// in the same binary: subsequent calls are no-ops.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();
}

pub fn fact(fact_type: &str, hash: &str, fields: FieldMap, preds: PredecessorMap) -> FactRecord {
    FactRecord {
        fact_type: fact_type.to_string(),
        hash: hash.to_string(),
        predecessors: preds,
        fields,
    }
}
