//! Innovation tracking — historical markings for edge genes.
//!
//! The first time an edge shape `(input node, output node)` appears anywhere
//! in a run it receives the next innovation number. Every later edge with
//! the same shape, in any genome, gets the same number. Crossover aligns
//! genes by these numbers instead of comparing graph shapes.

use phylo_core::error::{GenomeError, PhyloError, Result};
use phylo_core::types::{InnovationNumber, NodeId, StructuralKey};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// One entry of the innovation table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct InnovationRecord {
    pub key: StructuralKey,
    pub innovation: InnovationNumber,
}

/// Append-only map from structural key to innovation number.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct InnovationTracker {
    table: BTreeMap<StructuralKey, InnovationNumber>,
    next: u64,
}

impl InnovationTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the number already assigned to this shape, or assign the
    /// next one. Call exactly once per newly created edge.
    pub fn lookup_or_assign(&mut self, input: NodeId, output: NodeId) -> InnovationNumber {
        let key = StructuralKey::new(input, output);
        if let Some(innovation) = self.table.get(&key) {
            return *innovation;
        }
        let innovation = InnovationNumber(self.next);
        self.next += 1;
        self.table.insert(key, innovation);
        innovation
    }

    /// Look up a shape without assigning.
    pub fn get(&self, input: NodeId, output: NodeId) -> Option<InnovationNumber> {
        self.table.get(&StructuralKey::new(input, output)).copied()
    }

    /// The number the next new shape will receive.
    pub fn next_innovation(&self) -> InnovationNumber {
        InnovationNumber(self.next)
    }

    pub fn len(&self) -> usize {
        self.table.len()
    }

    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }

    /// Snapshot of the table, ordered by innovation number.
    pub fn records(&self) -> Vec<InnovationRecord> {
        let mut records: Vec<InnovationRecord> = self
            .table
            .iter()
            .map(|(key, innovation)| InnovationRecord {
                key: *key,
                innovation: *innovation,
            })
            .collect();
        records.sort_by_key(|r| r.innovation);
        records
    }

    /// Rebuild a tracker from a snapshot.
    ///
    /// Rejects duplicate keys, duplicate numbers and numbers at or beyond
    /// `next`, any of which would break the append-only guarantee.
    pub fn from_records(records: Vec<InnovationRecord>, next: InnovationNumber) -> Result<Self> {
        let mut table = BTreeMap::new();
        let mut seen = std::collections::BTreeSet::new();
        for record in records {
            if record.innovation >= next || !seen.insert(record.innovation) {
                return Err(PhyloError::Genome(GenomeError::DuplicateInnovation(
                    record.innovation,
                )));
            }
            if table.insert(record.key, record.innovation).is_some() {
                return Err(PhyloError::invalid_config(
                    "innovations",
                    record.key,
                    "structural key recorded twice",
                ));
            }
        }
        Ok(Self {
            table,
            next: next.0,
        })
    }
}
