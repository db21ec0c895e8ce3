pub mod json;
pub mod memory;

use std::collections::BTreeSet;

use anyhow::Result;
use serde::{Deserialize, Serialize};

use crate::scheduler::step::StepInstance;
use crate::sequence_loader::record::SequenceId;

/// Persistent entry for one distinct residue sequence: its identity plus
/// every accession it has been seen under.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredSequence {
    pub identity: SequenceId,
    pub accessions: BTreeSet<String>,
}

impl StoredSequence {
    pub fn new(identity: SequenceId) -> Self {
        StoredSequence {
            identity,
            accessions: BTreeSet::new(),
        }
    }

    /// Idempotent; returns false when the accession was already recorded.
    pub fn add_accession(&mut self, accession: &str) -> bool {
        self.accessions.insert(accession.to_string())
    }
}

/// Durable map of sequence identity to observed accessions. Repeating an
/// (identity, accession) upsert must be a no-op.
pub trait SequenceStore {
    fn lookup(&self, identity: &SequenceId) -> Result<Option<StoredSequence>>;
    fn upsert(&mut self, identity: &SequenceId, accession: &str) -> Result<StoredSequence>;
}

/// Durable, uniqueness-enforcing home for step instances. A batch lands in
/// full or not at all; a step id that already exists fails the whole batch.
pub trait StepInstanceStore {
    fn create_batch(&mut self, batch: &[StepInstance]) -> Result<()>;
    fn exists(&self, identity: &SequenceId, job_id: &str) -> Result<bool>;
}
