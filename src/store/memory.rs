use std::collections::{HashMap, HashSet};

use anyhow::{bail, Result};

use crate::scheduler::step::{StepInstance, StepInstanceId};
use crate::sequence_loader::record::SequenceId;

use super::{SequenceStore, StepInstanceStore, StoredSequence};

/// HashMap-backed sequence store for tests and dry runs.
#[derive(Debug, Default)]
pub struct MemorySequenceStore {
    sequences: HashMap<SequenceId, StoredSequence>,
}

impl MemorySequenceStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.sequences.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sequences.is_empty()
    }

    pub fn get(&self, identity: &SequenceId) -> Option<&StoredSequence> {
        self.sequences.get(identity)
    }
}

impl SequenceStore for MemorySequenceStore {
    fn lookup(&self, identity: &SequenceId) -> Result<Option<StoredSequence>> {
        Ok(self.sequences.get(identity).cloned())
    }

    fn upsert(&mut self, identity: &SequenceId, accession: &str) -> Result<StoredSequence> {
        let entry = self
            .sequences
            .entry(identity.clone())
            .or_insert_with(|| StoredSequence::new(identity.clone()));
        entry.add_accession(accession);
        Ok(entry.clone())
    }
}

/// HashMap-backed step instance store for tests and dry runs.
#[derive(Debug, Default)]
pub struct MemoryStepStore {
    steps: HashMap<StepInstanceId, StepInstance>,
}

impl MemoryStepStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    pub fn get(&self, id: &StepInstanceId) -> Option<&StepInstance> {
        self.steps.get(id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &StepInstance> {
        self.steps.values()
    }
}

impl StepInstanceStore for MemoryStepStore {
    fn create_batch(&mut self, batch: &[StepInstance]) -> Result<()> {
        let mut incoming: HashSet<&StepInstanceId> = HashSet::with_capacity(batch.len());
        for step in batch {
            if self.steps.contains_key(&step.id) || !incoming.insert(&step.id) {
                bail!("step instance {} already exists", step.id);
            }
        }
        for step in batch {
            self.steps.insert(step.id.clone(), step.clone());
        }
        Ok(())
    }

    fn exists(&self, identity: &SequenceId, job_id: &str) -> Result<bool> {
        Ok(self
            .steps
            .contains_key(&StepInstance::id_for(job_id, identity)))
    }
}
