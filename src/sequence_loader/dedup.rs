use std::io::{BufReader, Read};

use bio::io::fasta;

use crate::error::LoadError;
use crate::sequence_loader::record::{SequenceId, SequenceRecord};
use crate::sequence_loader::source::SequenceSource;
use crate::sequence_loader::stats::LoadStats;
use crate::store::SequenceStore;

/// One "sequence observed" notification from the dedup pass.
#[derive(Debug, Clone)]
pub struct SequenceEvent {
    pub identity: SequenceId,
    pub accession: String,
    /// True the first time this identity is seen in the store; false when the
    /// record only contributed another accession to a known sequence.
    pub is_new: bool,
}

/// Streaming dedup pass over a FASTA input. Decodes records one at a time,
/// keys each by content identity, records the accession in the sequence
/// store, and yields events in input order. The first error ends the stream;
/// no record is silently skipped. Seen-ness is the store's knowledge; the
/// pass itself holds only the record in flight.
pub struct SequenceEvents<'s, S: SequenceStore> {
    records: fasta::Records<BufReader<Box<dyn Read>>>,
    store: &'s mut S,
    label: String,
    stats: LoadStats,
    finished: bool,
}

impl<'s, S: SequenceStore> SequenceEvents<'s, S> {
    pub fn new(source: SequenceSource, store: &'s mut S) -> Self {
        let (label, reader) = source.into_parts();
        SequenceEvents {
            records: fasta::Reader::new(reader).records(),
            store,
            label,
            stats: LoadStats::default(),
            finished: false,
        }
    }

    pub fn stats(&self) -> &LoadStats {
        &self.stats
    }

    fn observe(&mut self, record: fasta::Record) -> Result<SequenceEvent, LoadError> {
        let record = self.decode(record)?;
        let identity = record.identity();

        let known = self
            .store
            .lookup(&identity)
            .map_err(|source| self.store_failure(&record.accession, &identity, source))?;
        let is_new = known.is_none();

        self.store
            .upsert(&identity, &record.accession)
            .map_err(|source| self.store_failure(&record.accession, &identity, source))?;

        self.stats.records += 1;
        if is_new {
            self.stats.new_sequences += 1;
        } else {
            self.stats.known_sequences += 1;
        }

        Ok(SequenceEvent {
            identity,
            accession: record.accession,
            is_new,
        })
    }

    fn decode(&self, record: fasta::Record) -> Result<SequenceRecord, LoadError> {
        if let Err(reason) = record.check() {
            return Err(self.malformed(reason));
        }
        if record.seq().is_empty() {
            return Err(self.malformed(format!("record \"{}\" has no residues", record.id())));
        }
        Ok(SequenceRecord {
            accession: record.id().to_string(),
            residues: record.seq().to_vec(),
        })
    }

    fn malformed(&self, reason: impl Into<String>) -> LoadError {
        LoadError::MalformedRecord {
            path: self.label.clone(),
            record_number: self.stats.records + 1,
            reason: reason.into(),
        }
    }

    fn store_failure(
        &self,
        accession: &str,
        identity: &SequenceId,
        source: anyhow::Error,
    ) -> LoadError {
        LoadError::SequencePersist {
            accession: accession.to_string(),
            identity: identity.clone(),
            source,
        }
    }
}

impl<'s, S: SequenceStore> Iterator for SequenceEvents<'s, S> {
    type Item = Result<SequenceEvent, LoadError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.finished {
            return None;
        }

        let record = match self.records.next() {
            None => {
                self.finished = true;
                return None;
            }
            Some(Err(e)) => {
                self.finished = true;
                return Some(Err(self.malformed(e.to_string())));
            }
            Some(Ok(record)) => record,
        };

        let result = self.observe(record);
        if result.is_err() {
            self.finished = true;
        }
        Some(result)
    }
}
