use std::collections::{HashMap, HashSet};
use std::fs::{self, File, OpenOptions};
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tempfile::NamedTempFile;

use crate::scheduler::step::{StepInstance, StepInstanceId};
use crate::sequence_loader::record::SequenceId;

use super::{SequenceStore, StepInstanceStore, StoredSequence};

/// Journal line: one accession observation.
#[derive(Debug, Serialize, Deserialize)]
struct SequenceEntry {
    identity: SequenceId,
    accession: String,
}

/// Replay a JSON-lines journal. A torn final line (the mark of a crash mid
/// write) is dropped with a warning; damage anywhere earlier is corruption
/// and refuses to load.
fn replay<T, F>(path: &Path, mut apply: F) -> Result<()>
where
    T: DeserializeOwned,
    F: FnMut(T) -> Result<()>,
{
    let file = File::open(path).with_context(|| format!("failed to open {}", path.display()))?;
    let mut lines = BufReader::new(file).lines().peekable();
    let mut line_no = 0u64;
    while let Some(line) = lines.next() {
        line_no += 1;
        let line = line.with_context(|| format!("failed to read {}", path.display()))?;
        if line.trim().is_empty() {
            continue;
        }
        match serde_json::from_str::<T>(&line) {
            Ok(entry) => apply(entry)?,
            Err(e) => {
                if lines.peek().is_some() {
                    bail!("corrupt journal {} at line {line_no}: {e}", path.display());
                }
                log::warn!(
                    "dropping torn trailing entry in {} (line {line_no}): {e}",
                    path.display()
                );
            }
        }
    }
    Ok(())
}

fn open_journal(path: &Path) -> Result<File> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)
                .with_context(|| format!("failed to create {}", parent.display()))?;
        }
    }
    OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .with_context(|| format!("failed to open journal {}", path.display()))
}

fn append_line(journal: &mut File, path: &Path, line: &str) -> Result<()> {
    journal
        .write_all(line.as_bytes())
        .and_then(|()| journal.write_all(b"\n"))
        .with_context(|| format!("failed to append to journal {}", path.display()))
}

/// Append-only journal of accession observations, replayed into an index on
/// open. One line per upsert keeps a crash from touching earlier entries;
/// `compact` rewrites the file without the repeats.
#[derive(Debug)]
pub struct JsonSequenceStore {
    path: PathBuf,
    journal: File,
    index: HashMap<SequenceId, StoredSequence>,
}

impl JsonSequenceStore {
    pub fn open(path: &Path) -> Result<Self> {
        let mut index: HashMap<SequenceId, StoredSequence> = HashMap::new();
        if path.exists() {
            replay(path, |entry: SequenceEntry| {
                index
                    .entry(entry.identity.clone())
                    .or_insert_with(|| StoredSequence::new(entry.identity))
                    .add_accession(&entry.accession);
                Ok(())
            })?;
        }
        Ok(JsonSequenceStore {
            path: path.to_path_buf(),
            journal: open_journal(path)?,
            index,
        })
    }

    pub fn len(&self) -> usize {
        self.index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    /// Rewrite the journal as one entry per (identity, accession) pair,
    /// atomically replacing the old file.
    pub fn compact(&mut self) -> Result<()> {
        let dir = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        let mut tmp = NamedTempFile::new_in(dir)
            .with_context(|| format!("failed to stage compaction of {}", self.path.display()))?;
        for stored in self.index.values() {
            for accession in &stored.accessions {
                let line = serde_json::to_string(&SequenceEntry {
                    identity: stored.identity.clone(),
                    accession: accession.clone(),
                })?;
                writeln!(tmp, "{line}")?;
            }
        }
        tmp.flush()?;
        tmp.persist(&self.path)
            .with_context(|| format!("failed to replace journal {}", self.path.display()))?;
        self.journal = open_journal(&self.path)?;
        Ok(())
    }
}

impl SequenceStore for JsonSequenceStore {
    fn lookup(&self, identity: &SequenceId) -> Result<Option<StoredSequence>> {
        Ok(self.index.get(identity).cloned())
    }

    fn upsert(&mut self, identity: &SequenceId, accession: &str) -> Result<StoredSequence> {
        let entry = self
            .index
            .entry(identity.clone())
            .or_insert_with(|| StoredSequence::new(identity.clone()));
        if entry.add_accession(accession) {
            let line = serde_json::to_string(&SequenceEntry {
                identity: identity.clone(),
                accession: accession.to_string(),
            })?;
            let snapshot = entry.clone();
            append_line(&mut self.journal, &self.path, &line)?;
            return Ok(snapshot);
        }
        Ok(entry.clone())
    }
}

/// Append-only journal of step instance batches. Each line holds one
/// sequence's whole batch, which is the durability unit the builder relies
/// on: either every step of a sequence replays, or none of them do.
pub struct JsonStepStore {
    path: PathBuf,
    journal: File,
    index: HashMap<StepInstanceId, StepInstance>,
}

impl JsonStepStore {
    pub fn open(path: &Path) -> Result<Self> {
        let mut index: HashMap<StepInstanceId, StepInstance> = HashMap::new();
        if path.exists() {
            replay(path, |batch: Vec<StepInstance>| {
                for step in batch {
                    if index.contains_key(&step.id) {
                        bail!(
                            "corrupt journal {}: step instance {} recorded twice",
                            path.display(),
                            step.id
                        );
                    }
                    index.insert(step.id.clone(), step);
                }
                Ok(())
            })?;
        }
        Ok(JsonStepStore {
            path: path.to_path_buf(),
            journal: open_journal(path)?,
            index,
        })
    }

    pub fn len(&self) -> usize {
        self.index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    pub fn get(&self, id: &StepInstanceId) -> Option<&StepInstance> {
        self.index.get(id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &StepInstance> {
        self.index.values()
    }
}

impl StepInstanceStore for JsonStepStore {
    fn create_batch(&mut self, batch: &[StepInstance]) -> Result<()> {
        let mut incoming: HashSet<&StepInstanceId> = HashSet::with_capacity(batch.len());
        for step in batch {
            if self.index.contains_key(&step.id) || !incoming.insert(&step.id) {
                bail!("step instance {} already exists", step.id);
            }
        }

        let line = serde_json::to_string(batch)?;
        append_line(&mut self.journal, &self.path, &line)?;
        self.journal
            .sync_data()
            .with_context(|| format!("failed to sync journal {}", self.path.display()))?;

        for step in batch {
            self.index.insert(step.id.clone(), step.clone());
        }
        Ok(())
    }

    fn exists(&self, identity: &SequenceId, job_id: &str) -> Result<bool> {
        Ok(self
            .index
            .contains_key(&StepInstance::id_for(job_id, identity)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::jobs::Job;

    fn job(id: &str) -> Job {
        Job {
            id: id.to_string(),
            description: None,
            analysis: true,
        }
    }

    #[test]
    fn sequence_journal_replays_on_open() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sequences.jsonl");
        let identity = SequenceId::of_residues(b"MKVLAA");
        let other = SequenceId::of_residues(b"GGGG");

        {
            let mut store = JsonSequenceStore::open(&path).unwrap();
            store.upsert(&identity, "P1").unwrap();
            store.upsert(&identity, "P2").unwrap();
            store.upsert(&other, "P3").unwrap();
        }

        let store = JsonSequenceStore::open(&path).unwrap();
        assert_eq!(store.len(), 2);
        let stored = store.lookup(&identity).unwrap().unwrap();
        assert_eq!(stored.accessions.len(), 2);
        assert!(stored.accessions.contains("P1"));
        assert!(stored.accessions.contains("P2"));
    }

    #[test]
    fn compact_keeps_every_accession() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sequences.jsonl");
        let identity = SequenceId::of_residues(b"MKVLAA");

        let mut store = JsonSequenceStore::open(&path).unwrap();
        store.upsert(&identity, "P1").unwrap();
        store.upsert(&identity, "P2").unwrap();
        store.compact().unwrap();
        // The journal must stay usable after compaction.
        store.upsert(&identity, "P3").unwrap();
        drop(store);

        let store = JsonSequenceStore::open(&path).unwrap();
        let stored = store.lookup(&identity).unwrap().unwrap();
        assert_eq!(stored.accessions.len(), 3);
    }

    #[test]
    fn step_batches_survive_reopen_and_stay_unique() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("steps.jsonl");
        let identity = SequenceId::of_residues(b"MKVLAA");
        let batch = vec![
            StepInstance::analysis(&job("pfam"), &identity, true),
            StepInstance::analysis(&job("prints"), &identity, true),
        ];

        {
            let mut store = JsonStepStore::open(&path).unwrap();
            store.create_batch(&batch).unwrap();
        }

        let mut store = JsonStepStore::open(&path).unwrap();
        assert_eq!(store.len(), 2);
        assert!(store.exists(&identity, "pfam").unwrap());
        let err = store.create_batch(&batch).unwrap_err();
        assert!(err.to_string().contains("already exists"));
        assert_eq!(store.len(), 2);
    }

    #[test]
    fn torn_trailing_line_is_dropped() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sequences.jsonl");
        let identity = SequenceId::of_residues(b"MKVLAA");

        {
            let mut store = JsonSequenceStore::open(&path).unwrap();
            store.upsert(&identity, "P1").unwrap();
        }
        let mut raw = fs::read_to_string(&path).unwrap();
        raw.push_str("{\"identity\":\"abc");
        fs::write(&path, raw).unwrap();

        let store = JsonSequenceStore::open(&path).unwrap();
        assert_eq!(store.len(), 1);
        assert!(store.lookup(&identity).unwrap().is_some());
    }

    #[test]
    fn damage_before_the_tail_refuses_to_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sequences.jsonl");
        let identity = SequenceId::of_residues(b"MKVLAA");

        {
            let mut store = JsonSequenceStore::open(&path).unwrap();
            store.upsert(&identity, "P1").unwrap();
        }
        let raw = fs::read_to_string(&path).unwrap();
        fs::write(&path, format!("not json\n{raw}")).unwrap();

        let err = JsonSequenceStore::open(&path).unwrap_err();
        assert!(err.to_string().contains("corrupt journal"));
    }
}
