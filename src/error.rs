use std::fmt;
use std::io;

use thiserror::Error;

use crate::sequence_loader::record::SequenceId;

/// Why an existing, readable input turned out to be zero-length.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EmptyInputKind {
    /// The file name matches the output of the upstream ORF prediction stage
    /// (contains "orfs"). An empty file there means the predictor found no
    /// proteins, not that the run is broken.
    UpstreamEmpty,
    /// A user-supplied sequence file with no content.
    UserEmpty,
}

impl fmt::Display for EmptyInputKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EmptyInputKind::UpstreamEmpty => {
                f.write_str("the ORF prediction stage produced an empty result file")
            }
            EmptyInputKind::UserEmpty => f.write_str(
                "the sequence input file is readable but empty; provide a non-empty FASTA file",
            ),
        }
    }
}

/// Everything that can end an ingestion run. None of these are retried: the
/// first one encountered is reported and the run stops.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("cannot find the sequence input {path}: not an existing file path, and no bundled data entry at {bundled}")]
    InputNotFound { path: String, bundled: String },

    #[error("the sequence input {path} exists but cannot be read; check the file permissions")]
    UnreadableInput {
        path: String,
        #[source]
        source: io::Error,
    },

    #[error("{kind} ({path})")]
    EmptyInput { path: String, kind: EmptyInputKind },

    #[error("malformed sequence record #{record_number} in {path}: {reason}")]
    MalformedRecord {
        path: String,
        record_number: u64,
        reason: String,
    },

    #[error("unknown job name \"{name}\": not present in the job registry")]
    UnknownJob { name: String },

    #[error("sequence store operation failed for {identity} (accession {accession})")]
    SequencePersist {
        accession: String,
        identity: SequenceId,
        #[source]
        source: anyhow::Error,
    },

    #[error("failed to persist step instances for sequence {identity} (accession {accession})")]
    StepPersist {
        accession: String,
        identity: SequenceId,
        #[source]
        source: anyhow::Error,
    },
}

impl LoadError {
    /// An empty result from the upstream ORF stage is not an operational
    /// failure; callers are expected to finish cleanly with an empty summary.
    pub fn is_benign_empty(&self) -> bool {
        matches!(
            self,
            LoadError::EmptyInput {
                kind: EmptyInputKind::UpstreamEmpty,
                ..
            }
        )
    }
}
