use std::fmt;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// One decoded FASTA record. Transient: lives only long enough to be keyed
/// and reported by the dedup pass.
#[derive(Debug, Clone)]
pub struct SequenceRecord {
    pub accession: String,
    pub residues: Vec<u8>,
}

impl SequenceRecord {
    pub fn identity(&self) -> SequenceId {
        SequenceId::of_residues(&self.residues)
    }
}

/// Content identity of a residue sequence: lowercase hex SHA-256 over the
/// residue bytes. Records with identical residues share an identity no
/// matter which accessions they arrived under.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SequenceId(String);

impl SequenceId {
    pub fn of_residues(residues: &[u8]) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(residues);
        SequenceId(format!("{:x}", hasher.finalize()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SequenceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
