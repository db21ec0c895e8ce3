/// Counters for one ingestion pass.
#[derive(Debug, Default, Clone)]
pub struct LoadStats {
    pub records: u64,
    pub new_sequences: u64,
    pub known_sequences: u64,
}
