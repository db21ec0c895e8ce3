use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::jobs::Job;
use crate::sequence_loader::record::SequenceId;

/// Parameter key: the sequence identity a step operates on.
pub const SEQUENCE_ID_KEY: &str = "SEQUENCE_ID";
/// Parameter key: whether downstream steps may consult the precalculated
/// match lookup service. Forwarded verbatim, never interpreted here.
pub const USE_MATCH_LOOKUP_KEY: &str = "USE_MATCH_LOOKUP";

/// Identifies one step instance. Deterministic: a (job, sequence) pair
/// always maps to the same id, which is what lets the store refuse
/// duplicates across repeated ingestion runs.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct StepInstanceId(String);

impl StepInstanceId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for StepInstanceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Lifecycle of a step instance. This engine only ever writes `Created`;
/// the dispatch side owns every later transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StepState {
    Created,
    Scheduled,
    Running,
    Completed,
    Failed,
}

/// One unit of schedulable work: a job bound to a data locator, plus the
/// step instances that must finish before it may run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StepInstance {
    pub id: StepInstanceId,
    pub job_id: String,
    pub parameters: BTreeMap<String, String>,
    pub depends_on: Vec<StepInstanceId>,
    pub state: StepState,
}

impl StepInstance {
    pub fn id_for(job_id: &str, identity: &SequenceId) -> StepInstanceId {
        StepInstanceId(format!("{job_id}:{identity}"))
    }

    /// An analysis step over one sequence.
    pub fn analysis(job: &Job, identity: &SequenceId, use_match_lookup: bool) -> Self {
        StepInstance {
            id: Self::id_for(&job.id, identity),
            job_id: job.id.clone(),
            parameters: base_parameters(identity, use_match_lookup),
            depends_on: Vec::new(),
            state: StepState::Created,
        }
    }

    /// The completion barrier for one sequence: depends on every analysis
    /// step created for that same sequence.
    pub fn completion(
        job: &Job,
        identity: &SequenceId,
        analysis_steps: &[StepInstance],
        use_match_lookup: bool,
    ) -> Self {
        StepInstance {
            id: Self::id_for(&job.id, identity),
            job_id: job.id.clone(),
            parameters: base_parameters(identity, use_match_lookup),
            depends_on: analysis_steps.iter().map(|s| s.id.clone()).collect(),
            state: StepState::Created,
        }
    }

    pub fn sequence_id(&self) -> Option<&str> {
        self.parameters.get(SEQUENCE_ID_KEY).map(String::as_str)
    }
}

fn base_parameters(identity: &SequenceId, use_match_lookup: bool) -> BTreeMap<String, String> {
    let mut parameters = BTreeMap::new();
    parameters.insert(SEQUENCE_ID_KEY.to_string(), identity.to_string());
    parameters.insert(
        USE_MATCH_LOOKUP_KEY.to_string(),
        use_match_lookup.to_string(),
    );
    parameters
}
