use crate::error::LoadError;
use crate::jobs::{Job, JobSet};
use crate::scheduler::step::StepInstance;
use crate::sequence_loader::dedup::SequenceEvent;
use crate::store::StepInstanceStore;

/// Counters for the graph-construction side of a run.
#[derive(Debug, Default, Clone)]
pub struct ScheduleStats {
    pub sequences_scheduled: u64,
    pub sequences_skipped: u64,
    pub steps_created: u64,
}

/// Turns "sequence observed" events into persisted step instances: one
/// analysis step per selected job, fanned back in through a per-sequence
/// completion barrier. Each sequence's set goes to the store as a single
/// batch before the next event is taken, so a crash can never leave a
/// sequence half-scheduled.
pub struct WorkGraphBuilder<'a, S: StepInstanceStore> {
    analysis_jobs: JobSet,
    completion_job: Job,
    step_store: &'a mut S,
    use_match_lookup: bool,
    stats: ScheduleStats,
}

impl<'a, S: StepInstanceStore> WorkGraphBuilder<'a, S> {
    pub fn new(
        analysis_jobs: JobSet,
        completion_job: Job,
        step_store: &'a mut S,
        use_match_lookup: bool,
    ) -> Self {
        WorkGraphBuilder {
            analysis_jobs,
            completion_job,
            step_store,
            use_match_lookup,
            stats: ScheduleStats::default(),
        }
    }

    /// Handle one dedup event. Known sequences were fully scheduled by a
    /// previous ingestion of this store and only bump a counter.
    pub fn on_sequence(&mut self, event: &SequenceEvent) -> Result<(), LoadError> {
        if !event.is_new {
            self.stats.sequences_skipped += 1;
            return Ok(());
        }

        let mut batch: Vec<StepInstance> = Vec::with_capacity(self.analysis_jobs.len() + 1);
        for job in self.analysis_jobs.iter() {
            batch.push(StepInstance::analysis(
                job,
                &event.identity,
                self.use_match_lookup,
            ));
        }
        let completion = StepInstance::completion(
            &self.completion_job,
            &event.identity,
            &batch,
            self.use_match_lookup,
        );
        batch.push(completion);

        self.step_store
            .create_batch(&batch)
            .map_err(|source| LoadError::StepPersist {
                accession: event.accession.clone(),
                identity: event.identity.clone(),
                source,
            })?;

        self.stats.sequences_scheduled += 1;
        self.stats.steps_created += batch.len() as u64;
        Ok(())
    }

    pub fn stats(&self) -> &ScheduleStats {
        &self.stats
    }

    /// Comma-joined names of the analysis jobs in play, for reporting back
    /// what a request for "all" actually resolved to.
    pub fn analysis_job_names(&self) -> String {
        self.analysis_jobs.job_names()
    }
}
