use serde::{Deserialize, Serialize};

use crate::error::LoadError;

/// One configured pipeline. `analysis` separates real analyses from
/// bookkeeping jobs such as completion barriers, which are addressable by
/// name but excluded from "run everything".
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Job {
    pub id: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub analysis: bool,
}

/// Immutable, insertion-ordered job catalogue. Built once from configuration
/// and handed to whoever needs lookups; there is no process-wide registry.
#[derive(Debug, Clone, Default)]
pub struct JobRegistry {
    jobs: Vec<Job>,
}

impl JobRegistry {
    /// First entry wins when the same id is configured twice.
    pub fn new(jobs: Vec<Job>) -> Self {
        let mut unique: Vec<Job> = Vec::with_capacity(jobs.len());
        for job in jobs {
            if !unique.iter().any(|j| j.id == job.id) {
                unique.push(job);
            }
        }
        JobRegistry { jobs: unique }
    }

    pub fn by_id(&self, name: &str) -> Option<&Job> {
        self.jobs.iter().find(|j| j.id == name)
    }

    /// Every analysis job, in registry order.
    pub fn analysis_jobs(&self) -> JobSet {
        let mut set = JobSet::default();
        for job in self.jobs.iter().filter(|j| j.analysis) {
            set.push(job.clone());
        }
        set
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Job> {
        self.jobs.iter()
    }

    pub fn len(&self) -> usize {
        self.jobs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.jobs.is_empty()
    }
}

/// Ordered, duplicate-free selection of jobs for one run.
#[derive(Debug, Clone, Default)]
pub struct JobSet {
    jobs: Vec<Job>,
}

impl JobSet {
    pub fn push(&mut self, job: Job) {
        if !self.jobs.iter().any(|j| j.id == job.id) {
            self.jobs.push(job);
        }
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Job> {
        self.jobs.iter()
    }

    pub fn len(&self) -> usize {
        self.jobs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.jobs.is_empty()
    }

    /// Comma-joined ids in selection order.
    pub fn job_names(&self) -> String {
        self.jobs
            .iter()
            .map(|j| j.id.as_str())
            .collect::<Vec<_>>()
            .join(",")
    }
}

/// Resolve the run's analysis set and completion job. `None` selects every
/// analysis job in registry order; an explicit list is comma-delimited and
/// each name must resolve. Lookup only; nothing is created here.
pub fn select_jobs(
    registry: &JobRegistry,
    analysis_names: Option<&str>,
    completion_name: &str,
) -> Result<(JobSet, Job), LoadError> {
    let analysis_jobs = match analysis_names {
        None => registry.analysis_jobs(),
        Some(names) => {
            let mut set = JobSet::default();
            for name in names.split(',') {
                let name = name.trim();
                if name.is_empty() {
                    continue;
                }
                let job = registry.by_id(name).ok_or_else(|| LoadError::UnknownJob {
                    name: name.to_string(),
                })?;
                set.push(job.clone());
            }
            set
        }
    };

    let completion_job = registry
        .by_id(completion_name)
        .ok_or_else(|| LoadError::UnknownJob {
            name: completion_name.to_string(),
        })?
        .clone();

    Ok((analysis_jobs, completion_job))
}
