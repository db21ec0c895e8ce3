use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use indicatif::{ProgressBar, ProgressStyle};

use crate::config::Config;
use crate::jobs::{select_jobs, JobRegistry};
use crate::scheduler::builder::WorkGraphBuilder;
use crate::sequence_loader::dedup::SequenceEvents;
use crate::sequence_loader::source::SequenceSource;
use crate::store::json::{JsonSequenceStore, JsonStepStore};

pub fn run(
    fasta_file: String,
    applications: Option<String>,
    completion_job: String,
    disable_match_lookup: bool,
    jobs_file: Option<String>,
    sequence_store: Option<String>,
    step_store: Option<String>,
) -> Result<()> {
    let config = match &jobs_file {
        Some(path) => Config::load_from(Path::new(path))?,
        None => Config::load(),
    };
    let registry = JobRegistry::new(config.jobs.clone());

    // Jobs resolve before the input is even opened: a bad job name must not
    // leave a partially scheduled store behind.
    let (analysis_jobs, completion) =
        select_jobs(&registry, applications.as_deref(), &completion_job)?;
    if analysis_jobs.is_empty() {
        log::warn!("no analysis jobs selected; only completion steps will be created");
    }

    let source = match SequenceSource::resolve(&fasta_file) {
        Ok(source) => source,
        Err(e) if e.is_benign_empty() => {
            log::warn!("{e}");
            println!("Loaded 0 records (0 new, 0 previously seen)");
            println!("Created 0 step instances for 0 sequences");
            return Ok(());
        }
        Err(e) => return Err(e.into()),
    };

    let sequence_store_path = sequence_store
        .map(PathBuf::from)
        .unwrap_or_else(|| config.sequence_store_path());
    let step_store_path = step_store
        .map(PathBuf::from)
        .unwrap_or_else(|| config.step_store_path());

    let mut sequences = JsonSequenceStore::open(&sequence_store_path).with_context(|| {
        format!(
            "failed to open sequence store {}",
            sequence_store_path.display()
        )
    })?;
    let mut steps = JsonStepStore::open(&step_store_path).with_context(|| {
        format!(
            "failed to open step instance store {}",
            step_store_path.display()
        )
    })?;

    let mut builder =
        WorkGraphBuilder::new(analysis_jobs, completion, &mut steps, !disable_match_lookup);

    let progress = ProgressBar::new_spinner();
    progress.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.green} [{elapsed_precise}] {msg} ({pos} records)")?,
    );
    progress.set_message(format!("Loading {fasta_file}"));

    let mut events = SequenceEvents::new(source, &mut sequences);
    for event in &mut events {
        let event = event?;
        builder.on_sequence(&event)?;
        progress.inc(1);
    }
    progress.finish_with_message(format!("Finished loading {fasta_file}"));

    let stats = events.stats().clone();
    drop(events);
    let schedule = builder.stats().clone();
    let job_names = builder.analysis_job_names();

    if let Err(e) = sequences.compact() {
        log::warn!(
            "failed to compact sequence journal {}: {e:#}",
            sequence_store_path.display()
        );
    }

    println!(
        "Loaded {} records ({} new, {} previously seen)",
        stats.records, stats.new_sequences, stats.known_sequences
    );
    println!(
        "Created {} step instances for {} sequences",
        schedule.steps_created, schedule.sequences_scheduled
    );
    if !job_names.is_empty() {
        println!("Analysis jobs: {job_names}");
    }
    Ok(())
}
