use std::fs;
use std::io::Cursor;
use std::path::{Path, PathBuf};

use seqsched::commands;
use seqsched::jobs::{select_jobs, Job, JobRegistry};
use seqsched::scheduler::builder::WorkGraphBuilder;
use seqsched::scheduler::step::StepInstance;
use seqsched::sequence_loader::dedup::SequenceEvents;
use seqsched::sequence_loader::record::SequenceId;
use seqsched::sequence_loader::source::SequenceSource;
use seqsched::store::json::{JsonSequenceStore, JsonStepStore};
use seqsched::store::memory::{MemorySequenceStore, MemoryStepStore};
use seqsched::store::{SequenceStore, StepInstanceStore};

const JOBS_TOML: &str = r#"
[[jobs]]
id = "pfam"
analysis = true

[[jobs]]
id = "prints"
analysis = true

[[jobs]]
id = "completeA"
"#;

fn job(id: &str, analysis: bool) -> Job {
    Job {
        id: id.to_string(),
        description: None,
        analysis,
    }
}

fn registry() -> JobRegistry {
    JobRegistry::new(vec![
        job("pfam", true),
        job("prints", true),
        job("completeA", false),
    ])
}

fn run_load(
    fasta: &Path,
    jobs_file: &Path,
    sequence_store: &Path,
    step_store: &Path,
    completion_job: &str,
) -> anyhow::Result<()> {
    commands::load::run(
        fasta.to_string_lossy().into_owned(),
        Some("pfam,prints".to_string()),
        completion_job.to_string(),
        false,
        Some(jobs_file.to_string_lossy().into_owned()),
        Some(sequence_store.to_string_lossy().into_owned()),
        Some(step_store.to_string_lossy().into_owned()),
    )
}

fn fixture_paths(dir: &Path) -> (PathBuf, PathBuf, PathBuf) {
    let jobs_file = dir.join("jobs.toml");
    fs::write(&jobs_file, JOBS_TOML).expect("write jobs.toml");
    (
        jobs_file,
        dir.join("sequences.jsonl"),
        dir.join("steps.jsonl"),
    )
}

#[test]
fn duplicate_accessions_schedule_one_sequence() {
    let registry = registry();
    let (analysis_jobs, completion) =
        select_jobs(&registry, None, "completeA").expect("job selection");
    assert_eq!(analysis_jobs.job_names(), "pfam,prints");

    let mut sequences = MemorySequenceStore::new();
    let mut steps = MemoryStepStore::new();
    let mut builder = WorkGraphBuilder::new(analysis_jobs, completion, &mut steps, true);

    let source = SequenceSource::from_reader(
        "proteins.fasta",
        Box::new(Cursor::new(&b">P1\nMKVLAA\n>P2\nMKVLAA\n"[..])),
    );
    let mut events = SequenceEvents::new(source, &mut sequences);
    for event in &mut events {
        let event = event.expect("decode");
        builder.on_sequence(&event).expect("schedule");
    }

    assert_eq!(events.stats().records, 2);
    assert_eq!(events.stats().new_sequences, 1);
    assert_eq!(events.stats().known_sequences, 1);
    assert_eq!(builder.stats().steps_created, 3);
    drop(events);
    drop(builder);

    let identity = SequenceId::of_residues(b"MKVLAA");
    let stored = sequences
        .lookup(&identity)
        .unwrap()
        .expect("one stored sequence");
    let accessions: Vec<_> = stored.accessions.iter().cloned().collect();
    assert_eq!(accessions, vec!["P1".to_string(), "P2".to_string()]);
    assert_eq!(sequences.len(), 1);

    // 2 analysis steps and 1 completion barrier, not 4 analysis instances.
    assert_eq!(steps.len(), 3);
    let completion = steps
        .get(&StepInstance::id_for("completeA", &identity))
        .expect("completion step");
    assert_eq!(completion.depends_on.len(), 2);
    for job_id in ["pfam", "prints"] {
        assert!(steps.exists(&identity, job_id).unwrap());
        assert!(completion
            .depends_on
            .contains(&StepInstance::id_for(job_id, &identity)));
    }
}

#[test]
fn reingestion_creates_no_new_steps() {
    let dir = tempfile::tempdir().unwrap();
    let (jobs_file, sequence_store, step_store) = fixture_paths(dir.path());
    let fasta = dir.path().join("proteins.fasta");
    fs::write(&fasta, ">P1\nMKVLAA\n>P2\nGGGG\n").unwrap();

    run_load(&fasta, &jobs_file, &sequence_store, &step_store, "completeA")
        .expect("first ingestion");
    let steps = JsonStepStore::open(&step_store).unwrap();
    assert_eq!(steps.len(), 6, "2 sequences x (2 analysis + completion)");
    drop(steps);

    run_load(&fasta, &jobs_file, &sequence_store, &step_store, "completeA")
        .expect("second ingestion of the same input");

    let steps = JsonStepStore::open(&step_store).unwrap();
    assert_eq!(steps.len(), 6, "a rerun must not reschedule known sequences");
    let sequences = JsonSequenceStore::open(&sequence_store).unwrap();
    assert_eq!(sequences.len(), 2);
}

#[test]
fn unknown_completion_job_creates_nothing() {
    let dir = tempfile::tempdir().unwrap();
    let (jobs_file, sequence_store, step_store) = fixture_paths(dir.path());
    let fasta = dir.path().join("proteins.fasta");
    fs::write(&fasta, ">P1\nMKVLAA\n").unwrap();

    let err = run_load(&fasta, &jobs_file, &sequence_store, &step_store, "doesNotExist")
        .expect_err("selection must fail");
    assert!(err.to_string().contains("doesNotExist"));

    let steps = JsonStepStore::open(&step_store).unwrap();
    assert!(steps.is_empty(), "selection failure precedes any scheduling");
    let sequences = JsonSequenceStore::open(&sequence_store).unwrap();
    assert_eq!(sequences.len(), 0, "selection failure precedes any reading");
}

#[test]
fn upstream_empty_input_finishes_cleanly() {
    let dir = tempfile::tempdir().unwrap();
    let (jobs_file, sequence_store, step_store) = fixture_paths(dir.path());
    let fasta = dir.path().join("translated_orfs.fasta");
    fs::write(&fasta, "").unwrap();

    run_load(&fasta, &jobs_file, &sequence_store, &step_store, "completeA")
        .expect("an empty ORF result is not a failure");

    let steps = JsonStepStore::open(&step_store).unwrap();
    assert!(steps.is_empty());
}

#[test]
fn empty_user_input_fails_the_run() {
    let dir = tempfile::tempdir().unwrap();
    let (jobs_file, sequence_store, step_store) = fixture_paths(dir.path());
    let fasta = dir.path().join("proteins.fasta");
    fs::write(&fasta, "").unwrap();

    let err = run_load(&fasta, &jobs_file, &sequence_store, &step_store, "completeA")
        .expect_err("a user-supplied empty file is an error");
    assert!(err.to_string().contains("readable but empty"));
}
