use std::path::Path;

use anyhow::Result;

use crate::config::Config;
use crate::jobs::JobRegistry;

pub fn run(jobs_file: Option<String>) -> Result<()> {
    let config = match &jobs_file {
        Some(path) => Config::load_from(Path::new(path))?,
        None => Config::load(),
    };
    let registry = JobRegistry::new(config.jobs);

    if registry.is_empty() {
        println!("No jobs configured. Add [[jobs]] entries to the config or pass --jobs-file.");
        return Ok(());
    }

    println!("{} configured jobs:", registry.len());
    for job in registry.iter() {
        let kind = if job.analysis { "analysis" } else { "other" };
        match &job.description {
            Some(description) => println!("  {:<24} {:<8} {}", job.id, kind, description),
            None => println!("  {:<24} {}", job.id, kind),
        }
    }
    Ok(())
}
