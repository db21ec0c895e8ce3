use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};

use crate::jobs::Job;

/// Process configuration: the job catalogue plus where the journals live.
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub jobs: Vec<Job>,
    #[serde(default)]
    pub sequence_store: Option<PathBuf>,
    #[serde(default)]
    pub step_store: Option<PathBuf>,
}

impl Config {
    /// Load from the platform config dir, falling back to defaults when the
    /// file is missing or unparseable.
    pub fn load() -> Self {
        if let Some(proj_dirs) = project_dirs() {
            let config_path = proj_dirs.config_dir().join("config.toml");
            if config_path.exists() {
                if let Ok(content) = fs::read_to_string(&config_path) {
                    match toml::from_str::<Config>(&content) {
                        Ok(config) => return config,
                        Err(e) => log::warn!(
                            "ignoring unparseable config {}: {e}",
                            config_path.display()
                        ),
                    }
                }
            }
        }
        Config::default()
    }

    /// Load an explicit config file. Unlike `load`, problems are hard errors.
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("failed to read config file {}", path.display()))?;
        toml::from_str(&content)
            .with_context(|| format!("failed to parse config file {}", path.display()))
    }

    pub fn sequence_store_path(&self) -> PathBuf {
        self.sequence_store
            .clone()
            .unwrap_or_else(|| data_dir().join("sequences.jsonl"))
    }

    pub fn step_store_path(&self) -> PathBuf {
        self.step_store
            .clone()
            .unwrap_or_else(|| data_dir().join("steps.jsonl"))
    }
}

fn project_dirs() -> Option<ProjectDirs> {
    ProjectDirs::from("com", "seqsched", "seqsched")
}

/// Where app-owned data (bundled sequence sets, default journals) lives.
pub(crate) fn data_dir() -> PathBuf {
    match project_dirs() {
        Some(dirs) => dirs.data_dir().to_path_buf(),
        None => PathBuf::from("."),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn explicit_config_parses_jobs_and_store_paths() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("jobs.toml");
        fs::write(
            &path,
            r#"
sequence_store = "/var/lib/seqsched/sequences.jsonl"

[[jobs]]
id = "pfam"
analysis = true
description = "Pfam HMM scan"

[[jobs]]
id = "completeA"
"#,
        )
        .unwrap();

        let config = Config::load_from(&path).unwrap();
        assert_eq!(config.jobs.len(), 2);
        assert!(config.jobs[0].analysis);
        assert_eq!(config.jobs[0].description.as_deref(), Some("Pfam HMM scan"));
        assert!(!config.jobs[1].analysis);
        assert_eq!(
            config.sequence_store_path(),
            PathBuf::from("/var/lib/seqsched/sequences.jsonl")
        );
        assert!(config
            .step_store_path()
            .to_string_lossy()
            .ends_with("steps.jsonl"));
    }

    #[test]
    fn missing_explicit_config_is_an_error() {
        let err = Config::load_from(Path::new("no/such/config.toml")).unwrap_err();
        assert!(err.to_string().contains("failed to read"));
    }
}
