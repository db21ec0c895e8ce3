use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Load a FASTA file, dedup it against the sequence store, and create
    /// step instances for every newly seen sequence
    Load {
        /// Path to the FASTA file, or "-" to read standard input
        fasta_file: String,

        /// Comma-separated analysis job names (default: every analysis job
        /// in the registry)
        #[arg(long)]
        applications: Option<String>,

        /// Job that runs once a sequence's analysis steps have all finished
        #[arg(long)]
        completion_job: String,

        /// Do not let downstream steps consult the precalculated match lookup
        #[arg(long)]
        disable_match_lookup: bool,

        /// Read the job registry and store locations from this TOML file
        /// instead of the platform config
        #[arg(long)]
        jobs_file: Option<String>,

        /// Override the sequence journal location
        #[arg(long)]
        sequence_store: Option<String>,

        /// Override the step instance journal location
        #[arg(long)]
        step_store: Option<String>,
    },

    /// List the jobs configured in the registry
    Jobs {
        /// Read the job registry from this TOML file instead of the platform
        /// config
        #[arg(long)]
        jobs_file: Option<String>,
    },
}
