use clap::Parser;

use seqsched::{cli, commands};

fn main() {
    env_logger::Builder::from_default_env()
        .format_timestamp(None)
        .init();

    let args = cli::Args::parse();

    let result = match args.command {
        cli::Commands::Load {
            fasta_file,
            applications,
            completion_job,
            disable_match_lookup,
            jobs_file,
            sequence_store,
            step_store,
        } => commands::load::run(
            fasta_file,
            applications,
            completion_job,
            disable_match_lookup,
            jobs_file,
            sequence_store,
            step_store,
        ),
        cli::Commands::Jobs { jobs_file } => commands::jobs::run(jobs_file),
    };

    if let Err(e) = result {
        eprintln!("Error: {e:#}");
        std::process::exit(1);
    }
}
