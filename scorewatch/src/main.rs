// scorewatch/src/main.rs

mod cli;
mod commands;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use crate::cli::{Cli, Commands};

fn main() -> anyhow::Result<()> {
    // 1. Setup Logging (Tracing)
    // RUST_LOG=debug scorewatch run ... to see the details. Logs go to stderr
    // so that `--format json` output stays parseable.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Reference {
            project_dir,
            training,
            model_version,
        } => commands::reference::execute(project_dir, training, model_version),

        Commands::Run {
            project_dir,
            batch,
            format,
            fail_on_alert,
        } => commands::run::execute(project_dir, batch, format, fail_on_alert),

        Commands::Fairness {
            project_dir,
            data,
            group,
            outcome,
            score,
            target,
            min_group_size,
            format,
        } => commands::fairness::execute(commands::fairness::FairnessArgs {
            project_dir,
            data,
            group,
            outcome,
            score,
            target,
            min_group_size,
            format,
        }),

        Commands::Status {
            project_dir,
            format,
            fail_on_alert,
        } => commands::status::execute(project_dir, format, fail_on_alert),

        Commands::Check { project_dir } => commands::check::execute(project_dir),
    }
}
