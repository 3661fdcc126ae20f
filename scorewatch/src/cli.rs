// scorewatch/src/cli.rs
//
// Single source of truth for all CLI definitions (Clap structs).

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "scorewatch")]
#[command(about = "Batch governance monitor for credit-scoring models", long_about = None)]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Table,
    Json,
}

#[derive(Subcommand)]
pub enum Commands {
    /// 📐 Builds the reference statistics from the training snapshot
    Reference {
        /// Project directory (holds scorewatch.yaml and the monitor/ artifacts)
        #[arg(long, default_value = ".")]
        project_dir: PathBuf,

        /// Training CSV (default: `paths.training` from the config)
        #[arg(long)]
        training: Option<PathBuf>,

        /// Model version stamped on the reference
        #[arg(long, env = "SCOREWATCH_MODEL_VERSION")]
        model_version: Option<String>,
    },

    /// 🚀 Scores a batch (or every CSV of a directory) and appends to the batch log
    Run {
        #[arg(long, default_value = ".")]
        project_dir: PathBuf,

        /// Batch CSV or directory of CSVs (default: `paths.default_batch`)
        #[arg(long)]
        batch: Option<PathBuf>,

        #[arg(long, value_enum, default_value = "table")]
        format: OutputFormat,

        /// Exit with code 2 when the overall status is ALERT
        #[arg(long)]
        fail_on_alert: bool,
    },

    /// ⚖️  Compares approval rates across groups under both cutoff policies
    Fairness {
        #[arg(long, default_value = ".")]
        project_dir: PathBuf,

        /// Scored CSV (default: `paths.default_batch`)
        #[arg(long)]
        data: Option<PathBuf>,

        /// Protected attribute column
        #[arg(long)]
        group: String,

        /// Outcome column, 0 = good (default: `labels.y_col`)
        #[arg(long)]
        outcome: Option<String>,

        /// Score column, lower = lower risk (default: `labels.p_col`)
        #[arg(long)]
        score: Option<String>,

        /// Target approval rate, strictly between 0 and 1
        #[arg(long, default_value = "0.40")]
        target: f64,

        /// Groups smaller than this are pooled into OTHER
        #[arg(long, default_value = "0")]
        min_group_size: usize,

        #[arg(long, value_enum, default_value = "table")]
        format: OutputFormat,
    },

    /// 🚦 Shows the classified status of the latest run
    Status {
        #[arg(long, default_value = ".")]
        project_dir: PathBuf,

        #[arg(long, value_enum, default_value = "table")]
        format: OutputFormat,

        /// Exit with code 2 when the overall status is ALERT
        #[arg(long)]
        fail_on_alert: bool,
    },

    /// 🔎 Checks that the reference covers every configured feature
    Check {
        #[arg(long, default_value = ".")]
        project_dir: PathBuf,
    },
}
