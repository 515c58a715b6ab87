//! CLI command definitions.

use crate::config::OutputFormat;
use clap::{Subcommand, ValueEnum};
use std::path::PathBuf;

#[derive(Subcommand)]
pub enum Commands {
    /// Validate pipeline configuration
    Validate {
        /// Path to pipeline configuration file
        #[arg(default_value = "pipelines.yaml")]
        pipelines: PathBuf,
    },

    /// Resolve the revisions a new run of a pipeline would use
    Resolve {
        /// Path to pipeline configuration file
        #[arg(short, long, default_value = "pipelines.yaml")]
        pipelines: PathBuf,

        /// Path to history snapshot
        #[arg(short = 'H', long, default_value = "history.yaml")]
        history: PathBuf,

        /// Pipeline to resolve
        #[arg(short = 'n', long)]
        pipeline: String,

        /// Build cause to start from (defaults to the latest revision of
        /// every material)
        #[arg(short, long)]
        given: Option<PathBuf>,

        /// Maximum upstream instances to examine per material
        #[arg(long)]
        max_backtrack: Option<usize>,

        /// Upstream instances examined per scan step
        #[arg(long)]
        batch_size: Option<usize>,

        /// Reconcile upstream revisions without a build cause
        #[arg(long)]
        report: bool,

        /// Output format
        #[arg(short, long, value_enum)]
        output: Option<OutputFormat>,
    },

    /// Print the JSON schema of an input file
    Schema {
        #[arg(value_enum)]
        target: SchemaTarget,
    },

    /// Manage configuration
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum SchemaTarget {
    Pipelines,
    History,
    Fanin,
}

#[derive(Subcommand)]
pub enum ConfigCommands {
    /// Show current configuration
    Show,

    /// Set configuration value
    Set {
        /// Key
        key: String,

        /// Value
        value: String,
    },
}
