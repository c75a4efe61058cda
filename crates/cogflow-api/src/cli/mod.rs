//! CLI command definitions and dispatch for the `cogflow` binary.
//!
//! Uses clap derive macros for argument parsing.

pub mod run;
pub mod tasks;
pub mod validate;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// Run declarative YAML workflows of chained tasks.
#[derive(Parser)]
#[command(name = "cogflow", version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Suppress all output except errors.
    #[arg(long, global = true)]
    pub quiet: bool,

    /// Detailed output (-v for verbose, -vv for debug/trace).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Enable debug logging (same as -vv).
    #[arg(long, global = true)]
    pub debug: bool,

    /// Export run and step spans as OpenTelemetry traces on stdout.
    #[arg(long, global = true)]
    pub otel: bool,

    #[command(subcommand)]
    pub command: Commands,
}

impl Cli {
    /// Effective `-v` count, with `--debug` counting as `-vv`.
    pub fn verbosity(&self) -> u8 {
        if self.debug {
            self.verbose.max(2)
        } else {
            self.verbose
        }
    }
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run a workflow.
    Run {
        /// Path to the YAML workflow file.
        #[arg(long, short = 'w')]
        workflow: PathBuf,

        /// Continue from the latest checkpoint of this workflow.
        #[arg(long)]
        resume: bool,

        /// Do not write checkpoints after each step.
        #[arg(long)]
        no_checkpoint: bool,

        /// Directory for checkpoints (overrides cogflow.toml).
        #[arg(long, env = "COGFLOW_CHECKPOINT_DIR")]
        checkpoint_dir: Option<PathBuf>,

        /// Default batch concurrency for steps that do not set one.
        #[arg(long)]
        concurrency: Option<usize>,

        /// Output machine-readable JSON instead of styled text.
        #[arg(long)]
        json: bool,
    },

    /// Parse and validate a workflow without running it.
    Validate {
        /// Path to the YAML workflow file.
        #[arg(long, short = 'w')]
        workflow: PathBuf,

        /// Output machine-readable JSON instead of styled text.
        #[arg(long)]
        json: bool,
    },

    /// List the registered task types.
    Tasks {
        /// Output machine-readable JSON instead of styled text.
        #[arg(long)]
        json: bool,
    },
}
