//! Cogflow CLI entry point.
//!
//! Binary name: `cogflow`
//!
//! Parses CLI arguments, loads engine configuration, builds the task
//! registry, then dispatches to the command handler. Exit code is 0 on
//! success, 2 when the workflow fails validation, and 1 on any other failure.

mod cli;
mod state;

use std::process::ExitCode;

use clap::Parser;
use console::style;

use cli::{Cli, Commands};
use cogflow_core::workflow::definition::{DefinitionError, ValidationErrors};
use cogflow_core::workflow::runner::RunError;
use cogflow_observe::tracing_setup::{init_tracing, shutdown_tracing, verbosity_filter};
use state::{AppState, Overrides};

/// Exit code for a workflow rejected by validation.
const EXIT_INVALID: u8 = 2;

#[tokio::main]
async fn main() -> ExitCode {
    // A missing .env is fine.
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();

    let filter = verbosity_filter(cli.verbosity(), cli.quiet);
    if let Err(e) = init_tracing(filter, cli.otel) {
        eprintln!("Warning: failed to initialize tracing: {e}");
    }

    let result = dispatch(cli).await;
    shutdown_tracing();

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("  {} {err:#}", style("error:").red().bold());
            exit_code(&err)
        }
    }
}

async fn dispatch(cli: Cli) -> anyhow::Result<()> {
    match cli.command {
        Commands::Run {
            workflow,
            resume,
            no_checkpoint,
            checkpoint_dir,
            concurrency,
            json,
        } => {
            let state = AppState::init(Overrides {
                checkpoint_dir,
                concurrency,
            })
            .await?;
            cli::run::handle_run(&state, &workflow, resume, no_checkpoint, json).await
        }

        Commands::Validate { workflow, json } => {
            let state = AppState::init(Overrides::default()).await?;
            cli::validate::handle_validate(&state, &workflow, json).await
        }

        Commands::Tasks { json } => {
            let state = AppState::init(Overrides::default()).await?;
            tracing::debug!(data_dir = %state.data_dir.display(), "listing task types");
            cli::tasks::list_tasks(&state, json)
        }
    }
}

fn exit_code(err: &anyhow::Error) -> ExitCode {
    if is_validation_failure(err) {
        ExitCode::from(EXIT_INVALID)
    } else {
        ExitCode::FAILURE
    }
}

fn is_validation_failure(err: &anyhow::Error) -> bool {
    matches!(err.downcast_ref::<RunError>(), Some(RunError::Validation(_)))
        || matches!(
            err.downcast_ref::<DefinitionError>(),
            Some(DefinitionError::Invalid(_))
        )
        || err.downcast_ref::<ValidationErrors>().is_some()
}
