//! `cogflow run`: execute a workflow file.

use std::path::Path;

use anyhow::Result;
use console::style;

use cogflow_core::workflow::definition::load_workflow_file;
use cogflow_core::workflow::runner::{ExecutionResult, RunError, RunOptions};
use cogflow_types::workflow::{RunStatus, StepRecord, StepStatus};

use crate::state::AppState;

/// Load, validate and run the workflow at `path`.
pub async fn handle_run(
    state: &AppState,
    path: &Path,
    resume: bool,
    no_checkpoint: bool,
    json: bool,
) -> Result<()> {
    let def = load_workflow_file(path, &state.registry).await?;
    let runner = state.runner();
    let options = RunOptions {
        resume,
        checkpoints: !no_checkpoint,
    };

    if !json {
        println!();
        println!(
            "  {} Running workflow '{}' ({} steps)",
            style("▶").cyan().bold(),
            style(&def.name).cyan(),
            def.steps.len()
        );
        println!();
    }

    match runner.run(&def, &options).await {
        Ok(result) => {
            if json {
                print_result_json(&result)?;
            } else {
                print_result(&result, state);
            }
            Ok(())
        }
        Err(err) => {
            if json {
                print_failure_json(&err)?;
            } else if let Some(run) = err.failed_run() {
                print_steps(&run.steps);
                println!();
                println!(
                    "  {} Run '{}' aborted; rerun with --resume to continue from the last checkpoint",
                    style("✗").red().bold(),
                    run.run_key
                );
                println!();
            }
            Err(err.into())
        }
    }
}

fn print_result(result: &ExecutionResult, state: &AppState) {
    if let Some(step_id) = &result.resumed_from {
        println!(
            "  {}",
            style(format!("Resumed after step '{step_id}'")).dim()
        );
    }
    print_steps(&result.steps);
    println!();

    for warning in &result.checkpoint_warnings {
        println!("  {} {warning}", style("!").yellow().bold());
    }

    println!(
        "  {} Completed in {}ms",
        style("✓").green().bold(),
        result.duration_ms
    );
    let keys: Vec<&str> = result.context.keys().collect();
    println!("  Context keys: {}", style(keys.join(", ")).dim());
    println!(
        "  Checkpoints: {}",
        style(state.checkpoint_dir.join(&result.run_key).display()).dim()
    );
    println!();
}

fn print_steps(steps: &[StepRecord]) {
    for step in steps {
        let (mark, timing) = match step.status {
            StepStatus::Succeeded => (
                style("✓").green().to_string(),
                format!("{}ms", step.duration_ms),
            ),
            StepStatus::Failed => (
                style("✗").red().to_string(),
                format!("{}ms", step.duration_ms),
            ),
            StepStatus::Skipped => (style("↷").dim().to_string(), "skipped".to_string()),
            StepStatus::Pending | StepStatus::Running => {
                (style("·").dim().to_string(), "not run".to_string())
            }
        };
        println!(
            "  {mark} {} {} {}",
            style(&step.id).bold(),
            style(format!("({})", step.task_type)).dim(),
            style(timing).dim()
        );
    }
}

fn print_result_json(result: &ExecutionResult) -> Result<()> {
    let out = serde_json::json!({
        "run_key": result.run_key,
        "status": result.status,
        "resumed_from": result.resumed_from,
        "duration_ms": result.duration_ms,
        "steps": result.steps,
        "checkpoint_warnings": result.checkpoint_warnings,
        "context_keys": result.context.keys().collect::<Vec<_>>(),
    });
    println!("{}", serde_json::to_string_pretty(&out)?);
    Ok(())
}

fn print_failure_json(err: &RunError) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(&failure_json(err)?)?);
    Ok(())
}

/// Failures that never started a step still report the run as aborted.
fn failure_json(err: &RunError) -> Result<serde_json::Value> {
    let status = err.failed_run().map_or(RunStatus::Aborted, |run| run.status);
    let mut out = serde_json::json!({
        "status": status,
        "error": err.to_string(),
        "failed_step": err.step_id(),
    });
    if let Some(run) = err.failed_run() {
        out["run_key"] = serde_json::json!(run.run_key);
        out["steps"] = serde_json::to_value(&run.steps)?;
        out["context_keys"] = serde_json::json!(run.context.keys().collect::<Vec<_>>());
    }
    Ok(out)
}
