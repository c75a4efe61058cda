//! `cogflow validate`: parse and validate a workflow without running it.

use std::path::Path;

use anyhow::Result;
use console::style;

use cogflow_core::workflow::definition::{load_workflow_file, DefinitionError};

use crate::state::AppState;

pub async fn handle_validate(state: &AppState, path: &Path, json: bool) -> Result<()> {
    let def = match load_workflow_file(path, &state.registry).await {
        Ok(def) => def,
        Err(DefinitionError::Invalid(errors)) if json => {
            let issues: Vec<String> = errors.issues().iter().map(ToString::to_string).collect();
            let out = serde_json::json!({ "valid": false, "issues": issues });
            println!("{}", serde_json::to_string_pretty(&out)?);
            return Err(DefinitionError::Invalid(errors).into());
        }
        Err(err) => return Err(err.into()),
    };

    if json {
        let steps: Vec<_> = def
            .steps
            .iter()
            .map(|s| serde_json::json!({ "id": s.id, "type": s.task_type }))
            .collect();
        let out = serde_json::json!({
            "valid": true,
            "name": def.name,
            "steps": steps,
        });
        println!("{}", serde_json::to_string_pretty(&out)?);
        return Ok(());
    }

    println!();
    println!(
        "  {} Workflow '{}' is valid",
        style("✓").green().bold(),
        style(&def.name).cyan()
    );
    println!();
    for (index, step) in def.steps.iter().enumerate() {
        println!(
            "  {:>3}. {} {}",
            index + 1,
            style(&step.id).bold(),
            style(format!("({})", step.task_type)).dim()
        );
    }
    println!();
    Ok(())
}
