//! `cogflow tasks`: list registered task types.

use anyhow::Result;
use console::style;

use crate::state::AppState;

pub fn list_tasks(state: &AppState, json: bool) -> Result<()> {
    let names = state.registry.list_names();

    if json {
        let out = serde_json::json!({
            "tasks": names,
            "llm_provider": state.config.llm_provider,
            "default_model": state.config.default_model,
        });
        println!("{}", serde_json::to_string_pretty(&out)?);
        return Ok(());
    }

    println!();
    println!("  {}", style("── Task types ──").dim());
    for name in &names {
        println!("  {}", style(name).cyan());
    }
    println!();
    println!(
        "  LLM provider: {} (default model: {})",
        style(&state.config.llm_provider).bold(),
        state.config.default_model
    );
    println!();
    Ok(())
}
