//! Terminal pipeline execution command.

use console::style;

use crate::config::Settings;
use crate::models::ExecutionMode;
use crate::pipeline::PipelineOrchestrator;
use crate::repository::run_migrations;

/// Create a run and execute the pipeline, printing the outcome.
pub async fn cmd_run(
    settings: &Settings,
    query: &str,
    mode: &str,
    title: Option<String>,
) -> anyhow::Result<()> {
    let mode = ExecutionMode::from_str(mode)
        .ok_or_else(|| anyhow::anyhow!("Invalid mode {:?}: expected \"dummy\" or \"real\"", mode))?;

    run_migrations(&settings.database_url).await?;

    let orchestrator = PipelineOrchestrator::from_settings(settings)?;

    let run = orchestrator.create_run(query, title).await?;
    println!(
        "{} Created run {} ({})",
        style("→").cyan(),
        run.id,
        run.model_provider
    );

    println!(
        "{} Executing pipeline in {} mode...",
        style("→").cyan(),
        mode.as_str()
    );
    let detail = orchestrator.execute(run.id, mode).await?;

    println!(
        "  {} Run {} with {} steps and {} sources",
        style("✓").green(),
        detail.run.status.as_str(),
        detail.steps.len(),
        detail.sources.len()
    );

    if let Some(answer) = &detail.answer {
        println!();
        println!("{}", style("Answer").bold());
        println!("{}", answer.content);
    }

    Ok(())
}
