// ABOUTME: Command implementations for the autodevops CLI
// ABOUTME: Handles run, named, validate and list commands

use anyhow::Result;
use std::path::PathBuf;
use tracing::info;

use crate::engine::{named, ExecutionReport, WorkflowExecutor};
use crate::template::Inputs;

/// Execute a workflow from the definition store
pub async fn run_workflow(
    executor: &WorkflowExecutor,
    workflow_id: &str,
    inputs: &Inputs,
    output: Option<PathBuf>,
) -> Result<()> {
    info!(
        "Starting workflow execution: {} ({} inputs)",
        workflow_id,
        inputs.len()
    );

    let report = executor.execute_workflow(workflow_id, inputs).await?;
    finish(report, output)
}

/// Execute a built-in named workflow
pub async fn run_named_workflow(
    executor: &WorkflowExecutor,
    name: &str,
    inputs: &Inputs,
    output: Option<PathBuf>,
) -> Result<()> {
    info!("Starting named workflow: {} ({} inputs)", name, inputs.len());

    let report = executor.execute_named_workflow(name, inputs).await?;
    finish(report, output)
}

/// Validate a workflow from the definition store
pub async fn validate_workflow(executor: &WorkflowExecutor, workflow_id: &str) -> Result<()> {
    info!("Validating workflow: {}", workflow_id);

    let definition = executor.load_definition(workflow_id).await?;
    let plan = executor.validate(&definition)?;

    println!("✓ Workflow '{}' is valid", definition.id);
    println!("  Namespace: {}", definition.namespace);
    println!("  Tasks: {}", plan.steps.len());
    for step in &plan.steps {
        println!("    {} ({})", step.task_id, step.kind);
    }

    Ok(())
}

/// List workflows in the definition store and built-in named workflows
pub async fn list_workflows(executor: &WorkflowExecutor) -> Result<()> {
    let stored = executor.store().list().await?;

    println!("Workflows:");
    if stored.is_empty() {
        println!("  (none)");
    }
    for workflow_id in stored {
        println!("  {}", workflow_id);
    }

    println!("Named workflows:");
    for name in named::names() {
        println!("  {}", name);
    }

    Ok(())
}

/// Print or write the report, then map a failed run to an error exit
fn finish(report: ExecutionReport, output: Option<PathBuf>) -> Result<()> {
    let json_content = serde_json::to_string_pretty(&report)
        .map_err(|e| anyhow::anyhow!("Failed to serialize report to JSON: {}", e))?;

    match output {
        Some(output_path) => {
            std::fs::write(&output_path, json_content).map_err(|e| {
                anyhow::anyhow!(
                    "Failed to write output file '{}': {}",
                    output_path.display(),
                    e
                )
            })?;
            info!("Report written to: {}", output_path.display());
        }
        None => println!("{}", json_content),
    }

    if report.is_successful() {
        Ok(())
    } else {
        Err(anyhow::anyhow!(
            "Workflow '{}' failed at task '{}': {}",
            report.workflow_id,
            report.failed_task.as_deref().unwrap_or("unknown"),
            report.error_detail.as_deref().unwrap_or("no detail")
        ))
    }
}
