// ABOUTME: Error types for workflow execution
// ABOUTME: Covers the load-time failures that stop a run before any task executes

use thiserror::Error;

use crate::parser::ValidationError;

#[derive(Error, Debug)]
pub enum ExecutionError {
    #[error("Workflow not found: {workflow_id}")]
    WorkflowNotFound { workflow_id: String },

    #[error("Workflow definition '{workflow_id}' is invalid: {}", join_errors(.errors))]
    DefinitionInvalid {
        workflow_id: String,
        errors: Vec<ValidationError>,
    },

    #[error("Definition store unavailable: {0}")]
    StoreUnavailable(String),
}

fn join_errors(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(|e| e.to_string())
        .collect::<Vec<_>>()
        .join("; ")
}

pub type Result<T> = std::result::Result<T, ExecutionError>;
