// ABOUTME: Error types for workflow definition parsing and validation
// ABOUTME: Defines the structural problems that make a definition invalid

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ParserError {
    #[error("Failed to read workflow file: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Failed to parse YAML: {0}")]
    YamlError(#[from] serde_yaml::Error),

    #[error("Missing required field: {0}")]
    MissingField(String),
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ValidationError {
    #[error("Malformed definition: {reason}")]
    Malformed { reason: String },

    #[error("Empty workflow: no tasks defined")]
    EmptyWorkflow,

    #[error("Task at position {position} has an empty id")]
    EmptyTaskId { position: usize },

    #[error("Duplicate task id: {task}")]
    DuplicateTask { task: String },

    #[error("Unsupported task type '{task_type}' in task '{task}'. Supported types: {supported_types:?}")]
    UnsupportedTaskType {
        task: String,
        task_type: String,
        supported_types: Vec<String>,
    },

    #[error("Invalid template syntax in '{field}': {error}")]
    InvalidTemplate { field: String, error: String },

    #[error("Task '{task}' references results of unknown task '{reference}'")]
    UnknownReference { task: String, reference: String },

    #[error("Task '{task}' references results of '{reference}', which does not run before it")]
    ForwardReference { task: String, reference: String },
}

pub type Result<T> = std::result::Result<T, ParserError>;
