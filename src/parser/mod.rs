// ABOUTME: Parser module for YAML workflow definitions
// ABOUTME: Exports definition structures, task kinds and plan validation

pub mod error;
pub mod task;
pub mod validation;
pub mod workflow;

pub use error::{ParserError, Result, ValidationError};
pub use task::{TaskKind, TaskParams, TaskSpec};
pub use validation::{ExecutionPlan, PlannedTask, ValidationReport, WorkflowValidator};
pub use workflow::WorkflowDefinition;
