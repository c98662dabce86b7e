// ABOUTME: Main library module for the autodevops workflow engine
// ABOUTME: Exports all core modules and provides the public API

pub mod cli;
pub mod engine;
pub mod logging;
pub mod parser;
pub mod store;
pub mod tasks;
pub mod template;

// Re-export commonly used types
pub use cli::{App, Args, Config};
pub use engine::{ExecutionError, ExecutionReport, Status, TaskResult, WorkflowExecutor};
pub use logging::{ExecutionLogger, LogRecord, LogSink};
pub use parser::{TaskKind, TaskSpec, WorkflowDefinition, WorkflowValidator};
pub use store::{DefinitionStore, DirectoryStore, InMemoryStore};
pub use tasks::{HandlerTable, TaskHandler};
pub use template::Inputs;

// Error handling
pub type Result<T> = anyhow::Result<T>;

// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
