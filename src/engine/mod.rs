// ABOUTME: Workflow execution engine
// ABOUTME: Dispatches tasks in order, applies fail-fast, and builds execution reports

pub mod dispatcher;
pub mod error;
pub mod executor;
pub mod named;
pub mod result;

pub use dispatcher::{TaskDispatcher, UNSUPPORTED_KIND};
pub use error::{ExecutionError, Result};
pub use executor::WorkflowExecutor;
pub use result::{ExecutionReport, Status, TaskResult};
