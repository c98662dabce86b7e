// ABOUTME: Execution audit logging for workflow runs
// ABOUTME: Writes task and summary records to a sink without ever failing a run

pub mod record;
pub mod sink;

use std::sync::Arc;
use thiserror::Error;
use tracing::warn;

pub use record::LogRecord;
pub use sink::{JsonLinesSink, LogSink, MemorySink, NullSink};

#[derive(Error, Debug)]
pub enum LogError {
    #[error("Log IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Log serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Log sink error: {0}")]
    Sink(String),
}

pub type Result<T> = std::result::Result<T, LogError>;

/// Best-effort front for a [`LogSink`].
///
/// Each append is awaited before the run continues, so one run's records land
/// in order. Sink failures are reported through `tracing` and dropped.
#[derive(Clone)]
pub struct ExecutionLogger {
    sink: Arc<dyn LogSink>,
}

impl ExecutionLogger {
    pub fn new(sink: Arc<dyn LogSink>) -> Self {
        Self { sink }
    }

    pub fn disabled() -> Self {
        Self::new(Arc::new(NullSink))
    }

    pub async fn record(&self, record: LogRecord) {
        if let Err(e) = self.sink.append(&record).await {
            warn!(
                "Dropping log record for workflow {} (run {}): {}",
                record.workflow_id, record.run_id, e
            );
        }
    }
}

impl std::fmt::Debug for ExecutionLogger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ExecutionLogger").finish()
    }
}
