// ABOUTME: Audit log record written for every task attempt and every run
// ABOUTME: Task records carry the task id; the run summary record does not

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::engine::{ExecutionReport, Status, TaskResult};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LogRecord {
    pub timestamp: DateTime<Utc>,
    pub workflow_id: String,
    pub run_id: String,
    pub task_id: Option<String>,
    pub status: Status,
    pub detail: String,
}

impl LogRecord {
    /// Record for one task attempt
    pub fn task(workflow_id: &str, run_id: &str, result: &TaskResult) -> Self {
        let detail = match &result.error_detail {
            Some(error) => error.clone(),
            None => format!("{} completed", result.kind),
        };

        Self {
            timestamp: result.finished_at,
            workflow_id: workflow_id.to_string(),
            run_id: run_id.to_string(),
            task_id: Some(result.task_id.clone()),
            status: result.status,
            detail,
        }
    }

    /// Terminal record for a run; its status mirrors the report
    pub fn summary(report: &ExecutionReport) -> Self {
        Self {
            timestamp: report.finished_at,
            workflow_id: report.workflow_id.clone(),
            run_id: report.run_id.clone(),
            task_id: None,
            status: report.status,
            detail: report.summary(),
        }
    }

    pub fn is_summary(&self) -> bool {
        self.task_id.is_none()
    }
}
