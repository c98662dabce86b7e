// ABOUTME: Task result and execution report types
// ABOUTME: Defines per-task outcomes and the aggregated outcome of one workflow run

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

use crate::parser::TaskKind;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Status {
    Success,
    Failed,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TaskResult {
    pub task_id: String,
    pub kind: TaskKind,
    pub status: Status,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payload: Option<JsonValue>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_detail: Option<String>,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ExecutionReport {
    pub workflow_id: String,
    pub run_id: String,
    pub status: Status,
    pub results: Vec<TaskResult>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_detail: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub failed_task: Option<String>,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
}

impl TaskResult {
    pub fn success(
        task_id: impl Into<String>,
        kind: TaskKind,
        payload: JsonValue,
        started_at: DateTime<Utc>,
    ) -> Self {
        Self {
            task_id: task_id.into(),
            kind,
            status: Status::Success,
            payload: Some(payload),
            error_detail: None,
            started_at,
            finished_at: Utc::now(),
        }
    }

    pub fn failure(
        task_id: impl Into<String>,
        kind: TaskKind,
        detail: impl Into<String>,
        started_at: DateTime<Utc>,
    ) -> Self {
        Self {
            task_id: task_id.into(),
            kind,
            status: Status::Failed,
            payload: None,
            error_detail: Some(detail.into()),
            started_at,
            finished_at: Utc::now(),
        }
    }

    pub fn is_successful(&self) -> bool {
        self.status == Status::Success
    }
}

impl ExecutionReport {
    /// Start a report for a run; it stays successful until a task fails
    pub fn new(workflow_id: impl Into<String>, run_id: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            workflow_id: workflow_id.into(),
            run_id: run_id.into(),
            status: Status::Success,
            results: Vec::new(),
            error_detail: None,
            failed_task: None,
            started_at: now,
            finished_at: now,
        }
    }

    /// Append a result; the first failed result fixes the report's failure fields
    pub fn push(&mut self, result: TaskResult) {
        if !result.is_successful() && self.status == Status::Success {
            self.status = Status::Failed;
            self.error_detail = result.error_detail.clone();
            self.failed_task = Some(result.task_id.clone());
        }
        self.results.push(result);
    }

    pub fn mark_completed(&mut self) {
        self.finished_at = Utc::now();
    }

    pub fn is_successful(&self) -> bool {
        self.status == Status::Success
    }

    pub fn get_result(&self, task_id: &str) -> Option<&TaskResult> {
        self.results.iter().find(|r| r.task_id == task_id)
    }

    /// One-line outcome used for the summary log record
    pub fn summary(&self) -> String {
        match (&self.failed_task, &self.error_detail) {
            (Some(task), Some(detail)) => format!(
                "failed at task '{}' after {} task(s): {}",
                task,
                self.results.len(),
                detail
            ),
            _ => format!("completed {} task(s)", self.results.len()),
        }
    }
}

impl std::fmt::Display for Status {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Status::Success => write!(f, "success"),
            Status::Failed => write!(f, "failed"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_report_tracks_first_failure() {
        let mut report = ExecutionReport::new("w1", "run-1");
        let now = Utc::now();

        report.push(TaskResult::success("t1", TaskKind::HttpRequest, json!({}), now));
        assert!(report.is_successful());

        report.push(TaskResult::failure("t2", TaskKind::MailSend, "boom", now));
        report.mark_completed();

        assert_eq!(report.status, Status::Failed);
        assert_eq!(report.failed_task.as_deref(), Some("t2"));
        assert_eq!(report.error_detail.as_deref(), Some("boom"));
        assert_eq!(report.summary(), "failed at task 't2' after 2 task(s): boom");
    }

    #[test]
    fn test_report_serialization() {
        let mut report = ExecutionReport::new("w1", "run-1");
        report.push(TaskResult::success(
            "t1",
            TaskKind::HttpRequest,
            json!({ "status_code": 200 }),
            Utc::now(),
        ));

        let value = serde_json::to_value(&report).unwrap();
        assert_eq!(value["status"], "success");
        assert_eq!(value["results"][0]["kind"], "http_request");
        assert_eq!(value["results"][0]["payload"]["status_code"], 200);
        assert!(value.get("error_detail").is_none());
    }
}
