// ABOUTME: Task dispatcher mapping task kinds to handlers
// ABOUTME: Normalizes handler output, handler errors and handler panics into task results

use chrono::Utc;
use futures::FutureExt;
use std::any::Any;
use std::panic::AssertUnwindSafe;
use tracing::{debug, error, instrument, warn};

use super::result::TaskResult;
use crate::parser::{TaskKind, TaskParams};
use crate::tasks::HandlerTable;

pub const UNSUPPORTED_KIND: &str = "unsupported task kind";

#[derive(Debug, Clone)]
pub struct TaskDispatcher {
    handlers: HandlerTable,
}

impl TaskDispatcher {
    pub fn new(handlers: HandlerTable) -> Self {
        Self { handlers }
    }

    pub fn handlers(&self) -> &HandlerTable {
        &self.handlers
    }

    /// Run one task through its handler. Never fails: every outcome,
    /// including a panic inside the handler, becomes a [`TaskResult`].
    #[instrument(skip(self, params), fields(task_id = %task_id, kind = %kind))]
    pub async fn dispatch(&self, task_id: &str, kind: TaskKind, params: &TaskParams) -> TaskResult {
        let started_at = Utc::now();

        let Some(handler) = self.handlers.get(kind) else {
            warn!("No handler registered for {}", kind);
            return TaskResult::failure(task_id, kind, UNSUPPORTED_KIND, started_at);
        };

        match AssertUnwindSafe(handler.execute(params)).catch_unwind().await {
            Ok(Ok(payload)) => {
                debug!("Task {} succeeded", task_id);
                TaskResult::success(task_id, kind, payload, started_at)
            }
            Ok(Err(e)) => {
                warn!("Task {} failed: {}", task_id, e);
                TaskResult::failure(task_id, kind, e.to_string(), started_at)
            }
            Err(panic) => {
                let message = panic_message(panic.as_ref());
                error!("Handler for task {} panicked: {}", task_id, message);
                TaskResult::failure(
                    task_id,
                    kind,
                    format!("handler fault: {}", message),
                    started_at,
                )
            }
        }
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(message) = panic.downcast_ref::<&str>() {
        message.to_string()
    } else if let Some(message) = panic.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::Status;
    use crate::tasks::{HandlerError, TaskHandler};
    use async_trait::async_trait;
    use serde_json::{json, Value as JsonValue};
    use std::sync::Arc;

    struct Echo;

    #[async_trait]
    impl TaskHandler for Echo {
        fn kind(&self) -> TaskKind {
            TaskKind::HttpRequest
        }

        async fn execute(&self, params: &TaskParams) -> crate::tasks::Result<JsonValue> {
            Ok(serde_json::to_value(params)?)
        }
    }

    struct Refuses;

    #[async_trait]
    impl TaskHandler for Refuses {
        fn kind(&self) -> TaskKind {
            TaskKind::MailSend
        }

        async fn execute(&self, _params: &TaskParams) -> crate::tasks::Result<JsonValue> {
            Err(HandlerError::NotConfigured("Mail access token not configured".to_string()))
        }
    }

    struct Explodes;

    #[async_trait]
    impl TaskHandler for Explodes {
        fn kind(&self) -> TaskKind {
            TaskKind::PrList
        }

        async fn execute(&self, _params: &TaskParams) -> crate::tasks::Result<JsonValue> {
            panic!("index out of range");
        }
    }

    fn dispatcher() -> TaskDispatcher {
        TaskDispatcher::new(
            HandlerTable::new()
                .with_handler(Arc::new(Echo))
                .with_handler(Arc::new(Refuses))
                .with_handler(Arc::new(Explodes)),
        )
    }

    #[tokio::test]
    async fn test_success_carries_payload() {
        let mut params = TaskParams::new();
        params.insert("url".to_string(), json!("https://example"));

        let result = dispatcher().dispatch("t1", TaskKind::HttpRequest, &params).await;

        assert_eq!(result.status, Status::Success);
        assert_eq!(result.payload, Some(json!({ "url": "https://example" })));
        assert!(result.finished_at >= result.started_at);
    }

    #[tokio::test]
    async fn test_handler_error_becomes_failure() {
        let result = dispatcher()
            .dispatch("t1", TaskKind::MailSend, &TaskParams::new())
            .await;

        assert_eq!(result.status, Status::Failed);
        assert_eq!(
            result.error_detail.as_deref(),
            Some("Mail access token not configured")
        );
        assert!(result.payload.is_none());
    }

    #[tokio::test]
    async fn test_panic_becomes_handler_fault() {
        let result = dispatcher()
            .dispatch("t1", TaskKind::PrList, &TaskParams::new())
            .await;

        assert_eq!(result.status, Status::Failed);
        assert_eq!(
            result.error_detail.as_deref(),
            Some("handler fault: index out of range")
        );
    }

    #[tokio::test]
    async fn test_missing_handler() {
        let result = dispatcher()
            .dispatch("t1", TaskKind::IssueCreate, &TaskParams::new())
            .await;

        assert_eq!(result.error_detail.as_deref(), Some(UNSUPPORTED_KIND));
    }
}
