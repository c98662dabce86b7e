// ABOUTME: Integration tests for running workflows loaded from a definitions directory
// ABOUTME: Covers YAML loading, plugin type aliases, malformed files and store failures

use serde_json::json;
use std::sync::Arc;
use tempfile::TempDir;

use autodevops::engine::{ExecutionError, Status, WorkflowExecutor};
use autodevops::logging::{ExecutionLogger, JsonLinesSink};
use autodevops::parser::{TaskKind, ValidationError};
use autodevops::store::DirectoryStore;
use autodevops::tasks::HandlerTable;

mod common;
use common::{inputs, no_inputs, processor_output, StubHandler};

const DIGEST: &str = r#"
id: digest
namespace: ops.mail
description: Summarize recent mail and open an issue
tasks:
  - id: fetch
    type: io.kestra.plugin.googleworkspace.mail.List
    query: "label:{{inputs.label}}"
    maxResults: 5
  - id: summarize
    type: text_process
    content: "{{results.fetch.body}}"
  - id: file_issue
    type: io.kestra.plugin.github.issues.Create
    params:
      title: "{{results.summarize.title}}"
      labels: ["{{inputs.label}}", "auto-generated"]
"#;

fn write_definitions(files: &[(&str, &str)]) -> TempDir {
    let dir = TempDir::new().unwrap();
    for (name, content) in files {
        std::fs::write(dir.path().join(name), content).unwrap();
    }
    dir
}

fn executor_for(dir: &TempDir, handlers: Vec<Arc<StubHandler>>) -> WorkflowExecutor {
    let mut table = HandlerTable::new();
    for handler in handlers {
        table.register(handler);
    }
    WorkflowExecutor::new(Arc::new(DirectoryStore::new(dir.path())), table)
}

#[tokio::test]
async fn test_run_definition_from_directory() {
    let dir = write_definitions(&[("digest.yaml", DIGEST)]);
    let mail = StubHandler::succeeding(
        TaskKind::MailList,
        json!({ "count": 1, "body": "Disk usage at 95%" }),
    );
    let text = StubHandler::succeeding(TaskKind::TextProcess, processor_output());
    let issues = StubHandler::echo(TaskKind::IssueCreate);
    let executor = executor_for(&dir, vec![mail.clone(), text.clone(), issues.clone()]);

    let report = executor
        .execute_workflow("digest", &inputs(&[("label", json!("alerts"))]))
        .await
        .unwrap();

    assert_eq!(report.status, Status::Success);
    assert_eq!(report.results.len(), 3);

    let fetch = mail.last_params();
    assert_eq!(fetch["query"], "label:alerts");
    assert_eq!(fetch["maxResults"], 5);
    assert_eq!(text.last_params()["content"], "Disk usage at 95%");

    let issue = issues.last_params();
    assert_eq!(issue["title"], "Processor Title");
    assert_eq!(issue["labels"], json!(["alerts", "auto-generated"]));
}

#[tokio::test]
async fn test_audit_log_written_as_json_lines() {
    let dir = write_definitions(&[("digest.yml", DIGEST)]);
    let log_path = dir.path().join("logs").join("runs.jsonl");
    let sink = Arc::new(JsonLinesSink::new(&log_path));
    let executor = executor_for(
        &dir,
        vec![
            StubHandler::succeeding(TaskKind::MailList, json!({ "body": "hello" })),
            StubHandler::failing(TaskKind::TextProcess, "ollama: command not found"),
            StubHandler::echo(TaskKind::IssueCreate),
        ],
    )
    .with_logger(ExecutionLogger::new(sink.clone()));

    let report = executor
        .execute_workflow("digest", &no_inputs())
        .await
        .unwrap();

    assert_eq!(report.status, Status::Failed);

    let records = sink.read_all().await.unwrap();
    assert_eq!(records.len(), 3);
    assert!(records.iter().all(|r| r.run_id == report.run_id));
    assert_eq!(records[1].task_id.as_deref(), Some("summarize"));
    assert_eq!(records[1].detail, "Process error: ollama: command not found");
    assert!(records[2].is_summary());
}

#[tokio::test]
async fn test_malformed_file_is_invalid_definition() {
    let dir = write_definitions(&[("broken.yaml", "id: broken\ntasks:\n  - id: [\n")]);
    let executor = executor_for(&dir, vec![StubHandler::echo(TaskKind::HttpRequest)]);

    match executor.execute_workflow("broken", &no_inputs()).await {
        Err(ExecutionError::DefinitionInvalid {
            workflow_id,
            errors,
        }) => {
            assert_eq!(workflow_id, "broken");
            assert!(matches!(errors[0], ValidationError::Malformed { .. }));
        }
        other => panic!("expected DefinitionInvalid, got {:?}", other),
    }
}

#[tokio::test]
async fn test_unknown_task_type_from_file() {
    let dir = write_definitions(&[(
        "shell.yaml",
        "id: shell\ntasks:\n  - id: run\n    type: io.kestra.plugin.scripts.shell.Commands\n",
    )]);
    let executor = executor_for(&dir, vec![StubHandler::echo(TaskKind::HttpRequest)]);

    let error = executor
        .execute_workflow("shell", &no_inputs())
        .await
        .unwrap_err();

    assert!(error
        .to_string()
        .contains("io.kestra.plugin.scripts.shell.Commands"));
}

#[tokio::test]
async fn test_missing_file_and_missing_directory() {
    let dir = write_definitions(&[("digest.yaml", DIGEST)]);
    let executor = executor_for(&dir, Vec::new());

    assert!(matches!(
        executor.execute_workflow("nightly", &no_inputs()).await,
        Err(ExecutionError::WorkflowNotFound { .. })
    ));

    let gone = WorkflowExecutor::new(
        Arc::new(DirectoryStore::new(dir.path().join("does-not-exist"))),
        HandlerTable::new(),
    );
    assert!(matches!(
        gone.execute_workflow("digest", &no_inputs()).await,
        Err(ExecutionError::StoreUnavailable(_))
    ));
}
