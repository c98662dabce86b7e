// ABOUTME: Built-in named workflows composed in code
// ABOUTME: Provides the "trout" mail-to-issue pipeline and runs it through the executor

use tracing::instrument;

use super::error::{ExecutionError, Result};
use super::executor::WorkflowExecutor;
use super::result::ExecutionReport;
use crate::parser::{TaskKind, TaskSpec, WorkflowDefinition};
use crate::template::Inputs;

pub const TROUT: &str = "trout";

const NAMED_NAMESPACE: &str = "autodevops";

/// Names of the built-in workflows
pub fn names() -> Vec<&'static str> {
    vec![TROUT]
}

/// Build the definition behind a named workflow
pub fn build(name: &str) -> Option<WorkflowDefinition> {
    match name {
        TROUT => Some(trout()),
        _ => None,
    }
}

/// Read mail, summarize it with the model, open an issue, notify by mail.
///
/// `inputs.title` / `inputs.body` override what the model produced when set
/// and non-empty.
fn trout() -> WorkflowDefinition {
    WorkflowDefinition::new(TROUT, NAMED_NAMESPACE)
        .with_description("Turn incoming mail into a GitHub issue and send a notification")
        .with_task(
            TaskSpec::new("read_mail", TaskKind::MailList)
                .with_param("query", "{{inputs.query}}")
                .with_param("max_results", "{{inputs.max_results}}"),
        )
        .with_task(
            TaskSpec::new("process", TaskKind::TextProcess)
                .with_param("content", "{{results.read_mail.body}}")
                .with_param("prompt", "{{inputs.prompt}}"),
        )
        .with_task(
            TaskSpec::new("create_issue", TaskKind::IssueCreate)
                .with_param(
                    "title",
                    "{{#if inputs.title}}{{inputs.title}}{{else}}{{results.process.title}}{{/if}}",
                )
                .with_param(
                    "body",
                    "{{#if inputs.body}}{{inputs.body}}{{else}}{{results.process.body}}{{/if}}",
                )
                .with_param("repo", "{{inputs.repo}}")
                .with_param("labels", "{{inputs.labels}}"),
        )
        .with_task(
            TaskSpec::new("notify", TaskKind::MailSend)
                .with_param("to", "{{inputs.notify_to}}")
                .with_param("subject", "Issue created: {{results.create_issue.title}}")
                .with_param("body", "A new issue was opened from incoming mail.")
                .with_param("summary", "{{results.create_issue.url}}"),
        )
}

impl WorkflowExecutor {
    /// Run a built-in workflow by name
    #[instrument(skip(self, inputs), fields(name = %name))]
    pub async fn execute_named_workflow(
        &self,
        name: &str,
        inputs: &Inputs,
    ) -> Result<ExecutionReport> {
        let definition = build(name).ok_or_else(|| ExecutionError::WorkflowNotFound {
            workflow_id: name.to_string(),
        })?;
        self.execute_definition(&definition, inputs).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::WorkflowValidator;

    #[test]
    fn test_trout_shape() {
        let definition = build(TROUT).unwrap();

        assert_eq!(
            definition.task_ids(),
            vec!["read_mail", "process", "create_issue", "notify"]
        );
        let kinds: Vec<_> = definition
            .tasks
            .iter()
            .filter_map(|t| t.task_kind())
            .collect();
        assert_eq!(
            kinds,
            vec![
                TaskKind::MailList,
                TaskKind::TextProcess,
                TaskKind::IssueCreate,
                TaskKind::MailSend
            ]
        );
    }

    #[test]
    fn test_trout_is_valid() {
        let report = WorkflowValidator::new().validate(&build(TROUT).unwrap());
        assert!(report.is_valid, "{:?}", report.errors);
    }

    #[test]
    fn test_unknown_name() {
        assert!(build("salmon").is_none());
        assert_eq!(names(), vec!["trout"]);
    }
}
