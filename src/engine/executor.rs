// ABOUTME: Workflow executor running a definition's tasks strictly in order
// ABOUTME: Loads and validates definitions, resolves parameters, dispatches tasks and logs outcomes

use chrono::Utc;
use std::sync::Arc;
use tokio::time::Instant;
use tracing::{info, instrument, warn};

use super::dispatcher::TaskDispatcher;
use super::error::{ExecutionError, Result};
use super::result::{ExecutionReport, TaskResult};
use crate::logging::{ExecutionLogger, LogRecord};
use crate::parser::{ExecutionPlan, ValidationError, WorkflowDefinition, WorkflowValidator};
use crate::store::{DefinitionStore, StoreError};
use crate::tasks::HandlerTable;
use crate::template::{Inputs, TemplateContext, TemplateEngine, WorkflowInfo};

/// Runs workflows against a definition store and a handler table.
///
/// The executor holds no per-run state, so one instance can serve
/// concurrent runs; each run owns its snapshot, results and report.
pub struct WorkflowExecutor {
    store: Arc<dyn DefinitionStore>,
    dispatcher: TaskDispatcher,
    logger: ExecutionLogger,
    template_engine: TemplateEngine,
}

impl WorkflowExecutor {
    pub fn new(store: Arc<dyn DefinitionStore>, handlers: HandlerTable) -> Self {
        Self {
            store,
            dispatcher: TaskDispatcher::new(handlers),
            logger: ExecutionLogger::disabled(),
            template_engine: TemplateEngine::new(),
        }
    }

    pub fn with_logger(mut self, logger: ExecutionLogger) -> Self {
        self.logger = logger;
        self
    }

    pub fn store(&self) -> &Arc<dyn DefinitionStore> {
        &self.store
    }

    pub fn handlers(&self) -> &HandlerTable {
        self.dispatcher.handlers()
    }

    /// Resolve a workflow id through the store
    pub async fn load_definition(&self, workflow_id: &str) -> Result<WorkflowDefinition> {
        match self.store.load(workflow_id).await {
            Ok(Some(definition)) => Ok(definition),
            Ok(None) => Err(ExecutionError::WorkflowNotFound {
                workflow_id: workflow_id.to_string(),
            }),
            Err(StoreError::Malformed { source, .. }) => Err(ExecutionError::DefinitionInvalid {
                workflow_id: workflow_id.to_string(),
                errors: vec![ValidationError::Malformed {
                    reason: source.to_string(),
                }],
            }),
            Err(e @ StoreError::Unavailable(_)) => {
                Err(ExecutionError::StoreUnavailable(e.to_string()))
            }
        }
    }

    /// Check a definition against the registered handlers and build its plan
    pub fn validate(&self, definition: &WorkflowDefinition) -> Result<ExecutionPlan> {
        WorkflowValidator::new()
            .with_supported_kinds(self.handlers().kinds())
            .build_plan(definition)
            .map_err(|report| ExecutionError::DefinitionInvalid {
                workflow_id: definition.id.clone(),
                errors: report.errors,
            })
    }

    /// Load a workflow from the store and run it
    #[instrument(skip(self, inputs), fields(workflow_id = %workflow_id))]
    pub async fn execute_workflow(
        &self,
        workflow_id: &str,
        inputs: &Inputs,
    ) -> Result<ExecutionReport> {
        let definition = self.load_definition(workflow_id).await?;
        self.execute_definition(&definition, inputs).await
    }

    /// Run a definition that need not be held by the store
    #[instrument(skip(self, definition, inputs), fields(workflow_id = %definition.id))]
    pub async fn execute_definition(
        &self,
        definition: &WorkflowDefinition,
        inputs: &Inputs,
    ) -> Result<ExecutionReport> {
        let plan = self.validate(definition)?;
        Ok(self.run_plan(&plan, inputs).await)
    }

    /// Walk the plan in order, stopping at the first failed task.
    async fn run_plan(&self, plan: &ExecutionPlan, inputs: &Inputs) -> ExecutionReport {
        let start_time = Instant::now();
        let run_id = uuid::Uuid::new_v4().to_string();

        info!(
            "Starting workflow execution: {} (run_id: {}, {} tasks)",
            plan.workflow_id,
            run_id,
            plan.steps.len()
        );

        let mut report = ExecutionReport::new(&plan.workflow_id, &run_id);
        let mut snapshot = TemplateContext::for_workflow(
            inputs,
            WorkflowInfo {
                id: plan.workflow_id.clone(),
                namespace: plan.namespace.clone(),
                run_id: run_id.clone(),
            },
        );

        for (position, step) in plan.steps.iter().enumerate() {
            info!(
                "Executing task {}/{}: {} ({})",
                position + 1,
                plan.steps.len(),
                step.task_id,
                step.kind
            );

            let result = match self.template_engine.resolve_params(&step.params, &snapshot) {
                Ok(params) => {
                    self.dispatcher
                        .dispatch(&step.task_id, step.kind, &params)
                        .await
                }
                Err(e) => TaskResult::failure(
                    &step.task_id,
                    step.kind,
                    format!("parameter resolution failed: {}", e),
                    Utc::now(),
                ),
            };

            self.logger
                .record(LogRecord::task(&plan.workflow_id, &run_id, &result))
                .await;

            if let Some(payload) = &result.payload {
                snapshot = snapshot.with_result(&result.task_id, payload.clone());
            }

            let failed = !result.is_successful();
            report.push(result);

            if failed {
                warn!(
                    "Stopping workflow {} after failed task {}",
                    plan.workflow_id, step.task_id
                );
                break;
            }
        }

        report.mark_completed();
        self.logger.record(LogRecord::summary(&report)).await;

        info!(
            "Workflow execution completed in {:?} with status: {}",
            start_time.elapsed(),
            report.status
        );

        report
    }
}

impl std::fmt::Debug for WorkflowExecutor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WorkflowExecutor")
            .field("handlers", self.handlers())
            .finish()
    }
}
