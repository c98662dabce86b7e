// ABOUTME: Workflow validation and execution plan construction
// ABOUTME: Checks task ids, kinds, template syntax and result references before a run

use serde_json::Value as JsonValue;
use std::collections::{HashMap, HashSet};

use super::error::ValidationError;
use super::task::{TaskKind, TaskParams};
use super::workflow::WorkflowDefinition;
use crate::template::references::{extract_references, TemplateReference};

#[derive(Debug, Clone, Default)]
pub struct ValidationReport {
    pub errors: Vec<ValidationError>,
    pub is_valid: bool,
}

/// A task that passed validation, with its kind resolved.
#[derive(Debug, Clone, PartialEq)]
pub struct PlannedTask {
    pub task_id: String,
    pub kind: TaskKind,
    pub params: TaskParams,
}

/// The validated, ordered form of a definition that the executor walks.
#[derive(Debug, Clone, PartialEq)]
pub struct ExecutionPlan {
    pub workflow_id: String,
    pub namespace: String,
    pub steps: Vec<PlannedTask>,
}

pub struct WorkflowValidator {
    supported_kinds: HashSet<TaskKind>,
}

impl WorkflowValidator {
    /// A validator accepting every known task kind
    pub fn new() -> Self {
        Self {
            supported_kinds: TaskKind::ALL.into_iter().collect(),
        }
    }

    /// Restrict accepted kinds to those with a registered handler
    pub fn with_supported_kinds(mut self, kinds: impl IntoIterator<Item = TaskKind>) -> Self {
        self.supported_kinds = kinds.into_iter().collect();
        self
    }

    /// Validate a complete definition, collecting every problem found
    pub fn validate(&self, definition: &WorkflowDefinition) -> ValidationReport {
        let mut report = ValidationReport::default();

        if definition.tasks.is_empty() {
            report.errors.push(ValidationError::EmptyWorkflow);
        }

        self.validate_task_ids(definition, &mut report);
        self.validate_kinds(definition, &mut report);
        self.validate_templates(definition, &mut report);
        self.validate_references(definition, &mut report);

        report.is_valid = report.errors.is_empty();
        report
    }

    /// Validate and convert into an execution plan
    pub fn build_plan(
        &self,
        definition: &WorkflowDefinition,
    ) -> std::result::Result<ExecutionPlan, ValidationReport> {
        let report = self.validate(definition);
        if !report.is_valid {
            return Err(report);
        }

        let steps = definition
            .tasks
            .iter()
            .filter_map(|task| {
                task.task_kind().map(|kind| PlannedTask {
                    task_id: task.task_id.clone(),
                    kind,
                    params: task.params.clone(),
                })
            })
            .collect();

        Ok(ExecutionPlan {
            workflow_id: definition.id.clone(),
            namespace: definition.namespace.clone(),
            steps,
        })
    }

    fn validate_task_ids(&self, definition: &WorkflowDefinition, report: &mut ValidationReport) {
        let mut seen = HashSet::new();

        for (position, task) in definition.tasks.iter().enumerate() {
            if task.task_id.trim().is_empty() {
                report
                    .errors
                    .push(ValidationError::EmptyTaskId { position });
            } else if !seen.insert(task.task_id.as_str()) {
                report.errors.push(ValidationError::DuplicateTask {
                    task: task.task_id.clone(),
                });
            }
        }
    }

    fn validate_kinds(&self, definition: &WorkflowDefinition, report: &mut ValidationReport) {
        for task in &definition.tasks {
            let supported = task
                .task_kind()
                .is_some_and(|kind| self.supported_kinds.contains(&kind));

            if !supported {
                report.errors.push(ValidationError::UnsupportedTaskType {
                    task: task.task_id.clone(),
                    task_type: task.kind.clone(),
                    supported_types: self.supported_type_names(),
                });
            }
        }
    }

    fn validate_templates(&self, definition: &WorkflowDefinition, report: &mut ValidationReport) {
        for task in &definition.tasks {
            for (key, value) in &task.params {
                let field = format!("tasks.{}.params.{}", task.task_id, key);
                for_each_string(value, &mut |template| {
                    if let Err(e) = handlebars::Template::compile(template) {
                        report.errors.push(ValidationError::InvalidTemplate {
                            field: field.clone(),
                            error: e.to_string(),
                        });
                    }
                });
            }
        }
    }

    /// A `results.<taskId>` reference must name a task strictly earlier in the list
    fn validate_references(&self, definition: &WorkflowDefinition, report: &mut ValidationReport) {
        let mut first_position: HashMap<&str, usize> = HashMap::new();
        for (position, task) in definition.tasks.iter().enumerate() {
            first_position.entry(task.task_id.as_str()).or_insert(position);
        }

        for (position, task) in definition.tasks.iter().enumerate() {
            for reference in referenced_tasks(&task.params) {
                match first_position.get(reference.as_str()) {
                    None => report.errors.push(ValidationError::UnknownReference {
                        task: task.task_id.clone(),
                        reference,
                    }),
                    Some(&target) if target >= position => {
                        report.errors.push(ValidationError::ForwardReference {
                            task: task.task_id.clone(),
                            reference,
                        })
                    }
                    Some(_) => {}
                }
            }
        }
    }

    fn supported_type_names(&self) -> Vec<String> {
        TaskKind::ALL
            .iter()
            .filter(|kind| self.supported_kinds.contains(kind))
            .map(|kind| kind.as_str().to_string())
            .collect()
    }
}

impl Default for WorkflowValidator {
    fn default() -> Self {
        Self::new()
    }
}

impl ValidationReport {
    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }
}

/// Distinct task ids referenced through `results.*` anywhere in the params.
fn referenced_tasks(params: &TaskParams) -> Vec<String> {
    let mut found: Vec<String> = Vec::new();

    for value in params.values() {
        for_each_string(value, &mut |template| {
            for reference in extract_references(template) {
                if let TemplateReference::Result { task_id, .. } = reference {
                    if !found.contains(&task_id) {
                        found.push(task_id);
                    }
                }
            }
        });
    }

    found
}

fn for_each_string(value: &JsonValue, visit: &mut dyn FnMut(&str)) {
    match value {
        JsonValue::String(s) => visit(s),
        JsonValue::Array(items) => items.iter().for_each(|v| for_each_string(v, visit)),
        JsonValue::Object(map) => map.values().for_each(|v| for_each_string(v, visit)),
        _ => {}
    }
}
