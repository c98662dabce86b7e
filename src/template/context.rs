// ABOUTME: Immutable resolution snapshot used to render task parameters
// ABOUTME: Holds caller inputs, payloads of completed tasks, and run identity

use serde::Serialize;
use serde_json::{Map, Value as JsonValue};
use std::collections::HashMap;

use super::error::{Result, TemplateError};

/// Caller-supplied values that seed template resolution.
pub type Inputs = HashMap<String, JsonValue>;

#[derive(Debug, Clone, Serialize)]
pub struct TemplateContext {
    pub inputs: Map<String, JsonValue>,
    pub results: Map<String, JsonValue>,
    pub workflow: WorkflowInfo,
}

#[derive(Debug, Clone, Serialize, Default)]
pub struct WorkflowInfo {
    pub id: String,
    pub namespace: String,
    pub run_id: String,
}

impl TemplateContext {
    pub fn new(inputs: &Inputs) -> Self {
        Self {
            inputs: inputs
                .iter()
                .map(|(k, v)| (k.clone(), v.clone()))
                .collect(),
            results: Map::new(),
            workflow: WorkflowInfo::default(),
        }
    }

    pub fn for_workflow(inputs: &Inputs, workflow: WorkflowInfo) -> Self {
        let mut context = Self::new(inputs);
        context.workflow = workflow;
        context
    }

    /// Snapshot with one more completed task. The receiver is left untouched.
    pub fn with_result(&self, task_id: &str, payload: JsonValue) -> Self {
        let mut next = self.clone();
        next.results.insert(task_id.to_string(), payload);
        next
    }

    pub fn get_input(&self, key: &str) -> Option<&JsonValue> {
        self.inputs.get(key)
    }

    pub fn get_result(&self, task_id: &str) -> Option<&JsonValue> {
        self.results.get(task_id)
    }

    pub fn to_json(&self) -> Result<JsonValue> {
        serde_json::to_value(self).map_err(TemplateError::Snapshot)
    }
}
