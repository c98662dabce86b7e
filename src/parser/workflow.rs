// ABOUTME: Workflow definition data structure and YAML parsing
// ABOUTME: Defines the ordered task list loaded from definition files

use serde::{Deserialize, Serialize};
use std::path::Path;

use super::error::{ParserError, Result};
use super::task::TaskSpec;

fn default_namespace() -> String {
    "default".to_string()
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkflowDefinition {
    pub id: String,
    #[serde(default = "default_namespace")]
    pub namespace: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default)]
    pub tasks: Vec<TaskSpec>,
}

impl WorkflowDefinition {
    pub fn new(id: impl Into<String>, namespace: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            namespace: namespace.into(),
            description: None,
            tasks: Vec::new(),
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_task(mut self, task: TaskSpec) -> Self {
        self.tasks.push(task);
        self
    }

    /// Parse a definition from a YAML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref()).map_err(ParserError::IoError)?;
        Self::from_yaml(&content)
    }

    /// Parse a definition from a YAML string.
    ///
    /// Only the document shape is checked here; structural rules (unique task
    /// ids, known kinds, template references) belong to the validator.
    pub fn from_yaml(content: &str) -> Result<Self> {
        let definition: WorkflowDefinition =
            serde_yaml::from_str(content).map_err(ParserError::YamlError)?;

        if definition.id.trim().is_empty() {
            return Err(ParserError::MissingField("id".to_string()));
        }

        Ok(definition)
    }

    pub fn to_yaml(&self) -> Result<String> {
        serde_yaml::to_string(self).map_err(ParserError::YamlError)
    }

    pub fn task_ids(&self) -> Vec<String> {
        self.tasks.iter().map(|t| t.task_id.clone()).collect()
    }

    pub fn get_task(&self, task_id: &str) -> Option<&TaskSpec> {
        self.tasks.iter().find(|t| t.task_id == task_id)
    }

    pub fn position(&self, task_id: &str) -> Option<usize> {
        self.tasks.iter().position(|t| t.task_id == task_id)
    }
}
