// ABOUTME: In-memory definition store
// ABOUTME: Holds definitions registered at runtime, mainly for embedding and tests

use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::RwLock;

use super::{DefinitionStore, Result};
use crate::parser::WorkflowDefinition;

#[derive(Debug, Default)]
pub struct InMemoryStore {
    definitions: RwLock<HashMap<String, WorkflowDefinition>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_definition(self, definition: WorkflowDefinition) -> Self {
        let mut definitions = self.definitions.into_inner();
        definitions.insert(definition.id.clone(), definition);
        Self {
            definitions: RwLock::new(definitions),
        }
    }

    /// Insert or replace a definition
    pub async fn insert(&self, definition: WorkflowDefinition) {
        self.definitions
            .write()
            .await
            .insert(definition.id.clone(), definition);
    }

    pub async fn remove(&self, workflow_id: &str) -> Option<WorkflowDefinition> {
        self.definitions.write().await.remove(workflow_id)
    }
}

#[async_trait]
impl DefinitionStore for InMemoryStore {
    async fn load(&self, workflow_id: &str) -> Result<Option<WorkflowDefinition>> {
        Ok(self.definitions.read().await.get(workflow_id).cloned())
    }

    async fn list(&self) -> Result<Vec<String>> {
        let mut ids: Vec<String> = self.definitions.read().await.keys().cloned().collect();
        ids.sort();
        Ok(ids)
    }
}
