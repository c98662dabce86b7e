// ABOUTME: Workflow definition store abstraction
// ABOUTME: Resolves workflow ids to definitions from memory or a directory of YAML files

pub mod directory;
pub mod memory;

use async_trait::async_trait;
use thiserror::Error;

use crate::parser::{ParserError, WorkflowDefinition};

pub use directory::DirectoryStore;
pub use memory::InMemoryStore;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Definition store unavailable: {0}")]
    Unavailable(#[from] std::io::Error),

    #[error("Definition '{workflow_id}' could not be parsed: {source}")]
    Malformed {
        workflow_id: String,
        #[source]
        source: ParserError,
    },
}

pub type Result<T> = std::result::Result<T, StoreError>;

/// Source of workflow definitions.
///
/// `load` returns `Ok(None)` for an unknown id; errors are reserved for a
/// store that cannot answer or a definition that cannot be read.
#[async_trait]
pub trait DefinitionStore: Send + Sync {
    /// Get a definition by workflow id
    async fn load(&self, workflow_id: &str) -> Result<Option<WorkflowDefinition>>;

    /// List known workflow ids, sorted
    async fn list(&self) -> Result<Vec<String>>;
}
