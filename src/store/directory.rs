// ABOUTME: Definition store backed by a directory of YAML files
// ABOUTME: Maps workflow id `x` to `<dir>/x.yaml` or `<dir>/x.yml`

use async_trait::async_trait;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

use super::{DefinitionStore, Result, StoreError};
use crate::parser::WorkflowDefinition;

const EXTENSIONS: [&str; 2] = ["yaml", "yml"];

#[derive(Debug, Clone)]
pub struct DirectoryStore {
    root: PathBuf,
}

impl DirectoryStore {
    pub fn new<P: AsRef<Path>>(root: P) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn is_plain_id(workflow_id: &str) -> bool {
        !workflow_id.is_empty()
            && workflow_id != "."
            && workflow_id != ".."
            && !workflow_id.contains(['/', '\\'])
    }

    async fn read_candidate(&self, workflow_id: &str) -> Result<Option<(PathBuf, String)>> {
        for extension in EXTENSIONS {
            let path = self.root.join(format!("{}.{}", workflow_id, extension));
            match tokio::fs::read_to_string(&path).await {
                Ok(content) => return Ok(Some((path, content))),
                Err(e) if e.kind() == ErrorKind::NotFound => continue,
                Err(e) => return Err(StoreError::Unavailable(e)),
            }
        }
        Ok(None)
    }
}

#[async_trait]
impl DefinitionStore for DirectoryStore {
    async fn load(&self, workflow_id: &str) -> Result<Option<WorkflowDefinition>> {
        // Surface a missing or unreadable directory instead of reporting "not found"
        tokio::fs::metadata(&self.root).await?;

        if !Self::is_plain_id(workflow_id) {
            return Ok(None);
        }

        let Some((path, content)) = self.read_candidate(workflow_id).await? else {
            debug!("No definition file for '{}' in {}", workflow_id, self.root.display());
            return Ok(None);
        };

        let mut definition =
            WorkflowDefinition::from_yaml(&content).map_err(|source| StoreError::Malformed {
                workflow_id: workflow_id.to_string(),
                source,
            })?;

        if definition.id != workflow_id {
            warn!(
                "Definition {} declares id '{}', using file name '{}'",
                path.display(),
                definition.id,
                workflow_id
            );
            definition.id = workflow_id.to_string();
        }

        Ok(Some(definition))
    }

    async fn list(&self) -> Result<Vec<String>> {
        let mut entries = tokio::fs::read_dir(&self.root).await?;
        let mut ids = Vec::new();

        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            let is_definition = path
                .extension()
                .and_then(|e| e.to_str())
                .is_some_and(|e| EXTENSIONS.contains(&e));

            if !is_definition {
                continue;
            }
            if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
                ids.push(stem.to_string());
            }
        }

        ids.sort();
        ids.dedup();
        Ok(ids)
    }
}
