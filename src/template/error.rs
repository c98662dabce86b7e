// ABOUTME: Error types for parameter template resolution
// ABOUTME: Separates malformed templates from failures while rendering against a snapshot

use thiserror::Error;

#[derive(Error, Debug)]
pub enum TemplateError {
    #[error("Template syntax error: {0}")]
    Syntax(String),

    #[error("Template render error: {0}")]
    Render(#[from] handlebars::RenderError),

    #[error("Snapshot serialization error: {0}")]
    Snapshot(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, TemplateError>;
