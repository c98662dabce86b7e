// ABOUTME: Task handler trait, handler table and shared parameter helpers
// ABOUTME: Contains adapters for mail, language-model CLI, GitHub and generic HTTP tasks

pub mod github;
pub mod http;
pub mod mail;
pub mod text;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

use crate::parser::{TaskKind, TaskParams};

pub use github::{GithubSettings, IssueCreator, PullRequestLister};
pub use http::{HttpCaller, HttpSettings};
pub use mail::{MailReader, MailSender, MailSettings};
pub use text::{LlmSettings, TextProcessor};

#[derive(Error, Debug)]
pub enum HandlerError {
    #[error("Missing required parameter: {0}")]
    MissingParam(String),

    #[error("Invalid parameter '{name}': {reason}")]
    InvalidParam { name: String, reason: String },

    #[error("{0}")]
    NotConfigured(String),

    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("{service} API error: HTTP {status} - {message}")]
    Api {
        service: String,
        status: u16,
        message: String,
    },

    #[error("Process error: {0}")]
    Process(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, HandlerError>;

/// Adapter for one task kind: build a request from resolved params, call the
/// external service once, and map the response to a JSON payload.
#[async_trait]
pub trait TaskHandler: Send + Sync {
    fn kind(&self) -> TaskKind;

    async fn execute(&self, params: &TaskParams) -> Result<JsonValue>;
}

/// Settings for every built-in handler, one section per external service.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct HandlerSettings {
    #[serde(default)]
    pub github: GithubSettings,
    #[serde(default)]
    pub mail: MailSettings,
    #[serde(default)]
    pub llm: LlmSettings,
    #[serde(default)]
    pub http: HttpSettings,
}

/// Fixed mapping from task kind to handler.
#[derive(Clone, Default)]
pub struct HandlerTable {
    handlers: HashMap<TaskKind, Arc<dyn TaskHandler>>,
}

impl HandlerTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Table with the built-in adapter for every task kind
    pub fn with_defaults(settings: &HandlerSettings) -> Result<Self> {
        let client = build_client(&settings.http)?;

        let mut table = Self::new();
        table.register(Arc::new(MailReader::new(client.clone(), settings.mail.clone())));
        table.register(Arc::new(MailSender::new(client.clone(), settings.mail.clone())));
        table.register(Arc::new(TextProcessor::new(settings.llm.clone())));
        table.register(Arc::new(IssueCreator::new(client.clone(), settings.github.clone())));
        table.register(Arc::new(PullRequestLister::new(
            client.clone(),
            settings.github.clone(),
        )));
        table.register(Arc::new(HttpCaller::new(client)));

        Ok(table)
    }

    /// Register a handler under its own kind, replacing any previous one
    pub fn register(&mut self, handler: Arc<dyn TaskHandler>) {
        self.handlers.insert(handler.kind(), handler);
    }

    pub fn with_handler(mut self, handler: Arc<dyn TaskHandler>) -> Self {
        self.register(handler);
        self
    }

    pub fn get(&self, kind: TaskKind) -> Option<Arc<dyn TaskHandler>> {
        self.handlers.get(&kind).cloned()
    }

    /// Registered kinds in declaration order
    pub fn kinds(&self) -> Vec<TaskKind> {
        TaskKind::ALL
            .into_iter()
            .filter(|kind| self.handlers.contains_key(kind))
            .collect()
    }
}

impl std::fmt::Debug for HandlerTable {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HandlerTable")
            .field("kinds", &self.kinds())
            .finish()
    }
}

fn build_client(settings: &HttpSettings) -> Result<reqwest::Client> {
    let mut builder = reqwest::Client::builder().user_agent(settings.user_agent.clone());
    if let Some(seconds) = settings.timeout_seconds {
        builder = builder.timeout(Duration::from_secs(seconds));
    }
    Ok(builder.build()?)
}

/// Non-empty string parameter; numbers and booleans are rendered as text.
pub(crate) fn param_str(params: &TaskParams, name: &str) -> Option<String> {
    match params.get(name)? {
        JsonValue::String(s) if !s.trim().is_empty() => Some(s.clone()),
        JsonValue::Number(n) => Some(n.to_string()),
        JsonValue::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

pub(crate) fn require_str(params: &TaskParams, name: &str) -> Result<String> {
    param_str(params, name).ok_or_else(|| HandlerError::MissingParam(name.to_string()))
}

/// Unsigned integer parameter, also accepted as a numeric string.
pub(crate) fn param_u64(params: &TaskParams, name: &str) -> Result<Option<u64>> {
    match params.get(name) {
        None | Some(JsonValue::Null) => Ok(None),
        Some(JsonValue::Number(n)) => n.as_u64().map(Some).ok_or_else(|| invalid(name, n)),
        Some(JsonValue::String(s)) if s.trim().is_empty() => Ok(None),
        Some(JsonValue::String(s)) => s.trim().parse().map(Some).map_err(|_| invalid(name, s)),
        Some(other) => Err(invalid(name, other)),
    }
}

/// List parameter given as an array or as a comma-separated string.
pub(crate) fn param_list(params: &TaskParams, name: &str) -> Option<Vec<String>> {
    let items: Vec<String> = match params.get(name)? {
        JsonValue::Array(values) => values
            .iter()
            .filter_map(|v| match v {
                JsonValue::String(s) => Some(s.trim().to_string()),
                JsonValue::Null => None,
                other => Some(other.to_string()),
            })
            .collect(),
        JsonValue::String(s) => s.split(',').map(|part| part.trim().to_string()).collect(),
        _ => return None,
    };

    let items: Vec<String> = items.into_iter().filter(|s| !s.is_empty()).collect();
    (!items.is_empty()).then_some(items)
}

fn invalid(name: &str, value: impl std::fmt::Display) -> HandlerError {
    HandlerError::InvalidParam {
        name: name.to_string(),
        reason: format!("expected a non-negative integer, got {}", value),
    }
}
