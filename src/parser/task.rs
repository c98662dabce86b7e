// ABOUTME: Task descriptor structures and the closed set of task kinds
// ABOUTME: Normalizes inline and explicit task parameters into one ordered map

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

/// Ordered parameter map handed to handlers after template resolution.
pub type TaskParams = IndexMap<String, JsonValue>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskKind {
    MailList,
    MailSend,
    TextProcess,
    IssueCreate,
    PrList,
    HttpRequest,
}

/// Plugin identifiers accepted as aliases, matched against the end of the declared type.
const PLUGIN_SUFFIXES: &[(&str, TaskKind)] = &[
    ("googleworkspace.mail.List", TaskKind::MailList),
    ("googleworkspace.mail.Send", TaskKind::MailSend),
    ("ollama.cli.OllamaCLI", TaskKind::TextProcess),
    ("github.issues.Create", TaskKind::IssueCreate),
    ("github.pullrequests.List", TaskKind::PrList),
    ("http.Request", TaskKind::HttpRequest),
];

impl TaskKind {
    pub const ALL: [TaskKind; 6] = [
        TaskKind::MailList,
        TaskKind::MailSend,
        TaskKind::TextProcess,
        TaskKind::IssueCreate,
        TaskKind::PrList,
        TaskKind::HttpRequest,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            TaskKind::MailList => "mail_list",
            TaskKind::MailSend => "mail_send",
            TaskKind::TextProcess => "text_process",
            TaskKind::IssueCreate => "issue_create",
            TaskKind::PrList => "pr_list",
            TaskKind::HttpRequest => "http_request",
        }
    }

    /// Resolve a declared type string, either a short name or a plugin identifier.
    pub fn parse(declared: &str) -> Option<TaskKind> {
        let declared = declared.trim();

        if let Some(kind) = Self::ALL.iter().find(|k| k.as_str() == declared) {
            return Some(*kind);
        }

        PLUGIN_SUFFIXES
            .iter()
            .find(|(suffix, _)| declared.ends_with(suffix))
            .map(|(_, kind)| *kind)
    }
}

impl std::fmt::Display for TaskKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One step of a workflow as declared in its definition.
///
/// `kind` keeps the declared type string; it is resolved to a [`TaskKind`]
/// when the definition is validated, so an unknown type is reported as an
/// invalid definition rather than a parse failure.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "RawTaskSpec")]
pub struct TaskSpec {
    #[serde(rename = "id")]
    pub task_id: String,
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub params: TaskParams,
}

#[derive(Deserialize)]
struct RawTaskSpec {
    id: String,
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    params: TaskParams,
    #[serde(flatten)]
    inline: TaskParams,
}

impl From<RawTaskSpec> for TaskSpec {
    fn from(raw: RawTaskSpec) -> Self {
        let mut params = raw.inline;
        // explicit params win over inline properties
        params.extend(raw.params);

        Self {
            task_id: raw.id,
            kind: raw.kind,
            params,
        }
    }
}

impl TaskSpec {
    pub fn new(task_id: impl Into<String>, kind: TaskKind) -> Self {
        Self {
            task_id: task_id.into(),
            kind: kind.as_str().to_string(),
            params: TaskParams::new(),
        }
    }

    pub fn with_param(mut self, key: impl Into<String>, value: impl Into<JsonValue>) -> Self {
        self.params.insert(key.into(), value.into());
        self
    }

    pub fn task_kind(&self) -> Option<TaskKind> {
        TaskKind::parse(&self.kind)
    }
}
