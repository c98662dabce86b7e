// ABOUTME: Text processing task handler backed by a local language-model CLI
// ABOUTME: Runs the model once per task and splits its answer into title and body

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value as JsonValue};
use std::process::Stdio;
use tokio::process::Command;
use tracing::{debug, info};

use super::{param_str, require_str, HandlerError, Result, TaskHandler};
use crate::parser::{TaskKind, TaskParams};

const MAX_TITLE_CHARS: usize = 120;

fn default_command() -> String {
    "ollama".to_string()
}

fn default_model() -> String {
    "llama3".to_string()
}

fn default_prompt() -> String {
    "Summarize the following content as a GitHub issue. \
     Start with a one-line title, then the issue body."
        .to_string()
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmSettings {
    #[serde(default = "default_command")]
    pub command: String,
    #[serde(default = "default_model")]
    pub model: String,
    #[serde(default = "default_prompt")]
    pub default_prompt: String,
}

impl Default for LlmSettings {
    fn default() -> Self {
        Self {
            command: default_command(),
            model: default_model(),
            default_prompt: default_prompt(),
        }
    }
}

pub struct TextProcessor {
    settings: LlmSettings,
}

impl TextProcessor {
    pub fn new(settings: LlmSettings) -> Self {
        Self { settings }
    }
}

/// Split model output into an issue title and body.
///
/// The title is the first non-empty line without markdown heading marks or a
/// `Title:` label, capped at 120 characters. The body is the rest of the text,
/// or the whole output when nothing follows the title.
pub fn split_title_body(output: &str) -> (String, String) {
    let trimmed = output.trim();
    let mut lines = trimmed.lines();

    let title_line = lines.by_ref().find(|l| !l.trim().is_empty()).unwrap_or("");
    let mut title = title_line.trim().trim_start_matches('#').trim();
    if title.get(..6).is_some_and(|p| p.eq_ignore_ascii_case("title:")) {
        title = title[6..].trim();
    }
    let title: String = title
        .trim_matches('*')
        .trim_matches('"')
        .trim()
        .chars()
        .take(MAX_TITLE_CHARS)
        .collect();

    let rest = lines.collect::<Vec<_>>().join("\n");
    let body = if rest.trim().is_empty() {
        trimmed.to_string()
    } else {
        rest.trim().to_string()
    };

    (title, body)
}

#[async_trait]
impl TaskHandler for TextProcessor {
    fn kind(&self) -> TaskKind {
        TaskKind::TextProcess
    }

    async fn execute(&self, params: &TaskParams) -> Result<JsonValue> {
        let content = require_str(params, "content")?;
        let model = param_str(params, "model").unwrap_or_else(|| self.settings.model.clone());
        let instruction =
            param_str(params, "prompt").unwrap_or_else(|| self.settings.default_prompt.clone());
        let prompt = format!("{}\n\n{}", instruction, content);

        info!("Running {} with model {}", self.settings.command, model);

        let output = Command::new(&self.settings.command)
            .arg("run")
            .arg(&model)
            .arg(&prompt)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output()
            .await?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(HandlerError::Process(format!(
                "{} exited with {}: {}",
                self.settings.command,
                output.status.code().unwrap_or(-1),
                stderr.trim()
            )));
        }

        let text = String::from_utf8_lossy(&output.stdout).trim().to_string();
        debug!("Model produced {} chars", text.len());

        let (title, body) = split_title_body(&text);

        Ok(json!({
            "output": text,
            "title": title,
            "body": body,
            "model": model,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params(value: JsonValue) -> TaskParams {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn test_split_markdown_heading() {
        let (title, body) = split_title_body("\n# Fix flaky CI\n\nThe build fails on main.\nSee logs.");
        assert_eq!(title, "Fix flaky CI");
        assert_eq!(body, "The build fails on main.\nSee logs.");
    }

    #[test]
    fn test_split_title_label() {
        let (title, body) = split_title_body("Title: **Review PR #42**\nPlease take a look.");
        assert_eq!(title, "Review PR #42");
        assert_eq!(body, "Please take a look.");
    }

    #[test]
    fn test_single_line_output() {
        let (title, body) = split_title_body("Only one line");
        assert_eq!(title, "Only one line");
        assert_eq!(body, "Only one line");
    }

    #[test]
    fn test_title_is_capped() {
        let long = "x".repeat(300);
        let (title, _) = split_title_body(&long);
        assert_eq!(title.chars().count(), MAX_TITLE_CHARS);
    }

    #[tokio::test]
    async fn test_requires_content() {
        let processor = TextProcessor::new(LlmSettings::default());
        let result = processor.execute(&params(json!({ "content": null }))).await;
        assert!(matches!(result, Err(HandlerError::MissingParam(name)) if name == "content"));
    }

    #[tokio::test]
    async fn test_runs_configured_command() {
        // `echo run <model> <prompt>` stands in for the model CLI
        let processor = TextProcessor::new(LlmSettings {
            command: "echo".to_string(),
            model: "tiny".to_string(),
            default_prompt: "Summarize".to_string(),
        });

        let payload = processor
            .execute(&params(json!({ "content": "mail body" })))
            .await
            .unwrap();

        assert_eq!(payload["model"], "tiny");
        assert_eq!(payload["title"], "run tiny Summarize");
        assert_eq!(payload["body"], "mail body");
    }

    #[tokio::test]
    async fn test_missing_command_fails() {
        let processor = TextProcessor::new(LlmSettings {
            command: "definitely-not-a-real-llm-cli".to_string(),
            ..LlmSettings::default()
        });

        let result = processor.execute(&params(json!({ "content": "x" }))).await;
        assert!(matches!(result, Err(HandlerError::Io(_))));
    }
}
