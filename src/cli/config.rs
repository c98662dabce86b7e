// ABOUTME: Configuration management for the autodevops application
// ABOUTME: Loads YAML configuration and applies environment variable overrides

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::tasks::HandlerSettings;

fn default_workflows_dir() -> PathBuf {
    PathBuf::from("workflows")
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Directory holding `<workflow_id>.yaml` definitions
    #[serde(default = "default_workflows_dir")]
    pub workflows_dir: PathBuf,

    /// JSON-lines execution log; unset disables the audit log
    #[serde(default)]
    pub log_file: Option<PathBuf>,

    /// `github`, `mail`, `llm` and `http` sections
    #[serde(flatten)]
    pub handlers: HandlerSettings,

    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    pub level: String,
    pub format: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            workflows_dir: default_workflows_dir(),
            log_file: None,
            handlers: HandlerSettings::default(),
            logging: LoggingConfig::default(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "pretty".to_string(),
        }
    }
}

impl Config {
    /// Load configuration from file path or default locations
    pub fn load(path: Option<PathBuf>) -> Result<Self> {
        let config_path = match path {
            Some(p) => p,
            None => Self::find_config_file(),
        };

        let mut config = if config_path.exists() {
            let contents = std::fs::read_to_string(&config_path)?;
            Self::from_yaml(&contents)?
        } else {
            Config::default()
        };

        config.merge_env();
        Ok(config)
    }

    pub fn from_yaml(contents: &str) -> Result<Self> {
        if contents.trim().is_empty() {
            return Ok(Config::default());
        }
        Ok(serde_yaml::from_str(contents)?)
    }

    /// Find configuration file in standard locations
    fn find_config_file() -> PathBuf {
        let possible_paths = [
            PathBuf::from("autodevops.yaml"),
            PathBuf::from("autodevops.yml"),
            PathBuf::from(".autodevops.yaml"),
        ];

        // Check current directory
        if let Some(found) = possible_paths.iter().find(|p| p.exists()) {
            return found.clone();
        }

        // Check home directory
        if let Some(home_dir) = dirs::home_dir() {
            let home_config = home_dir.join(".autodevops").join("config.yaml");
            if home_config.exists() {
                return home_config;
            }
        }

        // Return default path (may not exist)
        PathBuf::from("autodevops.yaml")
    }

    /// Merge environment variables into configuration
    fn merge_env(&mut self) {
        self.merge_env_from(|key| std::env::var(key).ok());
    }

    /// Apply overrides from any variable source; empty values are ignored
    pub fn merge_env_from<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        // GitHub configuration
        if let Some(token) = var("GITHUB_TOKEN").or_else(|| var("GITHUB_PAT")) {
            self.handlers.github.token = Some(token);
        }
        if let Some(api_url) = var("GITHUB_API_URL") {
            self.handlers.github.api_url = api_url;
        }
        if let Some(repo) = var("GITHUB_REPO") {
            self.handlers.github.default_repo = Some(repo);
        }

        // Mail configuration
        if let Some(api_url) = var("MAIL_API_URL") {
            self.handlers.mail.api_url = api_url;
        }
        if let Some(token) = var("MAIL_ACCESS_TOKEN") {
            self.handlers.mail.access_token = Some(token);
        }
        if let Some(from) = var("MAIL_FROM") {
            self.handlers.mail.from = Some(from);
        }

        // Language model configuration
        if let Some(command) = var("OLLAMA_COMMAND") {
            self.handlers.llm.command = command;
        }
        if let Some(model) = var("OLLAMA_MODEL") {
            self.handlers.llm.model = model;
        }

        // Storage and audit log
        if let Some(dir) = var("AUTODEVOPS_WORKFLOWS_DIR") {
            self.workflows_dir = PathBuf::from(dir);
        }
        if let Some(file) = var("AUTODEVOPS_LOG_FILE") {
            self.log_file = Some(PathBuf::from(file));
        }

        // Logging configuration
        if let Some(level) = var("AUTODEVOPS_LOG_LEVEL") {
            self.logging.level = level;
        }
        if let Some(format) = var("AUTODEVOPS_LOG_FORMAT") {
            self.logging.format = format;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.workflows_dir, PathBuf::from("workflows"));
        assert!(config.log_file.is_none());
        assert_eq!(config.handlers.github.api_url, "https://api.github.com");
        assert_eq!(config.handlers.github.default_labels, vec!["auto-generated"]);
        assert_eq!(config.handlers.llm.command, "ollama");
    }

    #[test]
    fn test_load_from_file() {
        let temp_dir = tempdir().unwrap();
        let config_path = temp_dir.path().join("autodevops.yaml");

        let config_content = r#"
workflows_dir: /srv/flows
log_file: /var/log/autodevops.jsonl
github:
  default_repo: acme/ops
  default_labels: [triage]
mail:
  default_recipients: [ops@example.com]
llm:
  model: mistral
logging:
  level: debug
  format: compact
"#;
        fs::write(&config_path, config_content).unwrap();

        let config = Config::load(Some(config_path)).unwrap();
        assert_eq!(config.workflows_dir, PathBuf::from("/srv/flows"));
        assert_eq!(config.handlers.github.default_repo.as_deref(), Some("acme/ops"));
        assert_eq!(config.handlers.github.default_labels, vec!["triage"]);
        assert_eq!(config.handlers.mail.default_recipients, vec!["ops@example.com"]);
        assert_eq!(config.handlers.mail.user, "me");
        assert_eq!(config.logging.format, "compact");
    }

    #[test]
    fn test_env_overrides() {
        let env: HashMap<&str, &str> = [
            ("GITHUB_PAT", "pat-123"),
            ("GITHUB_REPO", "acme/web"),
            ("MAIL_ACCESS_TOKEN", "mail-token"),
            ("OLLAMA_MODEL", "phi3"),
            ("AUTODEVOPS_LOG_FILE", "/tmp/run.jsonl"),
            ("AUTODEVOPS_LOG_LEVEL", ""),
        ]
        .into_iter()
        .collect();

        let mut config = Config::default();
        config.merge_env_from(|key| env.get(key).map(|v| v.to_string()));

        assert_eq!(config.handlers.github.token.as_deref(), Some("pat-123"));
        assert_eq!(config.handlers.github.default_repo.as_deref(), Some("acme/web"));
        assert_eq!(config.handlers.mail.access_token.as_deref(), Some("mail-token"));
        assert_eq!(config.handlers.llm.model, "phi3");
        assert_eq!(config.log_file, Some(PathBuf::from("/tmp/run.jsonl")));
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn test_github_token_preferred_over_pat() {
        let mut config = Config::default();
        config.merge_env_from(|key| match key {
            "GITHUB_TOKEN" => Some("token".to_string()),
            "GITHUB_PAT" => Some("pat".to_string()),
            _ => None,
        });
        assert_eq!(config.handlers.github.token.as_deref(), Some("token"));
    }
}
