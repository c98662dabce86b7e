// ABOUTME: Generic HTTP request task handler
// ABOUTME: Sends one request built from params and reports status code and parsed body

use async_trait::async_trait;
use reqwest::{Client, Method};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value as JsonValue};
use tracing::{debug, info};

use super::{param_str, HandlerError, Result, TaskHandler};
use crate::parser::{TaskKind, TaskParams};

fn default_user_agent() -> String {
    format!("autodevops/{}", env!("CARGO_PKG_VERSION"))
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HttpSettings {
    /// Per-request client timeout; unset means no limit
    #[serde(default)]
    pub timeout_seconds: Option<u64>,
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

impl Default for HttpSettings {
    fn default() -> Self {
        Self {
            timeout_seconds: None,
            user_agent: default_user_agent(),
        }
    }
}

pub struct HttpCaller {
    client: Client,
}

impl HttpCaller {
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    fn method(params: &TaskParams) -> Result<Method> {
        let method = param_str(params, "method").unwrap_or_else(|| "GET".to_string());
        Method::from_bytes(method.trim().to_uppercase().as_bytes()).map_err(|_| {
            HandlerError::InvalidParam {
                name: "method".to_string(),
                reason: format!("unsupported HTTP method '{}'", method),
            }
        })
    }
}

/// Parse a response body as JSON, falling back to text, `{}` when empty.
pub(crate) fn parse_body(text: &str) -> JsonValue {
    if text.trim().is_empty() {
        return json!({});
    }
    serde_json::from_str(text).unwrap_or_else(|_| JsonValue::String(text.to_string()))
}

#[async_trait]
impl TaskHandler for HttpCaller {
    fn kind(&self) -> TaskKind {
        TaskKind::HttpRequest
    }

    async fn execute(&self, params: &TaskParams) -> Result<JsonValue> {
        let uri = param_str(params, "uri")
            .or_else(|| param_str(params, "url"))
            .ok_or_else(|| HandlerError::MissingParam("uri".to_string()))?;
        let url = url::Url::parse(&uri).map_err(|e| HandlerError::InvalidParam {
            name: "uri".to_string(),
            reason: e.to_string(),
        })?;
        let method = Self::method(params)?;

        info!("HTTP {} {}", method, url);

        let mut request = self.client.request(method, url);

        if let Some(JsonValue::Object(headers)) = params.get("headers") {
            for (name, value) in headers {
                let value = match value {
                    JsonValue::String(s) => s.clone(),
                    other => other.to_string(),
                };
                request = request.header(name.as_str(), value);
            }
        }

        request = match params.get("body") {
            None | Some(JsonValue::Null) => request,
            Some(JsonValue::String(text)) => request.body(text.clone()),
            Some(body) => request.json(body),
        };

        let response = request.send().await?;
        let status = response.status();
        let text = response.text().await?;

        debug!("HTTP response status {} ({} bytes)", status, text.len());

        Ok(json!({
            "status_code": status.as_u16(),
            "body": parse_body(&text),
        }))
    }
}
