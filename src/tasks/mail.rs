// ABOUTME: Mail task handlers for reading and sending messages
// ABOUTME: Uses a Gmail-compatible REST API with bearer token authentication

use async_trait::async_trait;
use base64::engine::general_purpose::{URL_SAFE, URL_SAFE_NO_PAD};
use base64::Engine;
use reqwest::{Client, RequestBuilder, Response};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value as JsonValue};
use tracing::{debug, info};

use super::{param_list, param_str, param_u64, HandlerError, Result, TaskHandler};
use crate::parser::{TaskKind, TaskParams};

const DEFAULT_MAX_RESULTS: u64 = 10;
const DEFAULT_SUBJECT: &str = "AutoDevOps notification";

fn default_api_url() -> String {
    "https://gmail.googleapis.com/gmail/v1".to_string()
}

fn default_user() -> String {
    "me".to_string()
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MailSettings {
    #[serde(default = "default_api_url")]
    pub api_url: String,
    #[serde(default = "default_user")]
    pub user: String,
    #[serde(default)]
    pub access_token: Option<String>,
    #[serde(default)]
    pub from: Option<String>,
    #[serde(default)]
    pub default_recipients: Vec<String>,
}

impl Default for MailSettings {
    fn default() -> Self {
        Self {
            api_url: default_api_url(),
            user: default_user(),
            access_token: None,
            from: None,
            default_recipients: Vec::new(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct MessageList {
    #[serde(default)]
    messages: Vec<MessageRef>,
}

#[derive(Debug, Deserialize)]
struct MessageRef {
    id: String,
}

#[derive(Debug, Deserialize)]
struct Message {
    id: String,
    #[serde(default)]
    snippet: String,
    payload: Option<MessagePart>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct MessagePart {
    #[serde(default)]
    mime_type: String,
    #[serde(default)]
    headers: Vec<Header>,
    body: Option<PartBody>,
    #[serde(default)]
    parts: Vec<MessagePart>,
}

#[derive(Debug, Deserialize)]
struct Header {
    name: String,
    value: String,
}

#[derive(Debug, Deserialize)]
struct PartBody {
    data: Option<String>,
}

#[derive(Debug, Deserialize)]
struct SentMessage {
    id: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct MailMessage {
    pub id: String,
    pub subject: String,
    pub from: String,
    pub body: String,
    pub snippet: String,
}

impl MessagePart {
    fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|h| h.name.eq_ignore_ascii_case(name))
            .map(|h| h.value.as_str())
    }

    /// First text/plain body in the part tree, else any body found.
    fn text_body(&self) -> Option<String> {
        self.find_body(Some("text/plain"))
            .or_else(|| self.find_body(None))
    }

    fn find_body(&self, mime: Option<&str>) -> Option<String> {
        let matches_mime = mime.map_or(true, |m| self.mime_type.eq_ignore_ascii_case(m));
        if matches_mime {
            if let Some(text) = self
                .body
                .as_ref()
                .and_then(|b| b.data.as_deref())
                .and_then(decode_base64url)
            {
                return Some(text);
            }
        }

        self.parts.iter().find_map(|part| part.find_body(mime))
    }
}

impl From<Message> for MailMessage {
    fn from(message: Message) -> Self {
        let payload = message.payload.unwrap_or_default();
        Self {
            subject: payload.header("Subject").unwrap_or_default().to_string(),
            from: payload.header("From").unwrap_or_default().to_string(),
            body: payload.text_body().unwrap_or_else(|| message.snippet.clone()),
            snippet: message.snippet,
            id: message.id,
        }
    }
}

/// Decode base64url data, padded or not.
fn decode_base64url(data: &str) -> Option<String> {
    let bytes = URL_SAFE_NO_PAD
        .decode(data.trim_end_matches('='))
        .ok()?;
    Some(String::from_utf8_lossy(&bytes).to_string())
}

/// Build a plain-text RFC 822 message.
pub fn build_rfc822(from: Option<&str>, to: &[String], subject: &str, body: &str) -> String {
    let mut message = String::new();
    if let Some(from) = from {
        message.push_str(&format!("From: {}\r\n", from));
    }
    message.push_str(&format!("To: {}\r\n", to.join(", ")));
    message.push_str(&format!("Subject: {}\r\n", subject));
    message.push_str("MIME-Version: 1.0\r\n");
    message.push_str("Content-Type: text/plain; charset=\"UTF-8\"\r\n\r\n");
    message.push_str(body);
    message
}

#[derive(Clone)]
struct MailApi {
    client: Client,
    settings: MailSettings,
}

impl MailApi {
    fn token(&self) -> Result<&str> {
        self.settings
            .access_token
            .as_deref()
            .ok_or_else(|| HandlerError::NotConfigured("Mail access token not configured".to_string()))
    }

    fn endpoint(&self, path: &str) -> String {
        format!(
            "{}/users/{}/{}",
            self.settings.api_url.trim_end_matches('/'),
            self.settings.user,
            path
        )
    }

    async fn send(&self, request: RequestBuilder) -> Result<Response> {
        let response = request.bearer_auth(self.token()?).send().await?;
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let message = response.text().await.unwrap_or_default();
        Err(HandlerError::Api {
            service: "Mail".to_string(),
            status: status.as_u16(),
            message,
        })
    }
}

pub struct MailReader {
    api: MailApi,
}

impl MailReader {
    pub fn new(client: Client, settings: MailSettings) -> Self {
        Self {
            api: MailApi { client, settings },
        }
    }
}

#[async_trait]
impl TaskHandler for MailReader {
    fn kind(&self) -> TaskKind {
        TaskKind::MailList
    }

    async fn execute(&self, params: &TaskParams) -> Result<JsonValue> {
        self.api.token()?;

        let max_results = param_u64(params, "max_results")?.unwrap_or(DEFAULT_MAX_RESULTS);
        let mut query = vec![("maxResults".to_string(), max_results.to_string())];
        if let Some(q) = param_str(params, "query") {
            query.push(("q".to_string(), q));
        }
        if let Some(label) = param_str(params, "label") {
            query.push(("labelIds".to_string(), label));
        }

        info!("Listing mail messages (max {})", max_results);

        let listed: MessageList = self
            .api
            .send(self.api.client.get(self.api.endpoint("messages")).query(&query))
            .await?
            .json()
            .await?;

        let mut messages = Vec::with_capacity(listed.messages.len());
        for reference in listed.messages {
            let message: Message = self
                .api
                .send(
                    self.api
                        .client
                        .get(self.api.endpoint(&format!("messages/{}", reference.id)))
                        .query(&[("format", "full")]),
                )
                .await?
                .json()
                .await?;
            messages.push(MailMessage::from(message));
        }

        debug!("Fetched {} messages", messages.len());

        let body = messages
            .iter()
            .map(|m| m.body.trim())
            .filter(|b| !b.is_empty())
            .collect::<Vec<_>>()
            .join("\n\n---\n\n");
        let subject = messages
            .first()
            .map(|m| m.subject.clone())
            .unwrap_or_default();

        Ok(json!({
            "count": messages.len(),
            "subject": subject,
            "body": body,
            "messages": messages,
        }))
    }
}

pub struct MailSender {
    api: MailApi,
}

impl MailSender {
    pub fn new(client: Client, settings: MailSettings) -> Self {
        Self {
            api: MailApi { client, settings },
        }
    }

    fn compose_body(params: &TaskParams) -> String {
        let body = param_str(params, "body").unwrap_or_default();
        match param_str(params, "summary") {
            Some(summary) if body.is_empty() => summary,
            Some(summary) => format!("{}\n\n{}", body, summary),
            None => body,
        }
    }
}

#[async_trait]
impl TaskHandler for MailSender {
    fn kind(&self) -> TaskKind {
        TaskKind::MailSend
    }

    async fn execute(&self, params: &TaskParams) -> Result<JsonValue> {
        self.api.token()?;

        let recipients = param_list(params, "to")
            .or_else(|| {
                let defaults = self.api.settings.default_recipients.clone();
                (!defaults.is_empty()).then_some(defaults)
            })
            .ok_or_else(|| HandlerError::MissingParam("to".to_string()))?;
        let subject = param_str(params, "subject").unwrap_or_else(|| DEFAULT_SUBJECT.to_string());
        let body = Self::compose_body(params);

        let message = build_rfc822(
            self.api.settings.from.as_deref(),
            &recipients,
            &subject,
            &body,
        );
        let raw = URL_SAFE.encode(message.as_bytes());

        info!("Sending mail to {}: {}", recipients.join(", "), subject);

        let sent: SentMessage = self
            .api
            .send(
                self.api
                    .client
                    .post(self.api.endpoint("messages/send"))
                    .json(&json!({ "raw": raw })),
            )
            .await?
            .json()
            .await?;

        Ok(json!({
            "sent_to": recipients,
            "subject": subject,
            "message_id": sent.id,
        }))
    }
}
