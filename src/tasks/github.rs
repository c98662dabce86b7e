// ABOUTME: GitHub task handlers for issue creation and pull request listing
// ABOUTME: Talks to the GitHub REST API with token authentication

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value as JsonValue};
use tracing::info;

use super::{param_list, param_str, require_str, HandlerError, Result, TaskHandler};
use crate::parser::{TaskKind, TaskParams};

fn default_api_url() -> String {
    "https://api.github.com".to_string()
}

fn default_labels() -> Vec<String> {
    vec!["auto-generated".to_string()]
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GithubSettings {
    #[serde(default = "default_api_url")]
    pub api_url: String,
    #[serde(default)]
    pub token: Option<String>,
    /// `owner/repo` used when a task names no repository
    #[serde(default)]
    pub default_repo: Option<String>,
    #[serde(default = "default_labels")]
    pub default_labels: Vec<String>,
}

impl Default for GithubSettings {
    fn default() -> Self {
        Self {
            api_url: default_api_url(),
            token: None,
            default_repo: None,
            default_labels: default_labels(),
        }
    }
}

/// Repository coordinates parsed from `owner/repo` or a GitHub URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepoRef {
    pub owner: String,
    pub name: String,
}

impl RepoRef {
    /// Accepts `owner/repo`, `https://github.com/owner/repo(.git)` and
    /// `git@github.com:owner/repo.git`.
    pub fn parse(input: &str) -> Option<Self> {
        let input = input.trim();

        let path = if let Some(rest) = input.strip_prefix("git@") {
            rest.split_once(':')?.1.to_string()
        } else if input.contains("://") {
            url::Url::parse(input).ok()?.path().to_string()
        } else {
            input.to_string()
        };

        let mut segments = path.trim_matches('/').split('/').filter(|s| !s.is_empty());
        let owner = segments.next()?;
        let name = segments.next()?.trim_end_matches(".git");

        if owner.is_empty() || name.is_empty() {
            return None;
        }

        Some(Self {
            owner: owner.to_string(),
            name: name.to_string(),
        })
    }
}

impl std::fmt::Display for RepoRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.owner, self.name)
    }
}

#[derive(Debug, Deserialize)]
struct GithubUser {
    login: String,
}

#[derive(Debug, Deserialize)]
struct GithubLabel {
    name: String,
}

#[derive(Debug, Deserialize)]
struct GithubIssue {
    number: u64,
    title: String,
    state: String,
    html_url: String,
    created_at: String,
    user: Option<GithubUser>,
}

#[derive(Debug, Deserialize)]
struct GithubBranch {
    #[serde(rename = "ref")]
    branch: String,
}

#[derive(Debug, Deserialize)]
struct GithubPullRequest {
    number: u64,
    title: String,
    state: String,
    html_url: String,
    created_at: String,
    updated_at: String,
    merged_at: Option<String>,
    body: Option<String>,
    #[serde(default)]
    draft: bool,
    user: Option<GithubUser>,
    #[serde(default)]
    labels: Vec<GithubLabel>,
    head: GithubBranch,
    base: GithubBranch,
}

#[derive(Debug, Serialize)]
pub struct PullRequestSummary {
    pub number: u64,
    pub title: String,
    pub state: String,
    pub author: Option<String>,
    pub created_at: String,
    pub updated_at: String,
    pub merged_at: Option<String>,
    pub url: String,
    pub body: String,
    pub draft: bool,
    pub labels: Vec<String>,
    pub head: String,
    pub base: String,
}

impl From<GithubPullRequest> for PullRequestSummary {
    fn from(pr: GithubPullRequest) -> Self {
        Self {
            number: pr.number,
            title: pr.title,
            state: pr.state,
            author: pr.user.map(|u| u.login),
            created_at: pr.created_at,
            updated_at: pr.updated_at,
            merged_at: pr.merged_at,
            url: pr.html_url,
            body: pr.body.unwrap_or_default(),
            draft: pr.draft,
            labels: pr.labels.into_iter().map(|l| l.name).collect(),
            head: pr.head.branch,
            base: pr.base.branch,
        }
    }
}

/// Shared request plumbing for both GitHub handlers.
#[derive(Clone)]
struct GithubApi {
    client: Client,
    settings: GithubSettings,
}

impl GithubApi {
    fn repo(&self, params: &TaskParams) -> Result<RepoRef> {
        let declared = param_str(params, "repo")
            .or_else(|| param_str(params, "url"))
            .or_else(|| self.settings.default_repo.clone())
            .ok_or_else(|| HandlerError::MissingParam("repo".to_string()))?;

        RepoRef::parse(&declared).ok_or_else(|| HandlerError::InvalidParam {
            name: "repo".to_string(),
            reason: format!("expected owner/repo or a GitHub URL, got '{}'", declared),
        })
    }

    fn endpoint(&self, repo: &RepoRef, path: &str) -> String {
        format!(
            "{}/repos/{}/{}/{}",
            self.settings.api_url.trim_end_matches('/'),
            repo.owner,
            repo.name,
            path
        )
    }

    fn require_token(&self) -> Result<()> {
        match &self.settings.token {
            Some(_) => Ok(()),
            None => Err(HandlerError::NotConfigured(
                "GitHub token not configured".to_string(),
            )),
        }
    }

    fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        let request = request.header("Accept", "application/vnd.github+json");
        match &self.settings.token {
            Some(token) => request.header("Authorization", format!("token {}", token)),
            None => request,
        }
    }

    async fn check(response: Response) -> Result<Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let message = response.text().await.unwrap_or_default();
        Err(HandlerError::Api {
            service: "GitHub".to_string(),
            status: status.as_u16(),
            message,
        })
    }
}

pub struct IssueCreator {
    api: GithubApi,
}

impl IssueCreator {
    pub fn new(client: Client, settings: GithubSettings) -> Self {
        Self {
            api: GithubApi { client, settings },
        }
    }
}

#[async_trait]
impl TaskHandler for IssueCreator {
    fn kind(&self) -> TaskKind {
        TaskKind::IssueCreate
    }

    async fn execute(&self, params: &TaskParams) -> Result<JsonValue> {
        self.api.require_token()?;

        let repo = self.api.repo(params)?;
        let title = require_str(params, "title")?;
        let body = param_str(params, "body").unwrap_or_default();
        let labels =
            param_list(params, "labels").unwrap_or_else(|| self.api.settings.default_labels.clone());

        info!("Creating GitHub issue in {}: {}", repo, title);

        let request = self
            .api
            .client
            .post(self.api.endpoint(&repo, "issues"))
            .json(&json!({ "title": title, "body": body, "labels": labels }));
        let response = GithubApi::check(self.api.authorize(request).send().await?).await?;
        let issue: GithubIssue = response.json().await?;

        info!("Created issue #{}: {}", issue.number, issue.html_url);

        Ok(json!({
            "number": issue.number,
            "title": issue.title,
            "state": issue.state,
            "url": issue.html_url,
            "created_at": issue.created_at,
            "author": issue.user.map(|u| u.login),
        }))
    }
}

pub struct PullRequestLister {
    api: GithubApi,
}

impl PullRequestLister {
    pub fn new(client: Client, settings: GithubSettings) -> Self {
        Self {
            api: GithubApi { client, settings },
        }
    }
}

#[async_trait]
impl TaskHandler for PullRequestLister {
    fn kind(&self) -> TaskKind {
        TaskKind::PrList
    }

    async fn execute(&self, params: &TaskParams) -> Result<JsonValue> {
        self.api.require_token()?;

        let repo = self.api.repo(params)?;
        let state = param_str(params, "state").unwrap_or_else(|| "open".to_string());

        info!("Listing {} pull requests for {}", state, repo);

        let request = self
            .api
            .client
            .get(self.api.endpoint(&repo, "pulls"))
            .query(&[("state", state.as_str()), ("per_page", "100")]);
        let response = GithubApi::check(self.api.authorize(request).send().await?).await?;
        let pulls: Vec<GithubPullRequest> = response.json().await?;

        let pull_requests: Vec<PullRequestSummary> =
            pulls.into_iter().map(PullRequestSummary::from).collect();

        Ok(json!({
            "total": pull_requests.len(),
            "pull_requests": pull_requests,
        }))
    }
}
