//! Contents API client.

use std::time::Duration;

use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use pipeline::{CommitSha, ContentError, ContentSource, WorkflowPath};
use reqwest::header::ACCEPT;
use reqwest::{StatusCode, Url};
use serde::Deserialize;
use thiserror::Error;
use tracing::{debug, instrument};

/// Public GitHub API root.
pub const DEFAULT_API_BASE: &str = "https://api.github.com";

const API_VERSION: &str = "2022-11-28";

/// Errors constructing a [`GithubContentClient`].
#[derive(Debug, Error)]
pub enum GithubError {
    #[error("Invalid GitHub API base URL '{url}': {reason}")]
    InvalidBaseUrl { url: String, reason: String },

    #[error("Failed to build HTTP client: {0}")]
    Client(#[from] reqwest::Error),
}

/// Connection settings for the contents API.
#[derive(Debug, Clone)]
pub struct GithubConfig {
    /// API root; `https://api.github.com` or a GitHub Enterprise `/api/v3` URL.
    pub api_base: String,
    /// Token sent as a bearer credential. Public repositories work without one.
    pub token: Option<String>,
    pub timeout: Duration,
    pub user_agent: String,
}

impl Default for GithubConfig {
    fn default() -> Self {
        Self {
            api_base: DEFAULT_API_BASE.to_owned(),
            token: None,
            timeout: Duration::from_secs(30),
            user_agent: concat!("pushbridge/", env!("CARGO_PKG_VERSION")).to_owned(),
        }
    }
}

/// [`ContentSource`] backed by the GitHub REST API.
#[derive(Debug, Clone)]
pub struct GithubContentClient {
    http: reqwest::Client,
    api_base: Url,
    token: Option<String>,
}

/// The fields of a contents API response this client reads.
#[derive(Debug, Deserialize)]
struct ContentResponse {
    #[serde(rename = "type", default)]
    kind: Option<String>,
    #[serde(default)]
    encoding: Option<String>,
    #[serde(default)]
    content: Option<String>,
}

impl GithubContentClient {
    /// Builds a client from `config`.
    ///
    /// # Errors
    ///
    /// [`GithubError::InvalidBaseUrl`] if `api_base` is not an absolute
    /// hierarchical URL; [`GithubError::Client`] if the TLS backend fails to
    /// initialise.
    pub fn new(config: GithubConfig) -> Result<Self, GithubError> {
        let api_base = Url::parse(&config.api_base).map_err(|e| GithubError::InvalidBaseUrl {
            url: config.api_base.clone(),
            reason: e.to_string(),
        })?;
        if api_base.cannot_be_a_base() {
            return Err(GithubError::InvalidBaseUrl {
                url: config.api_base,
                reason: "URL cannot carry a path".to_owned(),
            });
        }

        let http = reqwest::Client::builder()
            .timeout(config.timeout)
            .user_agent(config.user_agent)
            .build()?;

        Ok(Self {
            http,
            api_base,
            token: config.token.filter(|t| !t.is_empty()),
        })
    }

    fn contents_url(&self, owner: &str, repo: &str, path: &str) -> Result<Url, ContentError> {
        let mut url = self.api_base.clone();
        url.path_segments_mut()
            .map_err(|()| ContentError::Request("API base URL cannot carry a path".to_owned()))?
            .pop_if_empty()
            .extend(["repos", owner, repo, "contents"])
            .extend(path.split('/').filter(|segment| !segment.is_empty()));
        Ok(url)
    }
}

#[async_trait]
impl ContentSource for GithubContentClient {
    #[instrument(skip(self, path, reference), fields(path = %path, reference = %reference))]
    async fn fetch_file(
        &self,
        owner: &str,
        repo: &str,
        path: &WorkflowPath,
        reference: &CommitSha,
    ) -> Result<String, ContentError> {
        let url = self.contents_url(owner, repo, path.as_str())?;

        let mut request = self
            .http
            .get(url)
            .query(&[("ref", reference.as_str())])
            .header(ACCEPT, "application/vnd.github+json")
            .header("X-GitHub-Api-Version", API_VERSION);
        if let Some(token) = &self.token {
            request = request.bearer_auth(token);
        }

        let resp = request
            .send()
            .await
            .map_err(|e| ContentError::Request(e.to_string()))?;

        let status = resp.status();
        if status == StatusCode::NOT_FOUND {
            return Err(ContentError::NotFound {
                path: path.to_string(),
                reference: reference.to_string(),
            });
        }
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(ContentError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let body: ContentResponse = resp
            .json()
            .await
            .map_err(|e| ContentError::UnexpectedResponse(e.to_string()))?;
        let text = decode_content(body)?;
        debug!(bytes = text.len(), "Fetched file content");
        Ok(text)
    }
}

/// Decodes the base64 payload of a file response.
///
/// GitHub wraps the encoded text at 60 columns; whitespace is stripped
/// before decoding.
fn decode_content(response: ContentResponse) -> Result<String, ContentError> {
    if let Some(kind) = response.kind.as_deref() {
        if kind != "file" {
            return Err(ContentError::UnexpectedResponse(format!(
                "expected a file, got '{kind}'"
            )));
        }
    }
    if response.encoding.as_deref() != Some("base64") {
        return Err(ContentError::UnexpectedResponse(format!(
            "unsupported encoding {:?}",
            response.encoding
        )));
    }

    let compact: String = response
        .content
        .unwrap_or_default()
        .chars()
        .filter(|c| !c.is_ascii_whitespace())
        .collect();
    let bytes = BASE64
        .decode(compact)
        .map_err(|e| ContentError::Decode(e.to_string()))?;
    String::from_utf8(bytes).map_err(|e| ContentError::Decode(e.to_string()))
}
