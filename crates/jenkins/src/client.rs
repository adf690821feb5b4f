//! Jenkins remote-access API client.

use std::collections::BTreeMap;
use std::time::Duration;

use async_trait::async_trait;
use pipeline::{CiEngine, CiError, JobDescriptor, JobName};
use reqwest::header::CONTENT_TYPE;
use reqwest::{RequestBuilder, Response, StatusCode, Url};
use serde::Deserialize;
use thiserror::Error;
use tracing::{debug, instrument};

/// Errors constructing a [`JenkinsClient`].
#[derive(Debug, Error)]
pub enum JenkinsError {
    #[error("Invalid Jenkins URL '{url}': {reason}")]
    InvalidBaseUrl { url: String, reason: String },

    #[error("Failed to build HTTP client: {0}")]
    Client(#[from] reqwest::Error),
}

/// Connection settings for a Jenkins controller.
#[derive(Debug, Clone)]
pub struct JenkinsConfig {
    /// Controller root, e.g. `https://jenkins.example.com/` or
    /// `https://ci.example.com/jenkins/`.
    pub base_url: String,
    pub user: Option<String>,
    pub api_token: Option<String>,
    /// Fetch a CSRF crumb before every POST. Not needed when authenticating
    /// with an API token on Jenkins 2.96+.
    pub use_crumb: bool,
    pub timeout: Duration,
}

impl JenkinsConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            user: None,
            api_token: None,
            use_crumb: false,
            timeout: Duration::from_secs(30),
        }
    }
}

/// CSRF crumb issued by `/crumbIssuer/api/json`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Crumb {
    crumb: String,
    crumb_request_field: String,
}

/// [`CiEngine`] backed by a Jenkins controller.
#[derive(Debug, Clone)]
pub struct JenkinsClient {
    http: reqwest::Client,
    base_url: Url,
    credentials: Option<(String, String)>,
    use_crumb: bool,
}

impl JenkinsClient {
    /// Builds a client from `config`.
    ///
    /// # Errors
    ///
    /// [`JenkinsError::InvalidBaseUrl`] if `base_url` is not an absolute
    /// hierarchical URL; [`JenkinsError::Client`] if the TLS backend fails to
    /// initialise.
    pub fn new(config: JenkinsConfig) -> Result<Self, JenkinsError> {
        let base_url = Url::parse(&config.base_url).map_err(|e| JenkinsError::InvalidBaseUrl {
            url: config.base_url.clone(),
            reason: e.to_string(),
        })?;
        if base_url.cannot_be_a_base() {
            return Err(JenkinsError::InvalidBaseUrl {
                url: config.base_url,
                reason: "URL cannot carry a path".to_owned(),
            });
        }

        let http = reqwest::Client::builder().timeout(config.timeout).build()?;
        let credentials = match (config.user, config.api_token) {
            (Some(user), Some(token)) => Some((user, token)),
            _ => None,
        };

        Ok(Self {
            http,
            base_url,
            credentials,
            use_crumb: config.use_crumb,
        })
    }

    fn endpoint<'a>(&self, segments: impl IntoIterator<Item = &'a str>) -> Result<Url, CiError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|()| CiError::Request("Jenkins URL cannot carry a path".to_owned()))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    fn job_endpoint(&self, name: &JobName, tail: &[&str]) -> Result<Url, CiError> {
        self.endpoint(["job", name.as_str()].into_iter().chain(tail.iter().copied()))
    }

    fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        match &self.credentials {
            Some((user, token)) => request.basic_auth(user, Some(token)),
            None => request,
        }
    }

    async fn crumb(&self) -> Result<Crumb, CiError> {
        let url = self.endpoint(["crumbIssuer", "api", "json"])?;
        let resp = send(self.authorize(self.http.get(url)))
            .await
            .map_err(|e| CiError::Crumb(e.to_string()))?;
        resp.json()
            .await
            .map_err(|e| CiError::Crumb(e.to_string()))
    }

    /// A POST to `url`, authorised and, when configured, carrying a crumb.
    async fn post(&self, url: Url) -> Result<RequestBuilder, CiError> {
        let mut request = self.authorize(self.http.post(url));
        if self.use_crumb {
            let crumb = self.crumb().await?;
            request = request.header(crumb.crumb_request_field, crumb.crumb);
        }
        Ok(request)
    }
}

/// Sends `request`, mapping transport failures and non-success statuses.
async fn send(request: RequestBuilder) -> Result<Response, CiError> {
    let resp = request
        .send()
        .await
        .map_err(|e| CiError::Request(e.to_string()))?;
    let status = resp.status();
    if status.is_success() {
        return Ok(resp);
    }
    let body = resp.text().await.unwrap_or_default();
    Err(CiError::Status {
        status: status.as_u16(),
        body,
    })
}

#[async_trait]
impl CiEngine for JenkinsClient {
    #[instrument(skip(self, name), fields(job = %name))]
    async fn get_job(&self, name: &JobName) -> Result<JobDescriptor, CiError> {
        let url = self.job_endpoint(name, &["api", "json"])?;
        let resp = match send(self.authorize(self.http.get(url))).await {
            Ok(resp) => resp,
            Err(CiError::Status { status, .. }) if status == StatusCode::NOT_FOUND.as_u16() => {
                return Err(CiError::NotFound(name.clone()))
            }
            Err(err) => return Err(err),
        };
        resp.json()
            .await
            .map_err(|e| CiError::Request(format!("parse job descriptor: {e}")))
    }

    #[instrument(skip(self, name, definition), fields(job = %name))]
    async fn create_job(&self, name: &JobName, definition: &str) -> Result<(), CiError> {
        let mut url = self.endpoint(["createItem"])?;
        url.query_pairs_mut().append_pair("name", name.as_str());
        let request = self
            .post(url)
            .await?
            .header(CONTENT_TYPE, "application/xml")
            .body(definition.to_owned());
        send(request).await?;
        debug!("Job created");
        Ok(())
    }

    #[instrument(skip(self, name, definition), fields(job = %name))]
    async fn update_job(&self, name: &JobName, definition: &str) -> Result<(), CiError> {
        let url = self.job_endpoint(name, &["config.xml"])?;
        let request = self
            .post(url)
            .await?
            .header(CONTENT_TYPE, "application/xml")
            .body(definition.to_owned());
        send(request).await?;
        debug!("Job definition replaced");
        Ok(())
    }

    #[instrument(skip(self, name, parameters), fields(job = %name))]
    async fn enqueue_build(
        &self,
        name: &JobName,
        parameters: &BTreeMap<String, String>,
    ) -> Result<(), CiError> {
        let url = self.job_endpoint(name, &["buildWithParameters"])?;
        let request = self.post(url).await?.form(parameters);
        let resp = send(request).await?;
        let queue_item = resp
            .headers()
            .get(reqwest::header::LOCATION)
            .and_then(|v| v.to_str().ok());
        debug!(queue_item, "Build enqueued");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client(base: &str) -> JenkinsClient {
        JenkinsClient::new(JenkinsConfig::new(base)).unwrap()
    }

    fn job(name: &str) -> JobName {
        JobName::new(name).unwrap()
    }

    #[test]
    fn job_endpoints_under_root() {
        let c = client("https://jenkins.example.com");
        assert_eq!(
            c.job_endpoint(&job("acme_site_main"), &["api", "json"])
                .unwrap()
                .as_str(),
            "https://jenkins.example.com/job/acme_site_main/api/json"
        );
        assert_eq!(
            c.job_endpoint(&job("acme_site_main"), &["buildWithParameters"])
                .unwrap()
                .as_str(),
            "https://jenkins.example.com/job/acme_site_main/buildWithParameters"
        );
    }

    #[test]
    fn job_endpoints_keep_context_path_and_encode_names() {
        let c = client("https://ci.example.com/jenkins/");
        assert_eq!(
            c.job_endpoint(&job("acme_site_release 1.0"), &["config.xml"])
                .unwrap()
                .as_str(),
            "https://ci.example.com/jenkins/job/acme_site_release%201.0/config.xml"
        );
    }

    #[test]
    fn create_item_carries_name_query() {
        let c = client("https://jenkins.example.com/");
        let mut url = c.endpoint(["createItem"]).unwrap();
        url.query_pairs_mut().append_pair("name", "acme_site_main");
        assert_eq!(
            url.as_str(),
            "https://jenkins.example.com/createItem?name=acme_site_main"
        );
    }

    #[test]
    fn crumb_parses_issuer_json() {
        let crumb: Crumb = serde_json::from_str(
            r#"{"_class":"hudson.security.csrf.DefaultCrumbIssuer","crumb":"abc123","crumbRequestField":"Jenkins-Crumb"}"#,
        )
        .unwrap();
        assert_eq!(
            crumb,
            Crumb {
                crumb: "abc123".into(),
                crumb_request_field: "Jenkins-Crumb".into(),
            }
        );
    }

    #[test]
    fn credentials_require_user_and_token() {
        let mut config = JenkinsConfig::new("https://jenkins.example.com");
        config.user = Some("bot".into());
        assert!(JenkinsClient::new(config.clone()).unwrap().credentials.is_none());

        config.api_token = Some("t0ken".into());
        assert_eq!(
            JenkinsClient::new(config).unwrap().credentials,
            Some(("bot".to_owned(), "t0ken".to_owned()))
        );
    }

    #[test]
    fn invalid_base_url_is_rejected() {
        assert!(matches!(
            JenkinsClient::new(JenkinsConfig::new("mailto:ci@example.com")).unwrap_err(),
            JenkinsError::InvalidBaseUrl { .. }
        ));
    }
}
