//! GitHub REST client

use std::time::Duration;

use reqwest::{header, Client, RequestBuilder, Response, StatusCode};
use secrecy::{ExposeSecret, SecretString};
use serde::de::DeserializeOwned;
use tracing::debug;
use url::Url;

use github_models::ErrorResponse;

use crate::errors::BotError;
use crate::github::RepoRef;

/// Media types enabling `transient_environment` / `production_environment`
/// and the `inactive` deployment state
pub const DEPLOYMENT_PREVIEWS: &str =
    "application/vnd.github.ant-man-preview+json, application/vnd.github.flash-preview+json";

const USER_AGENT: &str = concat!("deploybot/", env!("CARGO_PKG_VERSION"));

/// HTTP client for the GitHub REST API
pub struct GithubClient {
    client: Client,
    base_url: Url,
    token: Option<SecretString>,
}

impl GithubClient {
    /// Create a new GitHub client
    pub fn new(
        base_url: &str,
        token: Option<SecretString>,
        timeout: Duration,
    ) -> Result<Self, BotError> {
        let parsed = Url::parse(base_url)
            .map_err(|e| BotError::ConfigError(format!("invalid GitHub API url {base_url}: {e}")))?;
        if parsed.cannot_be_a_base() {
            return Err(BotError::ConfigError(format!(
                "GitHub API url {base_url} cannot be a base"
            )));
        }

        let mut headers = header::HeaderMap::new();
        headers.insert(header::USER_AGENT, header::HeaderValue::from_static(USER_AGENT));
        headers.insert(
            header::ACCEPT,
            header::HeaderValue::from_static("application/vnd.github+json"),
        );
        headers.insert(
            "x-github-api-version",
            header::HeaderValue::from_static("2022-11-28"),
        );

        let client = Client::builder()
            .default_headers(headers)
            .timeout(timeout)
            .build()?;

        Ok(Self {
            client,
            base_url: parsed,
            token,
        })
    }

    /// Get the base URL
    pub fn base_url(&self) -> &str {
        self.base_url.as_str().trim_end_matches('/')
    }

    /// `<base>/repos/<owner>/<name>/<tail...>`, every segment percent-encoded
    pub(crate) fn repo_url<'a>(
        &self,
        repo: &RepoRef,
        tail: impl IntoIterator<Item = &'a str>,
    ) -> Result<Url, BotError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| BotError::ConfigError(format!("cannot extend {}", self.base_url)))?
            .pop_if_empty()
            .extend(["repos", repo.owner.as_str(), repo.name.as_str()])
            .extend(tail.into_iter().filter(|segment| !segment.is_empty()));
        Ok(url)
    }

    pub(crate) fn get(&self, url: Url) -> RequestBuilder {
        self.authorize(self.client.get(url))
    }

    pub(crate) fn post(&self, url: Url) -> RequestBuilder {
        self.authorize(self.client.post(url))
    }

    fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        match &self.token {
            Some(token) => request.header(
                header::AUTHORIZATION,
                format!("Bearer {}", token.expose_secret().trim()),
            ),
            None => request,
        }
    }

    /// Send a request, turning any non-success status into
    /// [`BotError::PlatformError`]. Callers decide how loudly to report it:
    /// some statuses (a missing file, an unknown commit) are expected.
    pub(crate) async fn send(
        &self,
        operation: &str,
        request: RequestBuilder,
    ) -> Result<Response, BotError> {
        debug!("GitHub request: {}", operation);
        let response = request.send().await?;

        if !response.status().is_success() {
            let status = response.status();
            let message = error_message(response).await;
            debug!("GitHub {} returned {}: {}", operation, status, message);
            return Err(BotError::PlatformError {
                status: status.as_u16(),
                message,
            });
        }

        Ok(response)
    }

    /// Send a request and decode a JSON body
    pub(crate) async fn send_json<T: DeserializeOwned>(
        &self,
        operation: &str,
        request: RequestBuilder,
    ) -> Result<T, BotError> {
        let response = self.send(operation, request).await?;
        Ok(response.json().await?)
    }
}

/// Extract the `message` field of an error body, falling back to the raw text
pub(crate) async fn error_message(response: Response) -> String {
    let status = response.status();
    let body = response.text().await.unwrap_or_default();
    match serde_json::from_str::<ErrorResponse>(&body) {
        Ok(parsed) => parsed.message,
        Err(_) if body.is_empty() => status
            .canonical_reason()
            .unwrap_or("unknown error")
            .to_string(),
        Err(_) => body,
    }
}

/// Whether an error is a platform response with one of the given statuses
pub(crate) fn has_status(err: &BotError, statuses: &[StatusCode]) -> bool {
    match err {
        BotError::PlatformError { status, .. } => statuses.iter().any(|s| s.as_u16() == *status),
        _ => false,
    }
}
