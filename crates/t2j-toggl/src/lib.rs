//! Toggl API integration for the work log synchronizer.
//!
//! Implements the source side of the reconciliation: fetching time entries
//! and the project list used for client filtering.

use std::fmt;
use std::time::Duration;

use async_trait::async_trait;
use chrono::SecondsFormat;
use thiserror::Error;

use t2j_core::{BoxError, EntryWindow, Project, TimeEntry, TimeEntrySource};

/// Toggl API v8 root.
pub const DEFAULT_BASE_URL: &str = "https://www.toggl.com/api/v8/";

/// Default request timeout for API calls.
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Fixed basic-auth password the API expects when the username is a token.
const TOKEN_AUTH_PASSWORD: &str = "api_token";

/// Toggl client errors.
#[derive(Debug, Error)]
pub enum TogglError {
    /// The provided API token was invalid.
    #[error("invalid API token: {reason}")]
    InvalidToken { reason: &'static str },
    /// Failed to build HTTP client.
    #[error("failed to build HTTP client: {0}")]
    ClientBuild(#[source] reqwest::Error),
    /// HTTP request failed.
    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),
    /// API returned an error response.
    #[error("API error: status {status}: {body}")]
    Api {
        status: reqwest::StatusCode,
        body: String,
    },
    /// Failed to parse response.
    #[error("invalid response: {0}")]
    InvalidResponse(String),
}

/// Toggl API client.
///
/// # Thread Safety
///
/// The client is safe to clone and share across threads. Each clone shares
/// the underlying HTTP connection pool.
#[derive(Clone)]
pub struct TogglClient {
    http: reqwest::Client,
    base_url: String,
    api_token: String,
}

impl fmt::Debug for TogglClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TogglClient")
            .field("base_url", &self.base_url)
            .field("api_token", &"[REDACTED]")
            .finish_non_exhaustive()
    }
}

impl TogglClient {
    /// Creates a new client with the given API token.
    ///
    /// # Errors
    ///
    /// Returns an error if the token is empty or whitespace-only, or if the
    /// HTTP client fails to build.
    pub fn new(api_token: impl Into<String>) -> Result<Self, TogglError> {
        let api_token = api_token.into();

        if api_token.trim().is_empty() {
            return Err(TogglError::InvalidToken {
                reason: "API token cannot be empty",
            });
        }

        let http = reqwest::Client::builder()
            .timeout(DEFAULT_TIMEOUT)
            .build()
            .map_err(TogglError::ClientBuild)?;

        Ok(Self {
            http,
            base_url: DEFAULT_BASE_URL.to_string(),
            api_token,
        })
    }

    /// Points the client at a different API root. Used by tests and proxies.
    #[must_use]
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        let mut base_url = base_url.into();
        if !base_url.ends_with('/') {
            base_url.push('/');
        }
        self.base_url = base_url;
        self
    }

    fn url_for(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    /// Fetches time entries, bounded to `window` when given.
    ///
    /// Without a window the API returns its default range of recent entries.
    pub async fn time_entries(
        &self,
        window: Option<EntryWindow>,
    ) -> Result<Vec<TimeEntry>, TogglError> {
        let mut request = self
            .http
            .get(self.url_for("time_entries"))
            .basic_auth(&self.api_token, Some(TOKEN_AUTH_PASSWORD));

        if let Some(window) = window {
            request = request.query(&[
                (
                    "start_date",
                    window.start.to_rfc3339_opts(SecondsFormat::Secs, true),
                ),
                (
                    "end_date",
                    window.end.to_rfc3339_opts(SecondsFormat::Secs, true),
                ),
            ]);
        }

        let response = request.send().await?;
        let status = response.status();
        let body = response.text().await?;
        if !status.is_success() {
            return Err(TogglError::Api { status, body });
        }

        serde_json::from_str(&body).map_err(|err| TogglError::InvalidResponse(err.to_string()))
    }

    /// Fetches the projects of one client of the account.
    ///
    /// The endpoint answers `null` for clients without projects; that comes
    /// back as an empty list.
    pub async fn client_projects(&self, client_id: i64) -> Result<Vec<Project>, TogglError> {
        let response = self
            .http
            .get(self.url_for(&format!("clients/{client_id}/projects")))
            .basic_auth(&self.api_token, Some(TOKEN_AUTH_PASSWORD))
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;
        if !status.is_success() {
            return Err(TogglError::Api { status, body });
        }

        let projects: Option<Vec<Project>> = serde_json::from_str(&body)
            .map_err(|err| TogglError::InvalidResponse(err.to_string()))?;
        Ok(projects.unwrap_or_default())
    }
}

#[async_trait]
impl TimeEntrySource for TogglClient {
    async fn fetch_time_entries(
        &self,
        window: Option<EntryWindow>,
    ) -> Result<Vec<TimeEntry>, BoxError> {
        Ok(self.time_entries(window).await?)
    }

    async fn fetch_projects(&self, client_id: i64) -> Result<Vec<Project>, BoxError> {
        Ok(self.client_projects(client_id).await?)
    }
}
