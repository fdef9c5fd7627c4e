//! JIRA REST integration for the work log synchronizer.
//!
//! Implements the sink side of the reconciliation: reading an issue's
//! existing work-logs and creating new ones.

use std::fmt;
use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use thiserror::Error;

use t2j_core::{BoxError, IssueKey, NewWorklog, WorkLogSink, WorklogEntry};

/// Default request timeout for API calls.
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// REST API prefix appended to the configured host.
const REST_PREFIX: &str = "rest/api/2";

/// JIRA client errors.
#[derive(Debug, Error)]
pub enum JiraError {
    /// Host or credentials were unusable.
    #[error("invalid JIRA settings: {reason}")]
    InvalidSettings { reason: &'static str },
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

/// JIRA REST client scoped to one host and one basic-auth user.
#[derive(Clone)]
pub struct JiraClient {
    http: reqwest::Client,
    host: String,
    username: String,
    password: String,
}

impl fmt::Debug for JiraClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("JiraClient")
            .field("host", &self.host)
            .field("username", &self.username)
            .field("password", &"[REDACTED]")
            .finish_non_exhaustive()
    }
}

/// Work-log collection as returned by the issue work-log resource.
#[derive(Debug, Deserialize)]
struct WorklogPage {
    #[serde(default)]
    worklogs: Vec<WorklogEntry>,
}

impl JiraClient {
    /// Creates a new client for `host`, scheme included
    /// (e.g. `https://tracker.example.com`).
    ///
    /// # Errors
    ///
    /// Returns an error if the host or username is empty, or if the HTTP
    /// client fails to build.
    pub fn new(
        host: impl Into<String>,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Result<Self, JiraError> {
        let host = host.into().trim_end_matches('/').to_string();
        let username = username.into();

        if host.is_empty() {
            return Err(JiraError::InvalidSettings {
                reason: "host cannot be empty",
            });
        }
        if username.trim().is_empty() {
            return Err(JiraError::InvalidSettings {
                reason: "username cannot be empty",
            });
        }

        let http = reqwest::Client::builder()
            .timeout(DEFAULT_TIMEOUT)
            .build()
            .map_err(JiraError::ClientBuild)?;

        Ok(Self {
            http,
            host,
            username,
            password: password.into(),
        })
    }

    fn worklog_url(&self, issue: &IssueKey) -> String {
        format!("{}/{REST_PREFIX}/issue/{issue}/worklog", self.host)
    }

    /// Fetches the existing work-logs of an issue.
    ///
    /// Returns `None` when the tracker does not know the issue.
    pub async fn worklogs(&self, issue: &IssueKey) -> Result<Option<Vec<WorklogEntry>>, JiraError> {
        let response = self
            .http
            .get(self.worklog_url(issue))
            .basic_auth(&self.username, Some(&self.password))
            .send()
            .await?;

        let status = response.status();
        if status == reqwest::StatusCode::NOT_FOUND {
            return Ok(None);
        }

        let body = response.text().await?;
        if !status.is_success() {
            return Err(JiraError::Api { status, body });
        }

        let page: WorklogPage = serde_json::from_str(&body)
            .map_err(|err| JiraError::InvalidResponse(err.to_string()))?;
        Ok(Some(page.worklogs))
    }

    /// Creates a new work-log under an issue.
    pub async fn create_worklog(
        &self,
        issue: &IssueKey,
        worklog: &NewWorklog,
    ) -> Result<(), JiraError> {
        let response = self
            .http
            .post(self.worklog_url(issue))
            .basic_auth(&self.username, Some(&self.password))
            .json(worklog)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await?;
            return Err(JiraError::Api { status, body });
        }

        Ok(())
    }
}

#[async_trait]
impl WorkLogSink for JiraClient {
    async fn fetch_worklogs(
        &self,
        issue: &IssueKey,
    ) -> Result<Option<Vec<WorklogEntry>>, BoxError> {
        Ok(self.worklogs(issue).await?)
    }

    async fn create_worklog(
        &self,
        issue: &IssueKey,
        worklog: &NewWorklog,
    ) -> Result<(), BoxError> {
        Ok(JiraClient::create_worklog(self, issue, worklog).await?)
    }
}
