//! Shared sync execution for the CLI command and the HTTP trigger.

use std::fmt::Write as _;
use std::time::Duration;

use anyhow::{Context, Result};

use t2j_core::{Reconciler, SyncEvent, SyncReport};
use t2j_jira::JiraClient;
use t2j_toggl::TogglClient;

use crate::Config;

/// Timeout for the error webhook call.
const WEBHOOK_TIMEOUT: Duration = Duration::from_secs(10);

/// Runs one sync pass with the configured collaborators.
///
/// The run is bounded by the configured ceiling. On failure the error
/// webhook, when configured, is notified before the error goes back to the
/// caller.
pub async fn execute_sync(config: &Config, days_back: u32) -> Result<SyncReport> {
    let result = run_bounded(config, days_back).await;

    if let Err(err) = &result {
        tracing::error!("sync run failed: {err:#}");
        if let Some(url) = config.error_webhook_url.as_deref() {
            notify_error_webhook(url).await;
        }
    }

    result
}

async fn run_bounded(config: &Config, days_back: u32) -> Result<SyncReport> {
    config.validate_sync()?;

    let source = TogglClient::new(config.toggl_api_token.clone())
        .context("failed to build Toggl client")?
        .with_base_url(config.toggl_api_url.clone());
    let sink = JiraClient::new(
        config.jira_host.clone(),
        config.jira_username.clone(),
        config.jira_password.clone(),
    )
    .context("failed to build JIRA client")?;

    let mut reconciler = Reconciler::new(source, sink);
    if let Some(client_id) = config.toggl_client_id {
        reconciler = reconciler.with_source_client(client_id);
    }

    let ceiling = Duration::from_secs(config.sync_timeout_secs);
    match tokio::time::timeout(ceiling, reconciler.sync(days_back)).await {
        Ok(report) => Ok(report?),
        Err(_) => anyhow::bail!(
            "sync run exceeded the {}s ceiling",
            config.sync_timeout_secs
        ),
    }
}

/// Fire-and-forget GET to the error webhook. Failures here are only logged;
/// the original sync error stays the one the caller sees.
async fn notify_error_webhook(url: &str) {
    let client = match reqwest::Client::builder().timeout(WEBHOOK_TIMEOUT).build() {
        Ok(client) => client,
        Err(err) => {
            tracing::warn!(error = %err, "failed to build webhook client");
            return;
        }
    };

    match client.get(url).send().await {
        Ok(response) if !response.status().is_success() => {
            tracing::warn!(status = %response.status(), "error webhook answered with an error");
        }
        Ok(_) => tracing::debug!("error webhook notified"),
        Err(err) => tracing::warn!(error = %err, "error webhook notification failed"),
    }
}

/// Renders a report as the plain-text lines both surfaces emit.
pub fn render_report(report: &SyncReport, jira_host: &str) -> String {
    let host = jira_host.trim_end_matches('/');
    let mut out = String::new();

    for event in &report.events {
        match event {
            SyncEvent::Logged {
                issue, entry_id, ..
            } => {
                let _ = writeln!(
                    out,
                    "Logged #{entry_id} in issue {issue} ({host}/browse/{issue})"
                );
            }
            other => {
                let _ = writeln!(out, "{other}");
            }
        }
    }

    let _ = writeln!(
        out,
        "Done. Created {} work logs ({} issues, {} entries considered).",
        report.created, report.groups, report.entries_considered
    );
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    use insta::assert_snapshot;
    use t2j_core::IssueKey;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[test]
    fn render_report_lists_notices_in_order() {
        let report = SyncReport {
            events: vec![
                SyncEvent::IssueNotFound {
                    issue: IssueKey::new("GON-404"),
                },
                SyncEvent::BelowMinimum {
                    issue: IssueKey::new("ABC-1"),
                    entry_id: 4,
                    duration: 30,
                },
                SyncEvent::AlreadyLogged {
                    issue: IssueKey::new("ABC-1"),
                    entry_id: 5,
                },
                SyncEvent::Logged {
                    issue: IssueKey::new("ABC-1"),
                    entry_id: 6,
                    time_spent_seconds: 300,
                },
            ],
            entries_considered: 4,
            groups: 2,
            created: 1,
        };

        let rendered = render_report(&report, "https://tracker.example.com/");
        assert_snapshot!(rendered.trim_end(), @r"
        Issue GON-404 not found.
        Entry #4 below one minute, skipping...
        Entry #5 already logged, skipping...
        Logged #6 in issue ABC-1 (https://tracker.example.com/browse/ABC-1)
        Done. Created 1 work logs (2 issues, 4 entries considered).
        ");
    }

    #[test]
    fn render_report_of_empty_run_is_just_the_summary() {
        let rendered = render_report(&SyncReport::default(), "https://tracker.example.com");
        assert_eq!(
            rendered,
            "Done. Created 0 work logs (0 issues, 0 entries considered).\n"
        );
    }

    #[tokio::test]
    async fn execute_sync_rejects_unconfigured_setup() {
        let err = execute_sync(&Config::default(), 0)
            .await
            .expect_err("unconfigured sync fails");
        assert!(err.to_string().contains("toggl_api_token"));
    }

    #[tokio::test]
    async fn execute_sync_notifies_webhook_on_failure() {
        let toggl = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/time_entries"))
            .respond_with(ResponseTemplate::new(500).set_body_string("upstream down"))
            .mount(&toggl)
            .await;

        // expect(1) verifies the GET fired when the server drops.
        let webhook = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/hook"))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&webhook)
            .await;

        let config = Config {
            toggl_api_token: "1971800d4d82861d8f2c1651fea4d212".to_string(),
            toggl_api_url: toggl.uri(),
            jira_host: "https://tracker.example.com".to_string(),
            jira_username: "jirauser".to_string(),
            jira_password: "jirapass".to_string(),
            error_webhook_url: Some(format!("{}/hook", webhook.uri())),
            ..Config::default()
        };

        let err = execute_sync(&config, 0).await.expect_err("sync fails");
        assert!(
            err.to_string().contains("time entry source"),
            "error: {err:#}"
        );
    }
}
