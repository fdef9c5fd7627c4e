//! Reconciliation pipeline: group loggable entries per issue, dedup against
//! the sink's existing work-logs, post whatever is missing.

use std::collections::{HashMap, HashSet};
use std::fmt;

use async_trait::async_trait;
use chrono::Utc;
use thiserror::Error;

use crate::entry::{EntryWindow, LookbackOutOfRange, Project, TimeEntry, lookback_window};
use crate::issue_key::{IssueKey, extract_issue_key};
use crate::worklog::{
    MIN_LOGGABLE_SECS, NewWorklog, WorklogEntry, format_started, logged_entry_ids, worklog_comment,
};

/// Boxed error surfaced by source and sink implementations.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Read side of the reconciliation: the time-tracking service.
///
/// This trait allows the pipeline to work with different transports
/// (the HTTP client from t2j-toggl, or test doubles).
#[async_trait]
pub trait TimeEntrySource: Send + Sync {
    /// Fetches time entries, bounded to `window` when given.
    async fn fetch_time_entries(
        &self,
        window: Option<EntryWindow>,
    ) -> Result<Vec<TimeEntry>, BoxError>;

    /// Fetches the projects belonging to one client of the tracked account.
    async fn fetch_projects(&self, client_id: i64) -> Result<Vec<Project>, BoxError>;
}

/// Write side of the reconciliation: the issue tracker's work-log resource.
#[async_trait]
pub trait WorkLogSink: Send + Sync {
    /// Fetches the existing work-logs of an issue.
    ///
    /// Returns `None` when the issue does not exist in the tracker; every
    /// other failure is an error.
    async fn fetch_worklogs(&self, issue: &IssueKey)
    -> Result<Option<Vec<WorklogEntry>>, BoxError>;

    /// Creates a new work-log under an issue.
    async fn create_worklog(&self, issue: &IssueKey, worklog: &NewWorklog)
    -> Result<(), BoxError>;
}

/// Failure that aborts a sync run.
#[derive(Debug, Error)]
pub enum SyncError {
    /// The requested lookback cannot be expressed as a fetch window.
    #[error("cannot build fetch window: {0}")]
    Window(#[from] LookbackOutOfRange),

    /// The time-entry source failed.
    #[error("time entry source request failed: {0}")]
    Source(#[source] BoxError),

    /// The work-log sink failed outside the recognized issue-missing case.
    #[error("work log sink request failed for {issue}: {source}")]
    Sink {
        issue: IssueKey,
        #[source]
        source: BoxError,
    },

    /// An entry carried a start timestamp the sink format cannot be built
    /// from.
    #[error("invalid start timestamp {start:?} on entry #{entry_id}")]
    InvalidStart {
        entry_id: i64,
        start: String,
        #[source]
        source: chrono::ParseError,
    },
}

/// Entries that mapped to one issue, in source order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IssueGroup {
    pub issue: IssueKey,
    pub entries: Vec<TimeEntry>,
}

/// Filters entries down to the loggable ones and groups them per issue key.
///
/// Dropped along the way: entries still running, entries without a project,
/// entries outside `allowed_projects` (when given), entries missing the
/// issue-tracker tag, and entries whose description yields no key. Groups
/// appear in first-seen key order; entries keep source order within a group.
pub fn group_entries_by_issue(
    entries: Vec<TimeEntry>,
    allowed_projects: Option<&HashSet<i64>>,
) -> Vec<IssueGroup> {
    let mut groups: Vec<IssueGroup> = Vec::new();
    let mut position: HashMap<IssueKey, usize> = HashMap::new();

    for entry in entries {
        if entry.is_running() {
            continue;
        }
        let Some(project_id) = entry.project_id else {
            continue;
        };
        if let Some(allowed) = allowed_projects {
            if !allowed.contains(&project_id) {
                continue;
            }
        }
        if !entry.has_issue_tag() {
            continue;
        }
        let Some(issue) = extract_issue_key(entry.description.as_deref()) else {
            continue;
        };

        match position.get(&issue) {
            Some(&at) => groups[at].entries.push(entry),
            None => {
                position.insert(issue.clone(), groups.len());
                groups.push(IssueGroup {
                    issue,
                    entries: vec![entry],
                });
            }
        }
    }

    groups
}

/// One notice produced while reconciling, in emission order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncEvent {
    /// The sink does not know the issue; its whole group was skipped.
    IssueNotFound { issue: IssueKey },

    /// Entry shorter than [`MIN_LOGGABLE_SECS`]; skipped.
    BelowMinimum {
        issue: IssueKey,
        entry_id: i64,
        duration: i64,
    },

    /// Entry already present among the issue's work-logs; skipped.
    AlreadyLogged { issue: IssueKey, entry_id: i64 },

    /// A work-log was created for the entry.
    Logged {
        issue: IssueKey,
        entry_id: i64,
        time_spent_seconds: i64,
    },
}

impl fmt::Display for SyncEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::IssueNotFound { issue } => write!(f, "Issue {issue} not found."),
            Self::BelowMinimum { entry_id, .. } => {
                write!(f, "Entry #{entry_id} below one minute, skipping...")
            }
            Self::AlreadyLogged { entry_id, .. } => {
                write!(f, "Entry #{entry_id} already logged, skipping...")
            }
            Self::Logged {
                issue, entry_id, ..
            } => write!(f, "Logged #{entry_id} in issue {issue}"),
        }
    }
}

/// Outcome of one sync run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SyncReport {
    /// Notices in the order they were emitted.
    pub events: Vec<SyncEvent>,

    /// Entries that survived filtering and grouping.
    pub entries_considered: usize,

    /// Issue groups visited, missing issues included.
    pub groups: usize,

    /// Work-logs created.
    pub created: usize,
}

/// Drives one source and one sink through a reconciliation pass.
///
/// Both collaborators are injected so tests can substitute in-memory doubles
/// for the HTTP clients.
#[derive(Debug)]
pub struct Reconciler<S, K> {
    source: S,
    sink: K,
    source_client_id: Option<i64>,
}

impl<S, K> Reconciler<S, K>
where
    S: TimeEntrySource,
    K: WorkLogSink,
{
    pub fn new(source: S, sink: K) -> Self {
        Self {
            source,
            sink,
            source_client_id: None,
        }
    }

    /// Restricts entries to projects belonging to this client of the source
    /// account.
    #[must_use]
    pub fn with_source_client(mut self, client_id: i64) -> Self {
        self.source_client_id = Some(client_id);
        self
    }

    /// Runs one full reconciliation pass over the last `days_back` days
    /// (0 = everything the source returns).
    pub async fn sync(&self, days_back: u32) -> Result<SyncReport, SyncError> {
        let window = lookback_window(Utc::now(), days_back)?;
        self.sync_window(window).await
    }

    /// Runs one pass over an explicit window, or unbounded when `None`.
    pub async fn sync_window(
        &self,
        window: Option<EntryWindow>,
    ) -> Result<SyncReport, SyncError> {
        let allowed_projects = match self.source_client_id {
            Some(client_id) => {
                let projects = self
                    .source
                    .fetch_projects(client_id)
                    .await
                    .map_err(SyncError::Source)?;
                Some(
                    projects
                        .into_iter()
                        .map(|project| project.id)
                        .collect::<HashSet<_>>(),
                )
            }
            None => None,
        };

        let entries = self
            .source
            .fetch_time_entries(window)
            .await
            .map_err(SyncError::Source)?;
        let groups = group_entries_by_issue(entries, allowed_projects.as_ref());

        let mut report = SyncReport {
            groups: groups.len(),
            entries_considered: groups.iter().map(|group| group.entries.len()).sum(),
            ..SyncReport::default()
        };

        for group in groups {
            let worklogs = self
                .sink
                .fetch_worklogs(&group.issue)
                .await
                .map_err(|source| SyncError::Sink {
                    issue: group.issue.clone(),
                    source,
                })?;

            let Some(worklogs) = worklogs else {
                tracing::warn!(issue = %group.issue, "issue not found in sink, skipping group");
                report.events.push(SyncEvent::IssueNotFound {
                    issue: group.issue,
                });
                continue;
            };

            let logged = logged_entry_ids(&worklogs);
            self.sync_group(group, &logged, &mut report).await?;
        }

        tracing::info!(
            created = report.created,
            groups = report.groups,
            entries = report.entries_considered,
            "sync pass finished"
        );
        Ok(report)
    }

    /// Reconciles one issue group against the ids already logged under it.
    async fn sync_group(
        &self,
        group: IssueGroup,
        logged: &HashSet<i64>,
        report: &mut SyncReport,
    ) -> Result<(), SyncError> {
        let IssueGroup { issue, entries } = group;

        for entry in entries {
            if entry.duration < MIN_LOGGABLE_SECS {
                tracing::debug!(
                    entry = entry.id,
                    duration = entry.duration,
                    "entry below minimum duration, skipping"
                );
                report.events.push(SyncEvent::BelowMinimum {
                    issue: issue.clone(),
                    entry_id: entry.id,
                    duration: entry.duration,
                });
                continue;
            }

            if logged.contains(&entry.id) {
                tracing::debug!(entry = entry.id, "entry already logged, skipping");
                report.events.push(SyncEvent::AlreadyLogged {
                    issue: issue.clone(),
                    entry_id: entry.id,
                });
                continue;
            }

            let started =
                format_started(&entry.start).map_err(|source| SyncError::InvalidStart {
                    entry_id: entry.id,
                    start: entry.start.clone(),
                    source,
                })?;
            let worklog = NewWorklog {
                time_spent_seconds: entry.duration,
                comment: worklog_comment(entry.description.as_deref(), entry.id),
                started,
            };

            self.sink
                .create_worklog(&issue, &worklog)
                .await
                .map_err(|source| SyncError::Sink {
                    issue: issue.clone(),
                    source,
                })?;

            tracing::info!(entry = entry.id, issue = %issue, seconds = worklog.time_spent_seconds, "work log created");
            report.created += 1;
            report.events.push(SyncEvent::Logged {
                issue: issue.clone(),
                entry_id: entry.id,
                time_spent_seconds: worklog.time_spent_seconds,
            });
        }

        Ok(())
    }
}
