//! Time entry model and the lookback window sent to the source.

use chrono::{DateTime, Duration, Utc};
use serde::Deserialize;
use thiserror::Error;

/// Tag that marks an entry as destined for the issue tracker.
pub const ISSUE_TAG: &str = "JIRA";

/// Days a bounded window spans beyond its start.
pub const WINDOW_SPAN_DAYS: i64 = 14;

/// A single tracked span of work as reported by the time-entry source.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct TimeEntry {
    /// Source-assigned entry id, unique per entry.
    pub id: i64,

    /// Free-text description. Absent when the user never typed one.
    #[serde(default)]
    pub description: Option<String>,

    /// Duration in seconds. Negative while the entry is still running.
    pub duration: i64,

    /// Project the entry is filed under, if any.
    #[serde(rename = "pid", default)]
    pub project_id: Option<i64>,

    /// User-assigned tags.
    #[serde(default)]
    pub tags: Vec<String>,

    /// Start timestamp as reported by the source (RFC 3339).
    pub start: String,
}

impl TimeEntry {
    /// Returns true while the entry's timer is still running.
    pub fn is_running(&self) -> bool {
        self.duration < 0
    }

    /// Returns true when the entry carries the issue-tracker tag.
    pub fn has_issue_tag(&self) -> bool {
        self.tags.iter().any(|tag| tag == ISSUE_TAG)
    }
}

/// A project of the time-entry source's account.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Project {
    pub id: i64,
    #[serde(default)]
    pub name: String,
}

/// Half-open fetch window passed to the time-entry source.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EntryWindow {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

/// Lookback so large the window start falls outside the representable
/// date range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("lookback of {days_back} days reaches outside the supported date range")]
pub struct LookbackOutOfRange {
    pub days_back: u32,
}

/// Computes the fetch window for a sync run.
///
/// `days_back == 0` means unbounded. Otherwise the window starts `days_back`
/// days before `now` and spans [`WINDOW_SPAN_DAYS`] days, clamped so the end
/// never passes `now`. A lookback reaching before the representable date
/// range is an error.
pub fn lookback_window(
    now: DateTime<Utc>,
    days_back: u32,
) -> Result<Option<EntryWindow>, LookbackOutOfRange> {
    if days_back == 0 {
        return Ok(None);
    }
    let days = i64::from(days_back);
    let start = now.checked_sub_signed(Duration::days(days));
    let end = now.checked_sub_signed(Duration::days((days - WINDOW_SPAN_DAYS).max(0)));
    match (start, end) {
        (Some(start), Some(end)) => Ok(Some(EntryWindow { start, end })),
        _ => Err(LookbackOutOfRange { days_back }),
    }
}
