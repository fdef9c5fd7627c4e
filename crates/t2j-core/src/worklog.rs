//! Work-log records and the comment-embedded entry-id token used for
//! deduplication.

use std::collections::HashSet;
use std::sync::LazyLock;

use chrono::DateTime;
use regex::Regex;
use serde::{Deserialize, Serialize};

/// Minimum entry duration worth logging, in seconds.
pub const MIN_LOGGABLE_SECS: i64 = 60;

/// Timestamp shape the sink expects for `started`: millisecond precision
/// with a numeric UTC offset.
const STARTED_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.3f%z";

/// First `#<digits>` token of a comment names the source entry it came from.
static ENTRY_ID_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"#([0-9]+)").expect("entry id pattern must compile"));

/// An existing work-log read back from the sink.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorklogEntry {
    #[serde(default)]
    pub comment: Option<String>,
    #[serde(default)]
    pub time_spent_seconds: i64,
    #[serde(default)]
    pub started: Option<String>,
}

/// A work-log to be created under an issue.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewWorklog {
    pub time_spent_seconds: i64,
    pub comment: String,
    pub started: String,
}

/// Collects the entry ids already represented in existing work-log comments.
///
/// Only the first `#<digits>` token of each comment counts. Work-logs without
/// a comment cannot be attributed to an entry and contribute nothing, as do
/// tokens too large for an id.
pub fn logged_entry_ids(worklogs: &[WorklogEntry]) -> HashSet<i64> {
    let mut ids = HashSet::new();
    for worklog in worklogs {
        let Some(comment) = worklog.comment.as_deref() else {
            continue;
        };
        if let Some(caps) = ENTRY_ID_PATTERN.captures(comment) {
            if let Ok(id) = caps[1].parse::<i64>() {
                ids.insert(id);
            }
        }
    }
    ids
}

/// Builds the comment for a new work-log: the entry's description followed by
/// the `(Toggl #<id>)` token later runs dedup against.
pub fn worklog_comment(description: Option<&str>, entry_id: i64) -> String {
    format!("{} (Toggl #{entry_id})", description.unwrap_or_default())
        .trim()
        .to_string()
}

/// Reformats a source start timestamp into the sink's expected shape.
///
/// `2013-03-11T11:36:00+00:00` becomes `2013-03-11T11:36:00.000+0000`.
pub fn format_started(start: &str) -> Result<String, chrono::ParseError> {
    let parsed = DateTime::parse_from_rfc3339(start)?;
    Ok(parsed.format(STARTED_FORMAT).to_string())
}
