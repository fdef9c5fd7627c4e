//! Core domain logic for the work log synchronizer.
//!
//! This crate contains the fundamental types and logic for:
//! - Entry filtering: which tracked time is loggable at all
//! - Issue keys: extracting `ABC-123` style keys from descriptions
//! - Deduplication: recognizing entries already present in the tracker
//! - Reconciliation: the pipeline driving a source and a sink

mod entry;
mod issue_key;
mod reconcile;
mod worklog;

pub use entry::{
    EntryWindow, ISSUE_TAG, LookbackOutOfRange, Project, TimeEntry, WINDOW_SPAN_DAYS,
    lookback_window,
};
pub use issue_key::{IssueKey, MISSING_DESCRIPTION, extract_issue_key};
pub use reconcile::{
    BoxError, IssueGroup, Reconciler, SyncError, SyncEvent, SyncReport, TimeEntrySource,
    WorkLogSink, group_entries_by_issue,
};
pub use worklog::{
    MIN_LOGGABLE_SECS, NewWorklog, WorklogEntry, format_started, logged_entry_ids,
    worklog_comment,
};
