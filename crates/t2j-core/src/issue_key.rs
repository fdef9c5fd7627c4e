//! Issue key extraction from entry descriptions.

use std::fmt;
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

/// Placeholder matched against when an entry carries no description.
pub const MISSING_DESCRIPTION: &str = "(no description)";

/// An issue key must sit at the front of a word and be followed by a space,
/// so `ABC-123.` or a bare trailing `ABC-123` never match.
static KEY_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"([A-Z]{2,3}-[0-9]+) ").expect("issue key pattern must compile"));

/// Identifier of a tracked issue, e.g. `ABC-123`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct IssueKey(String);

impl IssueKey {
    /// Wraps a raw key. Real input goes through [`extract_issue_key`], which
    /// guarantees the `AB-1` shape; this is for keys from trusted places.
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for IssueKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Extracts the first issue key from a description.
///
/// Entries without a description match against [`MISSING_DESCRIPTION`], the
/// same text the source shows for them. That placeholder can never contain a
/// key, so such entries always come back `None`.
pub fn extract_issue_key(description: Option<&str>) -> Option<IssueKey> {
    let text = description.unwrap_or(MISSING_DESCRIPTION);
    KEY_PATTERN
        .captures(text)
        .map(|caps| IssueKey(caps[1].to_string()))
}
