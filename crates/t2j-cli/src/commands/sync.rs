//! Sync command for reconciling tracked time into the issue tracker.

use std::io::Write;

use anyhow::Result;

use crate::Config;
use crate::runner::{execute_sync, render_report};

pub async fn run<W: Write>(writer: &mut W, config: &Config, days_back: u32) -> Result<()> {
    let report = execute_sync(config, days_back).await?;
    write!(writer, "{}", render_report(&report, &config.jira_host))?;
    Ok(())
}
