//! JSON run reports.
//!
//! Reports are grouped by the local date of the run:
//! ```text
//! report_dir/
//! └── 2025-05-06/
//!     ├── 071500.json
//!     └── 191500.json
//! ```

use crate::models::RunReport;
use std::error::Error;
use std::path::PathBuf;
use tokio::fs;
use tracing::{error, info, instrument};

/// Path of the report file for `report` under `report_dir`.
pub fn report_path(report: &RunReport, report_dir: &str) -> PathBuf {
    let stamp: String = report.local_time.chars().filter(char::is_ascii_digit).collect();
    PathBuf::from(report_dir)
        .join(&report.local_date)
        .join(format!("{}.json", stamp))
}

/// Write a [`RunReport`] to `{report_dir}/{date}/{HHMMSS}.json`.
///
/// Creates the date directory when needed and returns the written path.
#[instrument(level = "info", skip_all, fields(report_dir = %report_dir))]
pub async fn write_report(report: &RunReport, report_dir: &str) -> Result<PathBuf, Box<dyn Error>> {
    let json = serde_json::to_string_pretty(report)?;
    let path = report_path(report, report_dir);

    if let Some(dir) = path.parent() {
        if let Err(e) = fs::create_dir_all(dir).await {
            error!(dir = %dir.display(), error = %e, "Failed to create report dir");
            return Err(e.into());
        }
    }

    fs::write(&path, json).await?;
    info!(path = %path.display(), "Wrote run report");
    Ok(path)
}
