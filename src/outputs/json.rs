//! JSON output of the selection report.
//!
//! Reports are grouped by the UTC date of the run. A second run on the same
//! day overwrites the first, so the directory always holds the queue that
//! is currently under review.

use crate::models::SelectionReport;
use std::error::Error;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{error, info, instrument};

/// Write `report` to `{report_dir}/{YYYY-MM-DD}/selection.json`.
///
/// Returns the path written.
#[instrument(level = "info", skip_all, fields(report_dir = %report_dir.display()))]
pub async fn write_report(
    report: &SelectionReport,
    report_dir: &Path,
) -> Result<PathBuf, Box<dyn Error>> {
    let json = serde_json::to_string_pretty(report)?;

    let date_dir = report_dir.join(report.timestamp.date_naive().to_string());
    info!(dir = %date_dir.display(), "Ensuring report directory exists");
    if let Err(e) = fs::create_dir_all(&date_dir).await {
        error!(dir = %date_dir.display(), error = %e, "Failed to create report dir");
        return Err(e.into());
    }

    let path = date_dir.join("selection.json");
    fs::write(&path, json).await?;
    info!(path = %path.display(), "Wrote selection report");

    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Category;
    use chrono::{TimeZone, Utc};
    use std::collections::BTreeMap;

    fn report() -> SelectionReport {
        SelectionReport {
            reset_count: 3,
            eligible_count: 12,
            admitted_count: 8,
            selected_count: 2,
            updated_count: 2,
            selected_ids: vec![7, 4],
            category_counts: BTreeMap::from([(Category::Tech, 1), (Category::Macro, 1)]),
            source_counts: BTreeMap::from([("36kr".to_string(), 2)]),
            rejected: BTreeMap::from([("brief_news".to_string(), 4)]),
            timestamp: Utc.with_ymd_and_hms(2025, 5, 6, 23, 30, 0).unwrap(),
            dry_run: false,
        }
    }

    #[tokio::test]
    async fn test_write_report_layout() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_report(&report(), dir.path()).await.unwrap();
        assert_eq!(path, dir.path().join("2025-05-06").join("selection.json"));

        let written: SelectionReport =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(written, report());
    }

    #[tokio::test]
    async fn test_same_day_run_overwrites() {
        let dir = tempfile::tempdir().unwrap();
        write_report(&report(), dir.path()).await.unwrap();

        let mut second = report();
        second.selected_ids = vec![9];
        let path = write_report(&second, dir.path()).await.unwrap();

        let written: SelectionReport =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(written.selected_ids, vec![9]);
    }
}
