//! Filesystem persistence for drift reports.

use std::fs;
use std::path::Path;

use tracing::info;

pub use crate::common::config::ReportFormat;
use crate::common::error::{NetsecError, NetsecResult};
use crate::data::repo_fs::ensure_parent;

use super::domain::DriftReport;

/// Write `report` to `path`, creating parent directories. The encoding
/// follows the file extension.
pub fn write_report(report: &DriftReport, path: &Path) -> NetsecResult<()> {
    const CTX: &str = "write_report";

    let body = match ReportFormat::from_path(path) {
        ReportFormat::Yaml => serde_yaml::to_string(report).map_err(|e| NetsecError::yaml(CTX, e))?,
        ReportFormat::Json => {
            serde_json::to_string_pretty(report).map_err(|e| NetsecError::json(CTX, e))?
        }
    };

    ensure_parent(CTX, path)?;
    fs::write(path, body).map_err(|e| NetsecError::io(CTX, path, e))?;
    info!(path = %path.display(), columns = report.len(), "drift report written");
    Ok(())
}

/// Load a report written by [`write_report`].
pub fn read_report(path: &Path) -> NetsecResult<DriftReport> {
    const CTX: &str = "read_report";

    let raw = fs::read_to_string(path).map_err(|e| NetsecError::io(CTX, path, e))?;
    match ReportFormat::from_path(path) {
        ReportFormat::Yaml => serde_yaml::from_str(&raw).map_err(|e| NetsecError::yaml(CTX, e)),
        ReportFormat::Json => serde_json::from_str(&raw).map_err(|e| {
            NetsecError::config(CTX, "malformed json drift report").with_source(e)
        }),
    }
}
