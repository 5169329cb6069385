//! Drift detection between a base and a current dataset.

use tracing::{debug, warn};

use crate::common::error::{NetsecError, NetsecResult};
use crate::data::domain::{Column, ColumnValues, Dataset};

use super::domain::{ColumnDrift, DriftReport, KsOutcome};
use super::ks;

/// Run a two-sample KS test between two versions of the same column.
///
/// Missing cells (NaN, empty text) are left out of both samples, so a column
/// with gaps gets a finite p-value. A NaN-propagating test would instead
/// yield a NaN p-value and flag every such column as drifted. Integer and
/// float columns compare numerically; text compares lexicographically.
pub fn column_ks(base: &Column, current: &Column) -> NetsecResult<KsOutcome> {
    match (numeric_sample(&base.values), numeric_sample(&current.values)) {
        (Some(a), Some(b)) => ks::ks_2samp(&a, &b),
        (None, None) => {
            ks::ks_2samp_ordered(&text_sample(&base.values), &text_sample(&current.values))
        }
        _ => Err(NetsecError::statistical(
            "column_ks",
            format!(
                "column `{}` is {} in base but {} in current",
                base.name,
                base.column_type().as_str(),
                current.column_type().as_str()
            ),
        )),
    }
}

fn numeric_sample(values: &ColumnValues) -> Option<Vec<f64>> {
    match values {
        ColumnValues::Int(v) => Some(v.iter().map(|&x| x as f64).collect()),
        ColumnValues::Float(v) => Some(v.iter().copied().filter(|x| !x.is_nan()).collect()),
        ColumnValues::Text(_) => None,
    }
}

fn text_sample(values: &ColumnValues) -> Vec<&str> {
    match values {
        ColumnValues::Text(v) => v.iter().map(String::as_str).filter(|s| !s.is_empty()).collect(),
        _ => Vec::new(),
    }
}

/// Compare every column of `base` with the same column of `current`.
///
/// Columns are visited in base order; a base column that `current` lacks is
/// an error. Columns only present in `current` are ignored.
pub fn compare(base: &Dataset, current: &Dataset, threshold: f64) -> NetsecResult<DriftReport> {
    let mut report = DriftReport::new();

    for column in base.columns() {
        let other = current
            .column(&column.name)
            .ok_or_else(|| NetsecError::column_missing("detect_drift", &column.name))?;

        let outcome = column_ks(column, other)?;
        let drift = ColumnDrift::decide(outcome.p_value, threshold);
        debug!(
            column = %column.name,
            statistic = outcome.statistic,
            p_value = outcome.p_value,
            method = ?outcome.method,
            "ks test"
        );
        if drift.drift_status {
            warn!(column = %column.name, p_value = outcome.p_value, threshold, "drift detected");
        }

        report.record(column.name.clone(), drift);
    }

    Ok(report)
}
