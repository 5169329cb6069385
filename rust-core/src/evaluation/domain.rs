//! Domain primitives for drift tracking.

use std::fmt;

use serde::de::{MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Which distribution produced a KS p-value.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum KsMethod {
    /// Exact two-sample distribution by lattice path counting.
    Exact,
    /// Asymptotic Kolmogorov distribution.
    Asymptotic,
}

/// Result of one two-sample Kolmogorov–Smirnov test.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct KsOutcome {
    /// Largest absolute gap between the two empirical CDFs.
    pub statistic: f64,
    pub p_value: f64,
    pub method: KsMethod,
}

/// Drift verdict for one column.
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ColumnDrift {
    pub p_value: f64,
    pub drift_status: bool,
}

impl ColumnDrift {
    /// A column drifts when its p-value falls below `threshold`.
    pub fn decide(p_value: f64, threshold: f64) -> Self {
        Self {
            p_value,
            drift_status: p_value.is_nan() || p_value < threshold,
        }
    }
}

/// Per-column drift verdicts, in the column order of the base dataset.
///
/// Serialises as a map `column -> {p_value, drift_status}` keeping that order.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct DriftReport {
    entries: Vec<(String, ColumnDrift)>,
}

impl DriftReport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the verdict for `column`, replacing an earlier one in place.
    pub fn record(&mut self, column: impl Into<String>, drift: ColumnDrift) {
        let column = column.into();
        match self.entries.iter_mut().find(|(name, _)| *name == column) {
            Some((_, slot)) => *slot = drift,
            None => self.entries.push((column, drift)),
        }
    }

    pub fn get(&self, column: &str) -> Option<&ColumnDrift> {
        self.entries
            .iter()
            .find(|(name, _)| name == column)
            .map(|(_, drift)| drift)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &ColumnDrift)> {
        self.entries.iter().map(|(name, drift)| (name.as_str(), drift))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// True iff no column drifted.
    pub fn status(&self) -> bool {
        self.entries.iter().all(|(_, drift)| !drift.drift_status)
    }

    pub fn drifted_columns(&self) -> impl Iterator<Item = &str> {
        self.entries
            .iter()
            .filter(|(_, drift)| drift.drift_status)
            .map(|(name, _)| name.as_str())
    }
}

impl Serialize for DriftReport {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (name, drift) in &self.entries {
            map.serialize_entry(name, drift)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for DriftReport {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct ReportVisitor;

        impl<'de> Visitor<'de> for ReportVisitor {
            type Value = DriftReport;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a map of column name to {p_value, drift_status}")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Self::Value, A::Error> {
                let mut report = DriftReport::new();
                while let Some((name, drift)) = access.next_entry::<String, ColumnDrift>()? {
                    report.record(name, drift);
                }
                Ok(report)
            }
        }

        deserializer.deserialize_map(ReportVisitor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decision_rule_uses_threshold_inclusively() {
        assert!(!ColumnDrift::decide(0.05, 0.05).drift_status);
        assert!(!ColumnDrift::decide(1.0, 0.05).drift_status);
        assert!(ColumnDrift::decide(0.049, 0.05).drift_status);
        assert!(ColumnDrift::decide(f64::NAN, 0.05).drift_status);
    }

    #[test]
    fn report_keeps_insertion_order() {
        let mut report = DriftReport::new();
        report.record("z", ColumnDrift::decide(0.9, 0.05));
        report.record("a", ColumnDrift::decide(0.01, 0.05));
        let names: Vec<&str> = report.iter().map(|(n, _)| n).collect();
        assert_eq!(names, ["z", "a"]);
        assert!(!report.status());
        assert_eq!(report.drifted_columns().collect::<Vec<_>>(), ["a"]);
    }

    #[test]
    fn recording_twice_replaces_the_entry() {
        let mut report = DriftReport::new();
        report.record("x", ColumnDrift::decide(0.01, 0.05));
        report.record("x", ColumnDrift::decide(0.5, 0.05));
        assert_eq!(report.len(), 1);
        assert!(report.status());
    }

    #[test]
    fn empty_report_has_no_drift() {
        assert!(DriftReport::new().status());
    }

    #[test]
    fn yaml_shape_is_a_column_map() {
        let mut report = DriftReport::new();
        report.record("y", ColumnDrift::decide(1.0, 0.05));
        report.record("x", ColumnDrift::decide(0.0, 0.05));

        let text = serde_yaml::to_string(&report).unwrap();
        assert!(text.find("y:").unwrap() < text.find("x:").unwrap());

        let back: DriftReport = serde_yaml::from_str(&text).unwrap();
        assert_eq!(back, report);
    }
}
