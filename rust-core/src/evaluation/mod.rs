//! Drift detection: two-sample KS tests and the drift report.

pub mod domain;
pub mod ks;
pub mod repo_fs;
pub mod service;

pub use domain::{ColumnDrift, DriftReport, KsOutcome};
