//! Shared utilities that glue the different domains together.
pub mod config;
pub mod error;
pub mod log;
pub mod time;

pub use config::{AppCfg, NumericRule, ReportFormat, ValidationCfg, ValidationPolicy};
pub use error::{ErrorCode, NetsecError, NetsecResult};
