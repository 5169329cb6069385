//! Error handling primitives shared across the core.
//!
//! Every failure in the validation stage is a [`NetsecError`]: a stable code,
//! the operation that failed and, when one exists, the underlying cause.

use std::error::Error as StdError;
use std::fmt;
use std::path::Path;

type BoxError = Box<dyn StdError + Send + Sync + 'static>;

/// Stable error codes, also used as the process exit status of the binary.
#[repr(u32)]
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum ErrorCode {
    /// Success code used as a sentinel.
    Ok = 0,
    /// Reading or writing a file failed (CSV, report, copies).
    Io = 1,
    /// Schema or configuration could not be parsed or is out of range.
    Config = 2,
    /// A dataset did not conform to the declared schema.
    SchemaViolation = 3,
    /// A column of the base dataset is absent from the current dataset.
    ColumnMissing = 4,
    /// The drift statistic could not be computed for a column.
    Statistical = 5,
    /// Input failed validation.
    InvalidInput = 6,
    /// Catch-all for bugs.
    Internal = 7,
}

impl ErrorCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCode::Ok => "ok",
            ErrorCode::Io => "io",
            ErrorCode::Config => "config",
            ErrorCode::SchemaViolation => "schema_violation",
            ErrorCode::ColumnMissing => "column_missing",
            ErrorCode::Statistical => "statistical",
            ErrorCode::InvalidInput => "invalid_input",
            ErrorCode::Internal => "internal",
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Canonical error type for the core.
#[derive(Debug, thiserror::Error)]
#[error("{code} error in {context}: {message}")]
pub struct NetsecError {
    code: ErrorCode,
    context: &'static str,
    message: String,
    #[source]
    source: Option<BoxError>,
}

/// Result alias used throughout the crate.
pub type NetsecResult<T> = Result<T, NetsecError>;

impl NetsecError {
    /// Create a new error without an underlying cause.
    pub fn new(code: ErrorCode, context: &'static str, message: impl Into<String>) -> Self {
        Self {
            code,
            context,
            message: message.into(),
            source: None,
        }
    }

    /// Attach the error that caused this one.
    pub fn with_source<E>(mut self, source: E) -> Self
    where
        E: StdError + Send + Sync + 'static,
    {
        self.source = Some(Box::new(source));
        self
    }

    /// Filesystem failure on `path`.
    pub fn io(context: &'static str, path: &Path, err: std::io::Error) -> Self {
        Self::new(ErrorCode::Io, context, path.display().to_string()).with_source(err)
    }

    /// CSV read/write failure on `path`.
    pub fn csv(context: &'static str, path: &Path, err: csv::Error) -> Self {
        Self::new(ErrorCode::Io, context, path.display().to_string()).with_source(err)
    }

    /// YAML document that could not be parsed or produced.
    pub fn yaml(context: &'static str, err: serde_yaml::Error) -> Self {
        Self::new(ErrorCode::Config, context, "malformed yaml").with_source(err)
    }

    /// JSON document that could not be produced.
    pub fn json(context: &'static str, err: serde_json::Error) -> Self {
        Self::new(ErrorCode::Internal, context, "json serialisation failed").with_source(err)
    }

    /// Configuration helper.
    pub fn config(context: &'static str, message: impl Into<String>) -> Self {
        Self::new(ErrorCode::Config, context, message)
    }

    /// Schema conformance helper.
    pub fn schema_violation(context: &'static str, message: impl Into<String>) -> Self {
        Self::new(ErrorCode::SchemaViolation, context, message)
    }

    /// Lookup helper for a column that the current dataset lacks.
    pub fn column_missing(context: &'static str, column: &str) -> Self {
        Self::new(
            ErrorCode::ColumnMissing,
            context,
            format!("column `{column}` not present in current dataset"),
        )
    }

    /// Statistical computation helper.
    pub fn statistical(context: &'static str, message: impl Into<String>) -> Self {
        Self::new(ErrorCode::Statistical, context, message)
    }

    /// Validation helper.
    pub fn invalid(context: &'static str, message: impl Into<String>) -> Self {
        Self::new(ErrorCode::InvalidInput, context, message)
    }

    pub fn code(&self) -> ErrorCode {
        self.code
    }

    /// The operation that was running when the error was raised.
    pub fn context(&self) -> &'static str {
        self.context
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error;
    use std::io;

    #[test]
    fn codes_are_stable() {
        assert_eq!(ErrorCode::Ok as u32, 0);
        assert_eq!(ErrorCode::Io as u32, 1);
        assert_eq!(ErrorCode::Config as u32, 2);
        assert_eq!(ErrorCode::SchemaViolation as u32, 3);
        assert_eq!(ErrorCode::ColumnMissing as u32, 4);
        assert_eq!(ErrorCode::Statistical as u32, 5);
        assert_eq!(ErrorCode::InvalidInput as u32, 6);
        assert_eq!(ErrorCode::Internal as u32, 7);
    }

    #[test]
    fn display_names_code_and_context() {
        let err = NetsecError::column_missing("detect_drift", "age");
        let text = err.to_string();
        assert!(text.contains("column_missing"));
        assert!(text.contains("detect_drift"));
        assert!(text.contains("`age`"));
    }

    #[test]
    fn io_error_keeps_its_cause() {
        let cause = io::Error::new(io::ErrorKind::NotFound, "gone");
        let err = NetsecError::io("read_csv", Path::new("train.csv"), cause);
        assert_eq!(err.code(), ErrorCode::Io);
        assert_eq!(err.context(), "read_csv");
        assert_eq!(err.message(), "train.csv");
        let source = err.source().expect("cause is chained");
        assert_eq!(source.to_string(), "gone");
    }

    #[test]
    fn helpers_without_cause_have_no_source() {
        let err = NetsecError::statistical("ks_2samp", "empty sample");
        assert!(err.source().is_none());
        assert_eq!(err.code(), ErrorCode::Statistical);
    }
}
