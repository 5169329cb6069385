//! Data domain: schema, tabular datasets and the validation stage.

pub mod domain;
pub mod repo_fs;
pub mod service;

pub use domain::{
    Column, ColumnType, ColumnValues, Dataset, IngestionArtifact, Schema, SchemaViolation,
    ValidationArtifact,
};
pub use service::DataValidator;
