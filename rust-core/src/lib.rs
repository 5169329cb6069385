// lib.rs - data validation stage of the training pipeline
pub mod common;
pub mod data;
pub mod evaluation;
pub mod pipeline;

pub use common::{AppCfg, NetsecError, NetsecResult};
pub use data::{DataValidator, IngestionArtifact, ValidationArtifact};
pub use pipeline::TrainingPipeline;
