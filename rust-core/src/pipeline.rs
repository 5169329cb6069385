//! Stage runner around the data validator.
//!
//! Each run gets its own directory under the artifact root; stage outputs are
//! laid out beneath it by [`ValidationCfg`].

use std::path::{Path, PathBuf};
use std::time::Instant;

use tracing::{error, info};

use crate::common::config::{AppCfg, ValidationCfg};
use crate::common::error::NetsecResult;
use crate::common::time;
use crate::data::domain::{IngestionArtifact, ValidationArtifact};
use crate::data::repo_fs::load_schema;
use crate::data::service::DataValidator;

pub struct TrainingPipeline {
    cfg: AppCfg,
    run_dir: PathBuf,
}

impl TrainingPipeline {
    /// Pipeline writing into a fresh timestamped run directory.
    pub fn new(cfg: AppCfg) -> Self {
        let run_dir = cfg.run_dir(&time::run_id());
        Self { cfg, run_dir }
    }

    pub fn with_run_dir(cfg: AppCfg, run_dir: impl Into<PathBuf>) -> Self {
        Self {
            cfg,
            run_dir: run_dir.into(),
        }
    }

    pub fn cfg(&self) -> &AppCfg {
        &self.cfg
    }

    pub fn run_dir(&self) -> &Path {
        &self.run_dir
    }

    /// Validate the splits produced by ingestion. Any failure aborts the stage.
    pub fn start_data_validation(
        &self,
        ingestion: &IngestionArtifact,
    ) -> NetsecResult<ValidationArtifact> {
        let start = Instant::now();
        info!(
            train = %ingestion.train_file_path.display(),
            test = %ingestion.test_file_path.display(),
            "initiate data validation"
        );

        let result = load_schema(&self.cfg.schema_path).and_then(|schema| {
            let stage_cfg = ValidationCfg::new(&self.cfg, &self.run_dir);
            DataValidator::new(schema, stage_cfg).initiate(ingestion)
        });

        match &result {
            Ok(artifact) => info!(
                ?artifact,
                dur_ms = time::elapsed_ms(start) as u64,
                "data validation completed"
            ),
            Err(err) => error!(error = %err, code = err.code() as u32, "data validation failed"),
        }
        result
    }
}
