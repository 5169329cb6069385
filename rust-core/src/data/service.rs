//! Data validation stage: structural checks against the schema followed by
//! drift detection between the train and test splits.

use tracing::{info, warn};

use crate::common::config::{ValidationCfg, ValidationPolicy};
use crate::common::error::{NetsecError, NetsecResult};
use crate::evaluation::{repo_fs as report_fs, service as drift};

use super::domain::{
    DataRepo, Dataset, DatasetRole, IngestionArtifact, Schema, SchemaViolation, ValidationArtifact,
};
use super::repo_fs::CsvDataRepo;

/// Validates a train/test pair against a schema and records drift between them.
pub struct DataValidator<R = CsvDataRepo> {
    schema: Schema,
    cfg: ValidationCfg,
    repo: R,
}

impl DataValidator<CsvDataRepo> {
    pub fn new(schema: Schema, cfg: ValidationCfg) -> Self {
        Self::with_repo(schema, cfg, CsvDataRepo::new())
    }
}

impl<R: DataRepo> DataValidator<R> {
    pub fn with_repo(schema: Schema, cfg: ValidationCfg, repo: R) -> Self {
        Self { schema, cfg, repo }
    }

    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    pub fn cfg(&self) -> &ValidationCfg {
        &self.cfg
    }

    /// True iff the dataset has exactly as many columns as the schema declares.
    ///
    /// Only counts are compared, never names: a dataset with the right number
    /// of wrongly named columns passes.
    pub fn validate_column_count(&self, dataset: &Dataset) -> bool {
        let required = self.schema.expected_column_count();
        let found = dataset.column_count();
        info!(required, found, "column count");
        found == required
    }

    /// True iff the number of numeric columns matches the schema's
    /// `numerical_columns` list. By default only integer columns count.
    pub fn validate_numeric_column_count(&self, dataset: &Dataset) -> bool {
        let required = self.schema.expected_numeric_count();
        let found = dataset.numeric_column_count(self.cfg.numeric_rule);
        info!(required, found, rule = ?self.cfg.numeric_rule, "numerical column count");
        found == required
    }

    /// Compare every base column with the current dataset and persist the
    /// report. Returns true iff no column drifted.
    pub fn detect_drift(&self, base: &Dataset, current: &Dataset) -> NetsecResult<bool> {
        let report = drift::compare(base, current, self.cfg.drift_threshold)?;
        report_fs::write_report(&report, &self.cfg.drift_report_file_path)?;
        Ok(report.status())
    }

    /// Read both splits named by the ingestion stage and validate them.
    pub fn initiate(&self, ingestion: &IngestionArtifact) -> NetsecResult<ValidationArtifact> {
        let train = self.repo.read_dataset(&ingestion.train_file_path)?;
        let test = self.repo.read_dataset(&ingestion.test_file_path)?;
        self.validate(&train, &test)
    }

    /// Run every check in order, then copy both splits to the valid location.
    pub fn validate(&self, train: &Dataset, test: &Dataset) -> NetsecResult<ValidationArtifact> {
        let mut violations = Vec::new();

        for (role, dataset) in [(DatasetRole::Train, train), (DatasetRole::Test, test)] {
            if !self.validate_column_count(dataset) {
                self.note_violation(
                    &mut violations,
                    SchemaViolation::ColumnCount {
                        dataset: role,
                        expected: self.schema.expected_column_count(),
                        found: dataset.column_count(),
                    },
                )?;
            }
        }
        for (role, dataset) in [(DatasetRole::Train, train), (DatasetRole::Test, test)] {
            if !self.validate_numeric_column_count(dataset) {
                self.note_violation(
                    &mut violations,
                    SchemaViolation::NumericColumnCount {
                        dataset: role,
                        expected: self.schema.expected_numeric_count(),
                        found: dataset.numeric_column_count(self.cfg.numeric_rule),
                        not_numeric: self.schema.non_numeric_in(dataset, self.cfg.numeric_rule),
                    },
                )?;
            }
        }

        let no_drift = self.detect_drift(train, test)?;

        let validation_status = match self.cfg.policy {
            ValidationPolicy::DriftOnly => no_drift,
            ValidationPolicy::Aggregate | ValidationPolicy::Abort => {
                no_drift && violations.is_empty()
            }
        };

        self.repo.write_dataset(train, &self.cfg.valid_train_file_path)?;
        self.repo.write_dataset(test, &self.cfg.valid_test_file_path)?;

        info!(
            validation_status,
            no_drift,
            violations = violations.len(),
            policy = ?self.cfg.policy,
            "data validation finished"
        );

        Ok(ValidationArtifact {
            validation_status,
            valid_train_file_path: self.cfg.valid_train_file_path.clone(),
            valid_test_file_path: self.cfg.valid_test_file_path.clone(),
            invalid_train_file_path: None,
            invalid_test_file_path: None,
            drift_report_file_path: self.cfg.drift_report_file_path.clone(),
            schema_violations: violations,
        })
    }

    fn note_violation(
        &self,
        violations: &mut Vec<SchemaViolation>,
        violation: SchemaViolation,
    ) -> NetsecResult<()> {
        warn!(%violation, "schema violation");
        if self.cfg.policy == ValidationPolicy::Abort {
            return Err(NetsecError::schema_violation(
                "DataValidator::validate",
                violation.to_string(),
            ));
        }
        violations.push(violation);
        Ok(())
    }
}
