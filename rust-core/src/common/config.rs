//! Runtime configuration loaded from environment and an optional YAML file.
//!
//! Values resolve in three layers: built-in defaults, `NETSEC_*` environment
//! variables, then the YAML file when one is given.

use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::common::error::{NetsecError, NetsecResult};

pub const DEFAULT_ARTIFACT_ROOT: &str = "Artifacts";
pub const DEFAULT_SCHEMA_PATH: &str = "data_schema/schema.yaml";
pub const DEFAULT_DRIFT_THRESHOLD: f64 = 0.05;

pub const TRAIN_FILE_NAME: &str = "train.csv";
pub const TEST_FILE_NAME: &str = "test.csv";
pub const DATA_VALIDATION_DIR_NAME: &str = "data_validation";
pub const DATA_VALIDATION_VALID_DIR: &str = "validated";
pub const DATA_VALIDATION_DRIFT_REPORT_DIR: &str = "drift_report";
pub const DATA_VALIDATION_DRIFT_REPORT_FILE_STEM: &str = "report";

/// How failing structural checks feed into the validation outcome.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValidationPolicy {
    /// Any failing check or drifted column makes the stage invalid.
    #[default]
    Aggregate,
    /// Only drift decides the status; structural violations are reported but lenient.
    DriftOnly,
    /// The first structural violation aborts the stage with an error.
    Abort,
}

impl FromStr for ValidationPolicy {
    type Err = NetsecError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "aggregate" => Ok(Self::Aggregate),
            "drift_only" | "drift-only" => Ok(Self::DriftOnly),
            "abort" => Ok(Self::Abort),
            other => Err(NetsecError::config(
                "ValidationPolicy::from_str",
                format!("unknown validation policy `{other}`"),
            )),
        }
    }
}

/// Which inferred column types count as numeric for the schema check.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NumericRule {
    /// Only 64-bit integer columns count.
    #[default]
    IntegerOnly,
    /// Integer and floating point columns count.
    IntegerOrFloat,
}

impl FromStr for NumericRule {
    type Err = NetsecError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "integer_only" | "integer-only" => Ok(Self::IntegerOnly),
            "integer_or_float" | "integer-or-float" => Ok(Self::IntegerOrFloat),
            other => Err(NetsecError::config(
                "NumericRule::from_str",
                format!("unknown numeric rule `{other}`"),
            )),
        }
    }
}

/// On-disk encoding of the drift report.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReportFormat {
    #[default]
    Yaml,
    Json,
}

impl ReportFormat {
    /// `.json` selects JSON; anything else is YAML.
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|ext| ext.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("json") => ReportFormat::Json,
            _ => ReportFormat::Yaml,
        }
    }

    pub fn extension(&self) -> &'static str {
        match self {
            ReportFormat::Yaml => "yaml",
            ReportFormat::Json => "json",
        }
    }
}

impl FromStr for ReportFormat {
    type Err = NetsecError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "yaml" | "yml" => Ok(Self::Yaml),
            "json" => Ok(Self::Json),
            other => Err(NetsecError::config(
                "ReportFormat::from_str",
                format!("unknown report format `{other}`"),
            )),
        }
    }
}

/// Snapshot of configuration values consumed by the core.
#[derive(Clone, Debug, PartialEq)]
pub struct AppCfg {
    pub artifact_root: PathBuf,
    pub schema_path: PathBuf,
    pub log_level: String,
    pub log_json: bool,
    pub drift_threshold: f64,
    pub policy: ValidationPolicy,
    pub numeric_rule: NumericRule,
    pub report_format: ReportFormat,
}

impl Default for AppCfg {
    fn default() -> Self {
        Self {
            artifact_root: PathBuf::from(DEFAULT_ARTIFACT_ROOT),
            schema_path: PathBuf::from(DEFAULT_SCHEMA_PATH),
            log_level: "info".to_string(),
            log_json: false,
            drift_threshold: DEFAULT_DRIFT_THRESHOLD,
            policy: ValidationPolicy::default(),
            numeric_rule: NumericRule::default(),
            report_format: ReportFormat::default(),
        }
    }
}

/// Keys accepted in the YAML overlay file. Absent keys keep the lower layer.
#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct CfgFile {
    artifact_root: Option<PathBuf>,
    schema_path: Option<PathBuf>,
    log_level: Option<String>,
    log_json: Option<bool>,
    drift_threshold: Option<f64>,
    policy: Option<ValidationPolicy>,
    numeric_rule: Option<NumericRule>,
    report_format: Option<ReportFormat>,
}

impl AppCfg {
    /// Create a configuration snapshot from the process environment.
    pub fn load() -> NetsecResult<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Environment layer, optionally overlaid by a YAML file.
    pub fn load_layered(file: Option<&Path>) -> NetsecResult<Self> {
        let cfg = Self::load()?;
        match file {
            Some(path) => cfg.overlay_file(path),
            None => Ok(cfg),
        }
    }

    /// Build a snapshot from an arbitrary key lookup (the environment in production).
    pub fn from_lookup<F>(lookup: F) -> NetsecResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut cfg = Self::default();

        if let Some(root) = lookup("NETSEC_ARTIFACT_ROOT") {
            cfg.artifact_root = PathBuf::from(root);
        }
        if let Some(schema) = lookup("NETSEC_SCHEMA_PATH") {
            cfg.schema_path = PathBuf::from(schema);
        }
        if let Some(level) = lookup("NETSEC_LOG_LEVEL") {
            cfg.log_level = level;
        }
        if let Some(json) = lookup("NETSEC_LOG_JSON") {
            cfg.log_json = matches!(json.trim(), "1" | "true" | "yes");
        }
        if let Some(raw) = lookup("NETSEC_DRIFT_THRESHOLD") {
            cfg.drift_threshold = raw.trim().parse().map_err(|_| {
                NetsecError::config(
                    "AppCfg::from_lookup",
                    format!("NETSEC_DRIFT_THRESHOLD is not a number: `{raw}`"),
                )
            })?;
        }
        if let Some(policy) = lookup("NETSEC_VALIDATION_POLICY") {
            cfg.policy = policy.parse()?;
        }
        if let Some(rule) = lookup("NETSEC_NUMERIC_RULE") {
            cfg.numeric_rule = rule.parse()?;
        }
        if let Some(format) = lookup("NETSEC_REPORT_FORMAT") {
            cfg.report_format = format.parse()?;
        }

        cfg.validate()?;
        Ok(cfg)
    }

    /// Apply values from a YAML file on top of this snapshot.
    pub fn overlay_file(mut self, path: &Path) -> NetsecResult<Self> {
        let raw =
            fs::read_to_string(path).map_err(|e| NetsecError::io("AppCfg::overlay_file", path, e))?;
        let file: CfgFile =
            serde_yaml::from_str(&raw).map_err(|e| NetsecError::yaml("AppCfg::overlay_file", e))?;

        if let Some(root) = file.artifact_root {
            self.artifact_root = root;
        }
        if let Some(schema) = file.schema_path {
            self.schema_path = schema;
        }
        if let Some(level) = file.log_level {
            self.log_level = level;
        }
        if let Some(json) = file.log_json {
            self.log_json = json;
        }
        if let Some(threshold) = file.drift_threshold {
            self.drift_threshold = threshold;
        }
        if let Some(policy) = file.policy {
            self.policy = policy;
        }
        if let Some(rule) = file.numeric_rule {
            self.numeric_rule = rule;
        }
        if let Some(format) = file.report_format {
            self.report_format = format;
        }

        self.validate()?;
        Ok(self)
    }

    /// Reject values the validation stage cannot work with.
    pub fn validate(&self) -> NetsecResult<()> {
        validate_threshold(self.drift_threshold)
    }

    /// Directory holding every artefact of one pipeline run.
    pub fn run_dir(&self, run_id: &str) -> PathBuf {
        self.artifact_root.join(run_id)
    }
}

/// The drift threshold is a significance level and must lie strictly in (0, 1).
pub fn validate_threshold(threshold: f64) -> NetsecResult<()> {
    if threshold.is_finite() && threshold > 0.0 && threshold < 1.0 {
        Ok(())
    } else {
        Err(NetsecError::config(
            "validate_threshold",
            format!("drift threshold must be in (0, 1), got {threshold}"),
        ))
    }
}

/// Paths and knobs for a single data validation stage.
#[derive(Clone, Debug, PartialEq)]
pub struct ValidationCfg {
    pub validation_dir: PathBuf,
    pub valid_train_file_path: PathBuf,
    pub valid_test_file_path: PathBuf,
    pub drift_report_file_path: PathBuf,
    pub drift_threshold: f64,
    pub policy: ValidationPolicy,
    pub numeric_rule: NumericRule,
}

impl ValidationCfg {
    /// Lay out the stage directories under `run_dir`.
    pub fn new(cfg: &AppCfg, run_dir: &Path) -> Self {
        let validation_dir = run_dir.join(DATA_VALIDATION_DIR_NAME);
        let valid_dir = validation_dir.join(DATA_VALIDATION_VALID_DIR);

        Self {
            valid_train_file_path: valid_dir.join(TRAIN_FILE_NAME),
            valid_test_file_path: valid_dir.join(TEST_FILE_NAME),
            drift_report_file_path: validation_dir
                .join(DATA_VALIDATION_DRIFT_REPORT_DIR)
                .join(DATA_VALIDATION_DRIFT_REPORT_FILE_STEM)
                .with_extension(cfg.report_format.extension()),
            validation_dir,
            drift_threshold: cfg.drift_threshold,
            policy: cfg.policy,
            numeric_rule: cfg.numeric_rule,
        }
    }
}
