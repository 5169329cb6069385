//! Run the data validation stage on a train/test split.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;

use netsec_core::common::config::{validate_threshold, ReportFormat, ValidationPolicy};
use netsec_core::common::{log, AppCfg};
use netsec_core::{IngestionArtifact, NetsecError, NetsecResult, TrainingPipeline};

#[derive(Parser)]
#[command(name = "netsec-validate")]
#[command(about = "Validate ingested network security splits against a schema", version)]
struct Cli {
    /// Train split CSV
    #[arg(long)]
    train: PathBuf,

    /// Test split CSV
    #[arg(long)]
    test: PathBuf,

    /// Schema YAML (overrides configuration)
    #[arg(long)]
    schema: Option<PathBuf>,

    /// Root directory for run artifacts
    #[arg(long)]
    artifact_root: Option<PathBuf>,

    /// YAML configuration file layered over NETSEC_* variables
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Drift significance level in (0, 1)
    #[arg(long)]
    threshold: Option<f64>,

    /// Validation policy (aggregate, drift_only, abort)
    #[arg(long)]
    policy: Option<String>,

    /// Drift report encoding (yaml, json)
    #[arg(long)]
    report_format: Option<String>,

    /// Emit logs as JSON lines
    #[arg(long)]
    json_logs: bool,
}

impl Cli {
    fn resolve_cfg(&self) -> NetsecResult<AppCfg> {
        let mut cfg = AppCfg::load_layered(self.config.as_deref())?;
        if let Some(schema) = &self.schema {
            cfg.schema_path = schema.clone();
        }
        if let Some(root) = &self.artifact_root {
            cfg.artifact_root = root.clone();
        }
        if let Some(threshold) = self.threshold {
            validate_threshold(threshold)?;
            cfg.drift_threshold = threshold;
        }
        if let Some(policy) = &self.policy {
            cfg.policy = policy.parse::<ValidationPolicy>()?;
        }
        if let Some(format) = &self.report_format {
            cfg.report_format = format.parse::<ReportFormat>()?;
        }
        if self.json_logs {
            cfg.log_json = true;
        }
        Ok(cfg)
    }
}

fn run(cli: &Cli) -> NetsecResult<()> {
    let cfg = cli.resolve_cfg()?;
    log::init(&cfg);

    let pipeline = TrainingPipeline::new(cfg);
    let artifact = pipeline.start_data_validation(&IngestionArtifact::new(&cli.train, &cli.test))?;

    let out = serde_json::to_string_pretty(&artifact)
        .map_err(|e| NetsecError::json("netsec-validate", e))?;
    println!("{out}");
    Ok(())
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {err}");
            ExitCode::from(u8::try_from(err.code() as u32).unwrap_or(u8::MAX))
        }
    }
}
