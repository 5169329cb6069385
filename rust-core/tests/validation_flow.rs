use std::fs;
use std::path::{Path, PathBuf};

use netsec_core::common::config::{ReportFormat, ValidationPolicy};
use netsec_core::common::ErrorCode;
use netsec_core::data::SchemaViolation;
use netsec_core::evaluation::repo_fs::read_report;
use netsec_core::{AppCfg, IngestionArtifact, TrainingPipeline};
use tempfile::{tempdir, TempDir};

const SCHEMA: &str = "\
columns:
  - age: int64
  - hops: int64
  - proto: object
numerical_columns:
  - age
  - hops
";

fn write(dir: &Path, name: &str, body: &str) -> PathBuf {
    let path = dir.join(name);
    fs::write(&path, body).unwrap();
    path
}

fn rows(ages: impl Iterator<Item = i64>) -> String {
    let mut out = String::from("age,hops,proto\n");
    for (i, age) in ages.enumerate() {
        let proto = if i % 2 == 0 { "tcp" } else { "udp" };
        out.push_str(&format!("{age},{},{proto}\n", i % 4));
    }
    out
}

struct Stage {
    dir: TempDir,
    pipeline: TrainingPipeline,
}

fn stage(policy: ValidationPolicy) -> Stage {
    let dir = tempdir().unwrap();
    let schema_path = write(dir.path(), "schema.yaml", SCHEMA);
    let cfg = AppCfg {
        artifact_root: dir.path().join("Artifacts"),
        schema_path,
        policy,
        ..AppCfg::default()
    };
    let run_dir = cfg.run_dir("run-test");
    Stage {
        pipeline: TrainingPipeline::with_run_dir(cfg, run_dir),
        dir,
    }
}

#[test]
fn matching_splits_validate_and_are_copied() {
    let s = stage(ValidationPolicy::Aggregate);
    let train = write(s.dir.path(), "train.csv", &rows(20..30));
    let test = write(s.dir.path(), "test.csv", &rows(20..30));

    let artifact = s
        .pipeline
        .start_data_validation(&IngestionArtifact::new(&train, &test))
        .unwrap();

    assert!(artifact.validation_status);
    assert!(artifact.schema_violations.is_empty());
    assert_eq!(artifact.invalid_train_file_path, None);
    assert_eq!(artifact.invalid_test_file_path, None);
    let copied = fs::read_to_string(&artifact.valid_train_file_path).unwrap();
    let source = fs::read_to_string(&train).unwrap();
    assert!(copied.lines().eq(source.lines()));

    let report = read_report(&artifact.drift_report_file_path).unwrap();
    let keys: Vec<&str> = report.iter().map(|(name, _)| name).collect();
    assert_eq!(keys, ["age", "hops", "proto"]);
    for (_, drift) in report.iter() {
        assert_eq!(drift.p_value, 1.0);
        assert!(!drift.drift_status);
    }

    let raw = fs::read_to_string(&artifact.drift_report_file_path).unwrap();
    assert!(raw.contains("p_value"));
    assert!(raw.contains("drift_status"));
}

#[test]
fn shifted_age_is_reported_as_drift() {
    let s = stage(ValidationPolicy::Aggregate);
    let train = write(s.dir.path(), "train.csv", &rows(20..30));
    let test = write(s.dir.path(), "test.csv", &rows(120..130));

    let artifact = s
        .pipeline
        .start_data_validation(&IngestionArtifact::new(&train, &test))
        .unwrap();

    assert!(!artifact.validation_status);
    let report = read_report(&artifact.drift_report_file_path).unwrap();
    let age = report.get("age").unwrap();
    assert!(age.drift_status);
    assert!(age.p_value < 1e-4);
    assert!(!report.get("hops").unwrap().drift_status);
    assert_eq!(report.drifted_columns().collect::<Vec<_>>(), ["age"]);
}

#[test]
fn missing_column_fails_the_check_and_the_drift_lookup() {
    let s = stage(ValidationPolicy::Aggregate);
    let train = write(s.dir.path(), "train.csv", &rows(20..30));
    let test = write(s.dir.path(), "test.csv", "age,hops\n20,1\n21,2\n22,3\n");

    let err = s
        .pipeline
        .start_data_validation(&IngestionArtifact::new(&train, &test))
        .unwrap_err();
    assert_eq!(err.code(), ErrorCode::ColumnMissing);
    assert!(err.to_string().contains("proto"));
}

#[test]
fn drift_only_policy_keeps_structural_leniency() {
    let s = stage(ValidationPolicy::DriftOnly);
    // Float `hops` is not counted as numeric under the default rule.
    let body = "age,hops,proto\n20,0.5,tcp\n21,1.5,udp\n22,2.5,tcp\n";
    let train = write(s.dir.path(), "train.csv", body);
    let test = write(s.dir.path(), "test.csv", body);

    let artifact = s
        .pipeline
        .start_data_validation(&IngestionArtifact::new(&train, &test))
        .unwrap();

    assert!(artifact.validation_status);
    assert_eq!(artifact.schema_violations.len(), 2);
    for violation in &artifact.schema_violations {
        match violation {
            SchemaViolation::NumericColumnCount {
                expected,
                found,
                not_numeric,
                ..
            } => {
                assert_eq!((*expected, *found), (2, 1));
                assert_eq!(not_numeric, &["hops".to_string()]);
            }
            other => panic!("unexpected violation {other:?}"),
        }
    }
}

#[test]
fn abort_policy_stops_at_the_first_violation() {
    let s = stage(ValidationPolicy::Abort);
    let train = write(s.dir.path(), "train.csv", "age,hops\n20,1\n");
    let test = write(s.dir.path(), "test.csv", &rows(20..30));

    let err = s
        .pipeline
        .start_data_validation(&IngestionArtifact::new(&train, &test))
        .unwrap_err();
    assert_eq!(err.code(), ErrorCode::SchemaViolation);
    assert!(err.to_string().contains("train dataset does not contain all columns"));
    assert!(!s.pipeline.run_dir().join("data_validation").exists());
}

#[test]
fn unreadable_split_is_an_io_error() {
    let s = stage(ValidationPolicy::Aggregate);
    let train = write(s.dir.path(), "train.csv", &rows(20..30));
    let missing = s.dir.path().join("nope.csv");

    let err = s
        .pipeline
        .start_data_validation(&IngestionArtifact::new(&train, &missing))
        .unwrap_err();
    assert_eq!(err.code(), ErrorCode::Io);
}

#[test]
fn json_report_format_is_honoured() {
    let dir = tempdir().unwrap();
    let cfg = AppCfg {
        schema_path: write(dir.path(), "schema.yaml", SCHEMA),
        report_format: ReportFormat::Json,
        ..AppCfg::default()
    };
    let pipeline = TrainingPipeline::with_run_dir(cfg, dir.path().join("run"));
    let train = write(dir.path(), "train.csv", &rows(20..30));

    let artifact = pipeline
        .start_data_validation(&IngestionArtifact::new(&train, &train))
        .unwrap();

    assert_eq!(artifact.drift_report_file_path.extension().unwrap(), "json");
    let value: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(&artifact.drift_report_file_path).unwrap())
            .unwrap();
    assert_eq!(value["age"]["drift_status"], serde_json::Value::Bool(false));
}
