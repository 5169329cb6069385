//! Core dataset definitions and contracts.

use std::collections::{BTreeMap, HashSet};
use std::fmt;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::common::config::NumericRule;
use crate::common::error::{NetsecError, NetsecResult};

/// Inferred storage type of a column.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum ColumnType {
    Int,
    Float,
    Text,
}

impl ColumnType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ColumnType::Int => "int64",
            ColumnType::Float => "float64",
            ColumnType::Text => "object",
        }
    }

    /// Whether this type counts towards the schema's numeric columns.
    pub fn is_numeric_under(&self, rule: NumericRule) -> bool {
        match (self, rule) {
            (ColumnType::Int, _) => true,
            (ColumnType::Float, NumericRule::IntegerOrFloat) => true,
            _ => false,
        }
    }
}

/// Values of one column. Missing cells are NaN in `Float` and empty in `Text`;
/// an `Int` column never has missing cells.
#[derive(Clone, Debug, PartialEq)]
pub enum ColumnValues {
    Int(Vec<i64>),
    Float(Vec<f64>),
    Text(Vec<String>),
}

impl ColumnValues {
    /// Infer the narrowest type that holds every cell.
    ///
    /// Integer when all cells parse as `i64`, float when every non-empty cell
    /// parses as `f64`, text otherwise. Surrounding whitespace is ignored by
    /// the numeric parses only; text cells are kept verbatim.
    pub fn infer(cells: Vec<String>) -> Self {
        if !cells.is_empty() {
            let ints: Option<Vec<i64>> = cells.iter().map(|c| c.trim().parse().ok()).collect();
            if let Some(ints) = ints {
                return ColumnValues::Int(ints);
            }
        }

        let floats: Option<Vec<f64>> = cells
            .iter()
            .map(|c| {
                if c.is_empty() {
                    Some(f64::NAN)
                } else {
                    c.trim().parse().ok()
                }
            })
            .collect();

        match floats {
            Some(floats) => ColumnValues::Float(floats),
            None => ColumnValues::Text(cells),
        }
    }

    pub fn len(&self) -> usize {
        match self {
            ColumnValues::Int(v) => v.len(),
            ColumnValues::Float(v) => v.len(),
            ColumnValues::Text(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn column_type(&self) -> ColumnType {
        match self {
            ColumnValues::Int(_) => ColumnType::Int,
            ColumnValues::Float(_) => ColumnType::Float,
            ColumnValues::Text(_) => ColumnType::Text,
        }
    }

    /// Render one cell back to CSV text.
    pub fn cell(&self, row: usize) -> String {
        match self {
            ColumnValues::Int(v) => v[row].to_string(),
            ColumnValues::Float(v) => format_float(v[row]),
            ColumnValues::Text(v) => v[row].clone(),
        }
    }
}

fn format_float(value: f64) -> String {
    if value.is_nan() {
        String::new()
    } else if value.is_finite() && value.fract() == 0.0 && value.abs() < 1e16 {
        format!("{value:.1}")
    } else {
        value.to_string()
    }
}

/// Named column of a dataset.
#[derive(Clone, Debug, PartialEq)]
pub struct Column {
    pub name: String,
    pub values: ColumnValues,
}

impl Column {
    pub fn new(name: impl Into<String>, values: ColumnValues) -> Self {
        Self {
            name: name.into(),
            values,
        }
    }

    pub fn column_type(&self) -> ColumnType {
        self.values.column_type()
    }
}

/// In-memory table: ordered, uniquely named columns of equal length.
#[derive(Clone, Debug, PartialEq)]
pub struct Dataset {
    columns: Vec<Column>,
    rows: usize,
}

impl Dataset {
    /// Build a dataset, rejecting ragged or duplicate columns.
    pub fn new(columns: Vec<Column>) -> NetsecResult<Self> {
        let rows = columns.first().map(|c| c.values.len()).unwrap_or(0);

        let mut seen = HashSet::with_capacity(columns.len());
        for column in &columns {
            if !seen.insert(column.name.as_str()) {
                return Err(NetsecError::invalid(
                    "Dataset::new",
                    format!("duplicate column `{}`", column.name),
                ));
            }
            if column.values.len() != rows {
                return Err(NetsecError::invalid(
                    "Dataset::new",
                    format!(
                        "column `{}` has {} rows, expected {rows}",
                        column.name,
                        column.values.len()
                    ),
                ));
            }
        }

        Ok(Self { columns, rows })
    }

    /// Build a dataset from headers and raw per-column cells, inferring types.
    pub fn from_cells(headers: Vec<String>, cells: Vec<Vec<String>>) -> NetsecResult<Self> {
        if headers.len() != cells.len() {
            return Err(NetsecError::invalid(
                "Dataset::from_cells",
                format!("{} headers for {} columns", headers.len(), cells.len()),
            ));
        }
        let columns = headers
            .into_iter()
            .zip(cells)
            .map(|(name, cells)| Column::new(name, ColumnValues::infer(cells)))
            .collect();
        Self::new(columns)
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    pub fn row_count(&self) -> usize {
        self.rows
    }

    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.name == name)
    }

    pub fn column_names(&self) -> impl Iterator<Item = &str> {
        self.columns.iter().map(|c| c.name.as_str())
    }

    /// Number of columns whose inferred type is numeric under `rule`.
    pub fn numeric_column_count(&self, rule: NumericRule) -> usize {
        self.columns
            .iter()
            .filter(|c| c.column_type().is_numeric_under(rule))
            .count()
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum ColumnEntry {
    Name(String),
    Typed(BTreeMap<String, String>),
}

#[derive(Deserialize)]
struct SchemaFile {
    columns: Vec<ColumnEntry>,
    #[serde(default)]
    numerical_columns: Vec<String>,
}

/// Expected shape of the train/test tables. Immutable once loaded.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Schema {
    columns: Vec<String>,
    numerical_columns: Vec<String>,
}

impl Schema {
    pub fn new(columns: Vec<String>, numerical_columns: Vec<String>) -> Self {
        Self {
            columns,
            numerical_columns,
        }
    }

    /// Parse a schema document with `columns` and `numerical_columns` lists.
    ///
    /// Column entries are either bare names or single-key `name: dtype` maps;
    /// only the names are kept, column types are inferred from the data.
    pub fn from_yaml_str(raw: &str) -> NetsecResult<Self> {
        let file: SchemaFile =
            serde_yaml::from_str(raw).map_err(|e| NetsecError::yaml("Schema::from_yaml_str", e))?;

        let mut columns = Vec::with_capacity(file.columns.len());
        for entry in file.columns {
            match entry {
                ColumnEntry::Name(name) => columns.push(name),
                ColumnEntry::Typed(map) if map.len() == 1 => columns.extend(map.into_keys()),
                ColumnEntry::Typed(map) => {
                    return Err(NetsecError::config(
                        "Schema::from_yaml_str",
                        format!("column entry must name one column, found {}", map.len()),
                    ));
                }
            }
        }

        Ok(Self::new(columns, file.numerical_columns))
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn numerical_columns(&self) -> &[String] {
        &self.numerical_columns
    }

    pub fn expected_column_count(&self) -> usize {
        self.columns.len()
    }

    pub fn expected_numeric_count(&self) -> usize {
        self.numerical_columns.len()
    }

    /// Declared numerical columns that `dataset` lacks or does not hold as
    /// numeric under `rule`, in schema order.
    pub fn non_numeric_in(&self, dataset: &Dataset, rule: NumericRule) -> Vec<String> {
        self.numerical_columns
            .iter()
            .filter(|name| {
                !matches!(
                    dataset.column(name),
                    Some(column) if column.column_type().is_numeric_under(rule)
                )
            })
            .cloned()
            .collect()
    }
}

/// Output of the upstream ingestion stage: where the split CSVs live.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct IngestionArtifact {
    pub train_file_path: PathBuf,
    pub test_file_path: PathBuf,
}

impl IngestionArtifact {
    pub fn new(train: impl AsRef<Path>, test: impl AsRef<Path>) -> Self {
        Self {
            train_file_path: train.as_ref().to_path_buf(),
            test_file_path: test.as_ref().to_path_buf(),
        }
    }
}

/// Which side of the split a check ran on.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DatasetRole {
    Train,
    Test,
}

impl fmt::Display for DatasetRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DatasetRole::Train => f.write_str("train"),
            DatasetRole::Test => f.write_str("test"),
        }
    }
}

/// A structural check that did not hold.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SchemaViolation {
    ColumnCount {
        dataset: DatasetRole,
        expected: usize,
        found: usize,
    },
    NumericColumnCount {
        dataset: DatasetRole,
        expected: usize,
        found: usize,
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        not_numeric: Vec<String>,
    },
}

impl fmt::Display for SchemaViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SchemaViolation::ColumnCount {
                dataset,
                expected,
                found,
            } => write!(
                f,
                "{dataset} dataset does not contain all columns (expected {expected}, found {found})"
            ),
            SchemaViolation::NumericColumnCount {
                dataset,
                expected,
                found,
                not_numeric,
            } => {
                write!(
                    f,
                    "{dataset} dataset does not contain the same number of numerical columns (expected {expected}, found {found}"
                )?;
                if !not_numeric.is_empty() {
                    write!(f, "; not numeric: {}", not_numeric.join(", "))?;
                }
                f.write_str(")")
            }
        }
    }
}

/// Result record handed to the transformation stage.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ValidationArtifact {
    pub validation_status: bool,
    pub valid_train_file_path: PathBuf,
    pub valid_test_file_path: PathBuf,
    pub invalid_train_file_path: Option<PathBuf>,
    pub invalid_test_file_path: Option<PathBuf>,
    pub drift_report_file_path: PathBuf,
    pub schema_violations: Vec<SchemaViolation>,
}

/// Repository contract for tabular persistence.
pub trait DataRepo {
    fn read_dataset(&self, path: &Path) -> NetsecResult<Dataset>;
    fn write_dataset(&self, dataset: &Dataset, path: &Path) -> NetsecResult<()>;
}
