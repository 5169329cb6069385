//! Filesystem-backed CSV tables and schema files.

use std::fs;
use std::path::Path;

use csv::{ReaderBuilder, WriterBuilder};
use tracing::debug;

use crate::common::error::{NetsecError, NetsecResult};

use super::domain::{DataRepo, Dataset, Schema};

/// Reads and writes datasets as comma separated files with a header row.
#[derive(Clone, Debug, Default)]
pub struct CsvDataRepo;

impl CsvDataRepo {
    pub fn new() -> Self {
        Self
    }
}

impl DataRepo for CsvDataRepo {
    fn read_dataset(&self, path: &Path) -> NetsecResult<Dataset> {
        const CTX: &str = "CsvDataRepo::read_dataset";

        let mut reader = ReaderBuilder::new()
            .has_headers(true)
            .from_path(path)
            .map_err(|e| NetsecError::csv(CTX, path, e))?;

        let headers: Vec<String> = reader
            .headers()
            .map_err(|e| NetsecError::csv(CTX, path, e))?
            .iter()
            .map(str::to_string)
            .collect();
        if headers.is_empty() {
            return Err(NetsecError::invalid(
                CTX,
                format!("{}: no columns to parse", path.display()),
            ));
        }

        let mut cells: Vec<Vec<String>> = vec![Vec::new(); headers.len()];
        for record in reader.records() {
            let record = record.map_err(|e| NetsecError::csv(CTX, path, e))?;
            for (column, cell) in cells.iter_mut().zip(record.iter()) {
                column.push(cell.to_string());
            }
        }

        let dataset = Dataset::from_cells(headers, cells)?;
        debug!(
            path = %path.display(),
            rows = dataset.row_count(),
            columns = dataset.column_count(),
            "dataset loaded"
        );
        Ok(dataset)
    }

    fn write_dataset(&self, dataset: &Dataset, path: &Path) -> NetsecResult<()> {
        const CTX: &str = "CsvDataRepo::write_dataset";

        ensure_parent(CTX, path)?;
        let mut writer = WriterBuilder::new()
            .has_headers(true)
            .from_path(path)
            .map_err(|e| NetsecError::csv(CTX, path, e))?;

        writer
            .write_record(dataset.column_names())
            .map_err(|e| NetsecError::csv(CTX, path, e))?;
        for row in 0..dataset.row_count() {
            writer
                .write_record(dataset.columns().iter().map(|c| c.values.cell(row)))
                .map_err(|e| NetsecError::csv(CTX, path, e))?;
        }
        writer
            .flush()
            .map_err(|e| NetsecError::io(CTX, path, e))?;

        debug!(path = %path.display(), rows = dataset.row_count(), "dataset written");
        Ok(())
    }
}

/// Load the schema file that describes the expected train/test shape.
pub fn load_schema(path: &Path) -> NetsecResult<Schema> {
    let raw = fs::read_to_string(path).map_err(|e| NetsecError::io("load_schema", path, e))?;
    Schema::from_yaml_str(&raw)
}

/// Create the parent directory of `path` if it has one.
pub(crate) fn ensure_parent(context: &'static str, path: &Path) -> NetsecResult<()> {
    match path.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => {
            fs::create_dir_all(dir).map_err(|e| NetsecError::io(context, dir, e))
        }
        _ => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::error::ErrorCode;
    use crate::data::domain::{ColumnType, ColumnValues};
    use tempfile::tempdir;

    #[test]
    fn reads_typed_columns() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("train.csv");
        fs::write(&path, "age,score,label\n20,1.5,a\n21, 2.0 ,b\n").unwrap();

        let ds = CsvDataRepo::new().read_dataset(&path).unwrap();
        assert_eq!(ds.row_count(), 2);
        assert_eq!(ds.column_names().collect::<Vec<_>>(), ["age", "score", "label"]);
        assert_eq!(ds.column("age").unwrap().values, ColumnValues::Int(vec![20, 21]));
        assert_eq!(ds.column("score").unwrap().column_type(), ColumnType::Float);
        assert_eq!(ds.column("label").unwrap().column_type(), ColumnType::Text);
    }

    #[test]
    fn text_cells_and_headers_are_kept_verbatim() {
        let dir = tempdir().unwrap();
        let src = dir.path().join("in.csv");
        fs::write(&src, "age, label \n20, tcp\n21,  \n").unwrap();

        let repo = CsvDataRepo::new();
        let ds = repo.read_dataset(&src).unwrap();
        assert_eq!(ds.column_names().collect::<Vec<_>>(), ["age", " label "]);
        assert_eq!(
            ds.column(" label ").unwrap().values,
            ColumnValues::Text(vec![" tcp".to_string(), "  ".to_string()])
        );

        let out = dir.path().join("out/in.csv");
        repo.write_dataset(&ds, &out).unwrap();
        let copied = fs::read_to_string(&out).unwrap();
        let source = fs::read_to_string(&src).unwrap();
        assert!(copied.lines().eq(source.lines()));
    }

    #[test]
    fn missing_file_is_an_io_error() {
        let dir = tempdir().unwrap();
        let err = CsvDataRepo::new()
            .read_dataset(&dir.path().join("absent.csv"))
            .unwrap_err();
        assert_eq!(err.code(), ErrorCode::Io);
        assert_eq!(err.context(), "CsvDataRepo::read_dataset");
    }

    #[test]
    fn ragged_rows_are_rejected() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("bad.csv");
        fs::write(&path, "a,b\n1,2\n3\n").unwrap();
        let err = CsvDataRepo::new().read_dataset(&path).unwrap_err();
        assert_eq!(err.code(), ErrorCode::Io);
    }

    #[test]
    fn empty_file_has_no_columns() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("empty.csv");
        fs::write(&path, "").unwrap();
        let err = CsvDataRepo::new().read_dataset(&path).unwrap_err();
        assert_eq!(err.code(), ErrorCode::InvalidInput);
    }

    #[test]
    fn written_copy_reads_back_equal() {
        let dir = tempdir().unwrap();
        let src = dir.path().join("in.csv");
        fs::write(&src, "a,b,c\n1,0.5,x\n2,,y\n").unwrap();
        let repo = CsvDataRepo::new();
        let ds = repo.read_dataset(&src).unwrap();

        let dst = dir.path().join("nested/out/copy.csv");
        repo.write_dataset(&ds, &dst).unwrap();

        let text = fs::read_to_string(&dst).unwrap();
        assert_eq!(text, "a,b,c\n1,0.5,x\n2,,y\n");
    }

    #[test]
    fn schema_file_loads() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("schema.yaml");
        fs::write(&path, "columns:\n  - a: int64\n  - b: int64\nnumerical_columns: [a, b]\n")
            .unwrap();
        let schema = load_schema(&path).unwrap();
        assert_eq!(schema.expected_column_count(), 2);
        assert_eq!(schema.expected_numeric_count(), 2);
    }
}
