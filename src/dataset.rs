use crate::error::FeaturizeError;
use std::io::Read;
use std::path::{Path, PathBuf};

pub const TEXT_COLUMN: &str = "Text";
pub const TARGET_COLUMN: &str = "Target_1";
pub const FEATURES_COLUMN: &str = "Features";

/// In-memory table read from `<data_dir>/<name>.csv`.
///
/// Every cell is kept as text; featurizers decide how to interpret it.
#[derive(Debug, Clone, PartialEq)]
pub struct Dataset {
    name: String,
    columns: Vec<String>,
    rows: Vec<Vec<String>>,
}

impl Dataset {
    /// Build an input dataset, checking the text and target columns exist.
    pub fn new(
        name: impl Into<String>,
        columns: Vec<String>,
        rows: Vec<Vec<String>>,
    ) -> Result<Self, FeaturizeError> {
        let dataset = Self {
            name: name.into(),
            columns,
            rows,
        };
        dataset.require_column(TEXT_COLUMN)?;
        dataset.require_column(TARGET_COLUMN)?;
        Ok(dataset)
    }

    /// Parse CSV with a header row.
    pub fn from_reader<R: Read>(name: &str, reader: R) -> Result<Self, FeaturizeError> {
        let parse_err = |source| FeaturizeError::DatasetParse {
            name: name.to_string(),
            source,
        };

        let mut rdr = csv::Reader::from_reader(reader);
        let columns: Vec<String> = rdr
            .headers()
            .map_err(parse_err)?
            .iter()
            .map(str::to_string)
            .collect();

        let mut rows = Vec::new();
        for record in rdr.records() {
            let record = record.map_err(parse_err)?;
            rows.push(record.iter().map(str::to_string).collect());
        }

        Self::new(name, columns, rows)
    }

    /// Read the named dataset from `data_dir`.
    pub async fn load(data_dir: &Path, name: &str) -> Result<Self, FeaturizeError> {
        let path = dataset_path(data_dir, name);
        let bytes = tokio::fs::read(&path)
            .await
            .map_err(|source| FeaturizeError::DatasetOpen {
                name: name.to_string(),
                path: path.clone(),
                source,
            })?;
        Self::from_reader(name, bytes.as_slice())
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn rows(&self) -> &[Vec<String>] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn column_index(&self, column: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == column)
    }

    /// Values of one column, top to bottom.
    pub fn column(&self, column: &str) -> Option<Vec<&str>> {
        let idx = self.column_index(column)?;
        Some(
            self.rows
                .iter()
                .map(|row| row.get(idx).map(String::as_str).unwrap_or(""))
                .collect(),
        )
    }

    /// Owned copy of the text column, as handed to featurizers.
    pub fn texts(&self) -> Vec<String> {
        self.column(TEXT_COLUMN)
            .unwrap_or_default()
            .into_iter()
            .map(str::to_string)
            .collect()
    }

    /// New dataset with the text column replaced by `features` and renamed.
    /// `self` is left untouched.
    pub fn with_features(&self, features: Vec<String>) -> Result<Dataset, FeaturizeError> {
        let idx = self.require_column(TEXT_COLUMN)?;

        let mut columns = self.columns.clone();
        columns[idx] = FEATURES_COLUMN.to_string();

        let rows = self
            .rows
            .iter()
            .zip(features)
            .map(|(row, feature)| {
                let mut row = row.clone();
                if let Some(cell) = row.get_mut(idx) {
                    *cell = feature;
                }
                row
            })
            .collect();

        Ok(Dataset {
            name: self.name.clone(),
            columns,
            rows,
        })
    }

    /// Serialize as CSV with a header row.
    pub fn to_csv(&self) -> anyhow::Result<Vec<u8>> {
        let mut wtr = csv::Writer::from_writer(Vec::new());
        wtr.write_record(&self.columns)?;
        for row in &self.rows {
            wtr.write_record(row)?;
        }
        wtr.into_inner()
            .map_err(|e| anyhow::anyhow!("failed to flush CSV for `{}`: {}", self.name, e.error()))
    }

    fn require_column(&self, column: &str) -> Result<usize, FeaturizeError> {
        self.column_index(column)
            .ok_or_else(|| FeaturizeError::MissingColumn {
                name: self.name.clone(),
                column: column.to_string(),
            })
    }
}

fn dataset_path(data_dir: &Path, name: &str) -> PathBuf {
    data_dir.join(format!("{}.csv", name))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    const REVIEWS: &str = "Text,Target_1\ngreat product,1\nbad,0\n";

    #[test]
    fn parses_csv_with_required_columns() {
        let ds = Dataset::from_reader("reviews", REVIEWS.as_bytes()).unwrap();
        assert_eq!(ds.columns(), ["Text", "Target_1"]);
        assert_eq!(ds.len(), 2);
        assert_eq!(ds.texts(), vec!["great product", "bad"]);
        assert_eq!(ds.column(TARGET_COLUMN).unwrap(), vec!["1", "0"]);
    }

    #[test]
    fn rejects_missing_text_column() {
        let err = Dataset::from_reader("x", "Body,Target_1\na,1\n".as_bytes()).unwrap_err();
        match err {
            FeaturizeError::MissingColumn { name, column } => {
                assert_eq!(name, "x");
                assert_eq!(column, "Text");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn rejects_missing_target_column() {
        let err = Dataset::from_reader("x", "Text,Label\na,1\n".as_bytes()).unwrap_err();
        assert!(matches!(err, FeaturizeError::MissingColumn { column, .. } if column == "Target_1"));
    }

    #[test]
    fn ragged_rows_are_parse_errors() {
        let err = Dataset::from_reader("x", "Text,Target_1\na,1,extra\n".as_bytes()).unwrap_err();
        assert!(matches!(err, FeaturizeError::DatasetParse { .. }));
    }

    #[test]
    fn with_features_copies_and_renames() {
        let ds = Dataset::new(
            "d",
            vec!["Id".into(), "Text".into(), "Target_1".into()],
            vec![
                vec!["7".into(), "hello world".into(), "1".into()],
                vec!["8".into(), "bye".into(), "0".into()],
            ],
        )
        .unwrap();

        let out = ds.with_features(vec!["2".into(), "1".into()]).unwrap();

        assert_eq!(out.columns(), ["Id", "Features", "Target_1"]);
        assert_eq!(out.rows()[0], vec!["7", "2", "1"]);
        assert_eq!(out.rows()[1], vec!["8", "1", "0"]);
        assert!(out.column_index(TEXT_COLUMN).is_none());
        // source untouched
        assert_eq!(ds.texts(), vec!["hello world", "bye"]);
    }

    #[tokio::test]
    async fn load_reads_from_data_dir() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("reviews.csv"), REVIEWS).unwrap();

        let ds = Dataset::load(dir.path(), "reviews").await.unwrap();
        assert_eq!(ds.name(), "reviews");
        assert_eq!(ds.len(), 2);
    }

    #[tokio::test]
    async fn load_missing_file_is_open_error() {
        let dir = TempDir::new().unwrap();
        let err = Dataset::load(dir.path(), "missing").await.unwrap_err();
        match err {
            FeaturizeError::DatasetOpen { name, path, .. } => {
                assert_eq!(name, "missing");
                assert_eq!(path, dir.path().join("missing.csv"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn csv_output_has_header_and_rows() {
        let ds = Dataset::from_reader("reviews", REVIEWS.as_bytes()).unwrap();
        let bytes = ds.to_csv().unwrap();
        assert_eq!(String::from_utf8(bytes).unwrap(), REVIEWS);
    }
}
