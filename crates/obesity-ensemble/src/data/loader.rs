//! CSV loading for survey files.
//!
//! The loader normalizes header names to lowercase, checks that every
//! required column is present, then deserializes each row into a
//! [`RawRecord`]. Columns outside the schema are ignored.

use std::fs::File;
use std::io::{self, Read};
use std::path::Path;

use csv::{ReaderBuilder, StringRecord};

use super::error::DatasetLoadError;
use super::raw::{FEATURE_COLUMNS, ID_COLUMN, RawRecord, TARGET_COLUMN};

/// Loads survey rows from delimited files.
#[derive(Debug, Clone, Copy)]
pub struct DatasetLoader {
    require_target: bool,
    delimiter: u8,
}

impl DatasetLoader {
    /// Loader for labeled files: the target column must exist and be filled.
    pub fn training() -> Self {
        Self { require_target: true, delimiter: b',' }
    }

    /// Loader for unlabeled files: the target column is optional.
    pub fn inference() -> Self {
        Self { require_target: false, delimiter: b',' }
    }

    /// Use a different field delimiter.
    pub fn with_delimiter(mut self, delimiter: u8) -> Self {
        self.delimiter = delimiter;
        self
    }

    /// Load all rows from a file.
    ///
    /// # Errors
    ///
    /// - [`DatasetLoadError::FileNotFound`] if `path` does not exist
    /// - [`DatasetLoadError::SchemaMismatch`] if required columns are missing
    /// - [`DatasetLoadError::Csv`] for malformed rows or unparsable numbers
    /// - [`DatasetLoadError::MissingTarget`] for labeled files with an empty target
    /// - [`DatasetLoadError::Empty`] if the file has a header but no rows
    pub fn load(&self, path: impl AsRef<Path>) -> Result<Vec<RawRecord>, DatasetLoadError> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|err| match err.kind() {
            io::ErrorKind::NotFound => DatasetLoadError::FileNotFound { path: path.to_path_buf() },
            _ => DatasetLoadError::Io(err),
        })?;
        let records = self.read(file)?;
        tracing::info!(path = %path.display(), rows = records.len(), "loaded dataset");
        Ok(records)
    }

    /// Load all rows from any reader.
    pub fn read<R: Read>(&self, reader: R) -> Result<Vec<RawRecord>, DatasetLoadError> {
        let mut reader = ReaderBuilder::new()
            .delimiter(self.delimiter)
            .has_headers(true)
            .trim(csv::Trim::All)
            .from_reader(reader);

        let headers: StringRecord = reader.headers()?.iter().map(str::to_lowercase).collect();
        self.validate_headers(&headers)?;
        reader.set_headers(headers);

        let mut records = Vec::new();
        for (row, result) in reader.deserialize::<RawRecord>().enumerate() {
            let record = result?;
            if self.require_target && record.nobeyesdad.is_none() {
                return Err(DatasetLoadError::MissingTarget { row });
            }
            records.push(record);
        }

        if records.is_empty() {
            return Err(DatasetLoadError::Empty);
        }
        Ok(records)
    }

    fn validate_headers(&self, headers: &StringRecord) -> Result<(), DatasetLoadError> {
        let target = self.require_target.then_some(TARGET_COLUMN);
        let missing: Vec<String> = std::iter::once(ID_COLUMN)
            .chain(FEATURE_COLUMNS)
            .chain(target)
            .filter(|column| !headers.iter().any(|h| h == *column))
            .map(str::to_string)
            .collect();

        if !missing.is_empty() {
            return Err(DatasetLoadError::SchemaMismatch { missing });
        }

        let extra = headers
            .iter()
            .filter(|h| *h != ID_COLUMN && *h != TARGET_COLUMN && !FEATURE_COLUMNS.contains(h))
            .count();
        if extra > 0 {
            tracing::warn!(extra, "ignoring columns outside the survey schema");
        }
        Ok(())
    }
}
