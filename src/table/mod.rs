//! Delimited-table input and output: loading rows, typed records, and the result writer.

pub mod records;
mod writer;

pub use records::{ClientRecord, IndustryRecord, OutputRow};
pub use writer::{OutputLayout, write_output};

use std::path::{Path, PathBuf};

use csv::StringRecord;
use tracing::debug;

#[derive(Debug, thiserror::Error)]
pub enum TableError {
    #[error("File not found: {}", .0.display())]
    NotFound(PathBuf),

    #[error("CSV error in {}: {source}", path.display())]
    Csv { path: PathBuf, source: csv::Error },

    #[error("I/O error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
}

/// A parsed CSV file: header names plus the data records in file order.
#[derive(Debug, Clone)]
pub struct Table {
    headers: StringRecord,
    records: Vec<StringRecord>,
}

impl Table {
    pub fn load(path: &Path) -> Result<Self, TableError> {
        if !path.exists() {
            return Err(TableError::NotFound(absolute(path)));
        }
        let csv_err = |source| TableError::Csv {
            path: path.to_path_buf(),
            source,
        };

        let mut reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .from_path(path)
            .map_err(csv_err)?;

        let headers = reader.headers().map_err(csv_err)?.clone();
        let records = reader
            .records()
            .collect::<Result<Vec<_>, _>>()
            .map_err(csv_err)?;

        debug!(path = %path.display(), rows = records.len(), "table loaded");
        Ok(Self { headers, records })
    }

    #[cfg(test)]
    pub(crate) fn from_rows(headers: &[&str], rows: &[&[&str]]) -> Self {
        Self {
            headers: StringRecord::from(headers.to_vec()),
            records: rows.iter().map(|r| StringRecord::from(r.to_vec())).collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn rows(&self) -> impl Iterator<Item = Row<'_>> {
        self.records.iter().map(|record| Row {
            headers: &self.headers,
            record,
        })
    }
}

/// One data record viewed through the table's header names.
#[derive(Debug, Clone, Copy)]
pub struct Row<'a> {
    headers: &'a StringRecord,
    record: &'a StringRecord,
}

impl<'a> Row<'a> {
    pub fn get(&self, column: &str) -> Option<&'a str> {
        let idx = self.headers.iter().position(|h| h == column)?;
        self.record.get(idx)
    }

    /// Renders the row as a JSON object keyed by header, for diagnostics.
    pub fn to_json(&self) -> serde_json::Value {
        let map = self
            .headers
            .iter()
            .zip(self.record.iter())
            .map(|(k, v)| (k.to_string(), serde_json::Value::String(v.to_string())))
            .collect();
        serde_json::Value::Object(map)
    }
}

fn absolute(path: &Path) -> PathBuf {
    std::path::absolute(path).unwrap_or_else(|_| path.to_path_buf())
}
