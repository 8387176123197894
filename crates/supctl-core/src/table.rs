//! Tabular file model
//!
//! A table is an ordered list of named columns sharing one row count. Cells are
//! kept as raw text; numeric coercion happens at comparison time so that a
//! rewrite of the cache file reproduces the data as received.

use crate::error::{TableError, TableResult};
use std::io::{Read, Write};
use std::path::Path;

/// A named column of raw cell values
#[derive(Debug, Clone, PartialEq)]
pub struct Column {
    pub name: String,
    pub values: Vec<String>,
}

/// An in-memory tabular file
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Table {
    columns: Vec<Column>,
    rows: usize,
}

impl Table {
    /// Build a table from columns, checking they share a row count
    pub fn from_columns(columns: Vec<Column>) -> TableResult<Self> {
        let rows = columns.first().map(|c| c.values.len()).unwrap_or(0);
        if let Some(bad) = columns.iter().find(|c| c.values.len() != rows) {
            return Err(TableError::RaggedRow {
                row: bad.values.len().min(rows),
                expected: rows,
                found: bad.values.len(),
            });
        }
        Ok(Self { columns, rows })
    }

    /// Parse CSV text with a header row
    pub fn from_reader<R: Read>(reader: R) -> TableResult<Self> {
        let mut csv_reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .from_reader(reader);

        let headers = csv_reader.headers()?.clone();
        if headers.is_empty() {
            return Err(TableError::MissingHeader);
        }

        let mut columns: Vec<Column> = headers
            .iter()
            .map(|name| Column {
                name: name.to_string(),
                values: Vec::new(),
            })
            .collect();

        let mut rows = 0;
        for (row, record) in csv_reader.records().enumerate() {
            let record = record?;
            if record.len() != columns.len() {
                return Err(TableError::RaggedRow {
                    row,
                    expected: columns.len(),
                    found: record.len(),
                });
            }
            for (column, cell) in columns.iter_mut().zip(record.iter()) {
                column.values.push(cell.to_string());
            }
            rows += 1;
        }

        Ok(Self { columns, rows })
    }

    /// Read a CSV file from disk
    pub fn from_path(path: &Path) -> TableResult<Self> {
        let file = std::fs::File::open(path).map_err(|source| TableError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_reader(std::io::BufReader::new(file))
    }

    /// Serialize as CSV with a header row
    pub fn write_to<W: Write>(&self, writer: W) -> TableResult<()> {
        let mut csv_writer = csv::Writer::from_writer(writer);
        csv_writer.write_record(self.headers())?;
        for row in 0..self.rows {
            csv_writer.write_record(self.columns.iter().map(|c| c.values[row].as_str()))?;
        }
        csv_writer.flush().map_err(|e| TableError::Csv(e.into()))?;
        Ok(())
    }

    /// Write the table to `path`, replacing any existing file
    pub fn write_to_path(&self, path: &Path) -> TableResult<()> {
        let io_err = |source| TableError::Io {
            path: path.to_path_buf(),
            source,
        };
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(io_err)?;
        }
        let file = std::fs::File::create(path).map_err(io_err)?;
        self.write_to(std::io::BufWriter::new(file))
    }

    /// Column headers in file order
    pub fn headers(&self) -> impl Iterator<Item = &str> {
        self.columns.iter().map(|c| c.name.as_str())
    }

    /// All columns in file order
    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    /// Look up a column by exact name
    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.name == name)
    }

    /// Number of data rows
    pub fn row_count(&self) -> usize {
        self.rows
    }
}
