//! Numeric CSV tables written by the simulation tooling.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::error::PlotError;

/// Header plus rows of numbers. Every row has the same width as the header.
#[derive(Clone, Debug, PartialEq)]
pub struct ResultTable {
    path: PathBuf,
    headers: Vec<String>,
    rows: Vec<Vec<f64>>,
}

impl ResultTable {
    pub fn read(path: &Path) -> Result<Self, PlotError> {
        let csv_err = |source| PlotError::Csv {
            path: path.to_path_buf(),
            source,
        };
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .trim(csv::Trim::All)
            .from_path(path)
            .map_err(csv_err)?;

        let headers = reader
            .headers()
            .map_err(csv_err)?
            .iter()
            .map(str::to_string)
            .collect();

        let mut rows = Vec::new();
        for (idx, record) in reader.records().enumerate() {
            let record = record.map_err(csv_err)?;
            let line = record
                .position()
                .map(|p| p.line() as usize)
                .unwrap_or(idx + 2);
            let row = record
                .iter()
                .enumerate()
                .map(|(column, field)| {
                    field.parse::<f64>().map_err(|_| PlotError::MalformedField {
                        path: path.to_path_buf(),
                        row: line,
                        column,
                        value: field.to_string(),
                    })
                })
                .collect::<Result<Vec<f64>, _>>()?;
            rows.push(row);
        }
        debug!(path = %path.display(), rows = rows.len(), "loaded result table");

        Ok(Self {
            path: path.to_path_buf(),
            headers,
            rows,
        })
    }

    /// Rows of every shard in order, sorted by `sort_column` with a stable
    /// sort. Shards must share the first shard's column count.
    pub fn concat(shards: Vec<ResultTable>, sort_column: usize) -> Result<Self, PlotError> {
        let mut shards = shards.into_iter();
        let Some(mut merged) = shards.next() else {
            return Err(PlotError::MissingData("no shard files to merge".into()));
        };
        merged.check_column(sort_column)?;
        for shard in shards {
            if shard.headers.len() != merged.headers.len() {
                return Err(PlotError::MissingData(format!(
                    "{} has {} columns, {} has {}",
                    shard.path.display(),
                    shard.headers.len(),
                    merged.path.display(),
                    merged.headers.len()
                )));
            }
            merged.rows.extend(shard.rows);
        }
        merged
            .rows
            .sort_by(|a, b| a[sort_column].total_cmp(&b[sort_column]));
        debug!(path = %merged.path.display(), rows = merged.rows.len(), "merged shards");
        Ok(merged)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    pub fn rows(&self) -> &[Vec<f64>] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    fn check_column(&self, column: usize) -> Result<(), PlotError> {
        if column >= self.headers.len() {
            return Err(PlotError::MissingData(format!(
                "{} has {} columns, column {column} requested",
                self.path.display(),
                self.headers.len()
            )));
        }
        Ok(())
    }

    pub fn column(&self, column: usize) -> Result<Vec<f64>, PlotError> {
        self.check_column(column)?;
        Ok(self.rows.iter().map(|row| row[column]).collect())
    }

    /// `(row[key], row[value])` for every row.
    pub fn pairs(&self, key: usize, value: usize) -> Result<Vec<(f64, f64)>, PlotError> {
        self.check_column(key)?;
        self.check_column(value)?;
        Ok(self.rows.iter().map(|row| (row[key], row[value])).collect())
    }

    pub fn retain(&mut self, mut keep: impl FnMut(&[f64]) -> bool) {
        self.rows.retain(|row| keep(row));
    }

    pub fn scale_column(&mut self, column: usize, divisor: f64) -> Result<(), PlotError> {
        self.check_column(column)?;
        for row in &mut self.rows {
            row[column] /= divisor;
        }
        Ok(())
    }
}

/// Per contact number `n = 1..=N`, how many runs recovered the secret after
/// exactly `n` trustee contacts and after exactly `n` people contacts.
#[derive(Clone, Debug, PartialEq)]
pub struct ContactHistogram {
    pub trustees: Vec<f64>,
    pub people: Vec<f64>,
}

impl ContactHistogram {
    pub fn read(path: &Path) -> Result<Self, PlotError> {
        Self::from_table(&ResultTable::read(path)?)
    }

    /// Columns 0, 1 and 2 are the contact number, the trustee count and the
    /// people count.
    pub fn from_table(table: &ResultTable) -> Result<Self, PlotError> {
        table.check_column(2)?;
        let mut by_contact: BTreeMap<usize, (f64, f64)> = BTreeMap::new();
        for (idx, row) in table.rows().iter().enumerate() {
            let n = row[0];
            if n < 1.0 || n.fract() != 0.0 {
                return Err(PlotError::MalformedField {
                    path: table.path().to_path_buf(),
                    row: idx + 2,
                    column: 0,
                    value: n.to_string(),
                });
            }
            by_contact.insert(n as usize, (row[1], row[2]));
        }

        let len = by_contact.len();
        let mut trustees = Vec::with_capacity(len);
        let mut people = Vec::with_capacity(len);
        for contact in 1..=len {
            let Some(&(t, p)) = by_contact.get(&contact) else {
                return Err(PlotError::MissingContactRow {
                    path: table.path().to_path_buf(),
                    contact,
                });
            };
            trustees.push(t);
            people.push(p);
        }
        Ok(Self { trustees, people })
    }

    pub fn len(&self) -> usize {
        self.trustees.len()
    }

    pub fn is_empty(&self) -> bool {
        self.trustees.is_empty()
    }
}
