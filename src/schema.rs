//! The required column contract for product sheets.

use thiserror::Error;

use crate::record::{Cell, Record};

/// Unique-key column of the product catalog.
pub const PRODUCT_NAME: &str = "Product Name";

/// Header a product sheet must carry, in this exact order.
pub const REQUIRED_COLUMNS: [&str; 4] = [PRODUCT_NAME, "Price", "Quantity", "Stock"];

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SchemaError {
    #[error("sheet has no rows")]
    EmptyFile,
    #[error("header {found:?} does not match required columns {expected:?}")]
    ColumnMismatch {
        expected: Vec<String>,
        found: Vec<String>,
    },
    #[error("first record has no `{0}` field")]
    MissingKeyColumn(String),
}

/// Ordered column names plus the column whose value must be unique.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Schema {
    columns: Vec<String>,
    key_column: String,
}

impl Default for Schema {
    fn default() -> Self {
        Self::new(REQUIRED_COLUMNS, PRODUCT_NAME)
    }
}

impl Schema {
    pub fn new<I, S>(columns: I, key_column: impl Into<String>) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            columns: columns.into_iter().map(Into::into).collect(),
            key_column: key_column.into(),
        }
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn key_column(&self) -> &str {
        &self.key_column
    }

    /// Checks the decoded sheet's first row against the contract.
    ///
    /// Comparison is positional and by count: a reordered, extra or missing
    /// column fails, and so does a header cell that is not text.
    pub fn validate(&self, rows: &[Vec<Cell>]) -> Result<(), SchemaError> {
        let header = rows.first().ok_or(SchemaError::EmptyFile)?;
        let matches = header.len() == self.columns.len()
            && header
                .iter()
                .zip(&self.columns)
                .all(|(cell, column)| cell.as_str() == Some(column.as_str()));
        if matches {
            Ok(())
        } else {
            Err(SchemaError::ColumnMismatch {
                expected: self.columns.clone(),
                found: header.iter().map(ToString::to_string).collect(),
            })
        }
    }

    /// Checks that the first record extracted with header-as-keys carries the
    /// key column. An empty key cell in the first data row is dropped during
    /// extraction and trips this check.
    pub fn check_key_column(&self, records: &[Record]) -> Result<(), SchemaError> {
        match records.first() {
            Some(first) if !first.contains(&self.key_column) => {
                Err(SchemaError::MissingKeyColumn(self.key_column.clone()))
            }
            _ => Ok(()),
        }
    }

    /// Rebuilds `record` with exactly the schema's columns, in schema order.
    pub fn normalize(&self, record: &Record) -> Record {
        self.columns
            .iter()
            .map(|column| {
                let cell = record.get(column).cloned().unwrap_or_default();
                (column.clone(), cell)
            })
            .collect()
    }
}
