//! Product sheet ingestion: validate, dedupe, preview, merge.
//!
//! - Uploads are decoded from xlsx/xls/ods workbooks or CSV exports (first sheet only).
//! - The header must be exactly `Product Name, Price, Quantity, Stock`, in that order.
//! - A batch is rejected whole if any product name repeats within it or already
//!   exists in the catalog.
//! - Accepted batches wait in a single preview slot until confirmed or cancelled.
//! - The catalog is rewritten to storage after every change.
//!
//! Data shape:
//! - `Record`: ordered column -> `Cell` map
//! - `IngestionPipeline::ingest(bytes, meta) -> Result<PreviewReady, UploadError>`
#![cfg_attr(docsrs, feature(doc_cfg))]
//
pub mod config;
pub mod decode;
mod dedup;
pub mod logging;
mod pipeline;
mod record;
pub mod schema;
mod stage;
pub mod store;

pub use crate::config::CatalogConfig;
pub use crate::decode::{decode_records, decode_rows, DecodeError, UploadMeta};
pub use crate::dedup::find_duplicate;
pub use crate::pipeline::{IngestionPipeline, PreviewReady};
pub use crate::record::{columns, Cell, Key, Record};
pub use crate::schema::{Schema, SchemaError, PRODUCT_NAME, REQUIRED_COLUMNS};
pub use crate::stage::{BatchStager, StageError};
pub use crate::store::{CollectionStore, FileStore, KeyValueStore, MemoryStore, StoreError};

use thiserror::Error;

/// Why an upload (or its confirmation) did not go through.
#[derive(Debug, Error)]
pub enum UploadError {
    #[error("uploaded sheet has no rows")]
    EmptyFile,
    #[error("header {found:?} does not match required columns {expected:?}")]
    ColumnMismatch {
        expected: Vec<String>,
        found: Vec<String>,
    },
    #[error("first record has no `{0}` field")]
    MissingKeyColumn(String),
    #[error("duplicate product name: {0}")]
    DuplicateProductName(Key),
    #[error("no batch is pending confirmation")]
    NoPendingBatch,
    #[error("could not decode upload: {0}")]
    Decode(#[from] DecodeError),
    #[error(transparent)]
    Store(#[from] StoreError),
}

pub type UploadResult<T> = std::result::Result<T, UploadError>;

impl UploadError {
    /// The one-line message shown to the user, who can then pick another file.
    pub fn user_message(&self) -> String {
        match self {
            UploadError::EmptyFile => "The spreadsheet file is empty.".to_string(),
            UploadError::ColumnMismatch { expected, .. } => format!(
                "The spreadsheet columns are in the wrong order. Expected: {}.",
                expected.join(", ")
            ),
            UploadError::MissingKeyColumn(column) => {
                format!("The spreadsheet has no {column} column.")
            }
            UploadError::DuplicateProductName(_) => {
                "A spreadsheet with a product name that already exists cannot be uploaded."
                    .to_string()
            }
            UploadError::NoPendingBatch => "There is no upload waiting for confirmation.".to_string(),
            UploadError::Decode(_) => "The file could not be read as a spreadsheet.".to_string(),
            UploadError::Store(_) => "The catalog could not be saved.".to_string(),
        }
    }
}

impl From<SchemaError> for UploadError {
    fn from(err: SchemaError) -> Self {
        match err {
            SchemaError::EmptyFile => UploadError::EmptyFile,
            SchemaError::ColumnMismatch { expected, found } => {
                UploadError::ColumnMismatch { expected, found }
            }
            SchemaError::MissingKeyColumn(column) => UploadError::MissingKeyColumn(column),
        }
    }
}

impl From<StageError> for UploadError {
    fn from(err: StageError) -> Self {
        match err {
            StageError::NoPendingBatch => UploadError::NoPendingBatch,
        }
    }
}
