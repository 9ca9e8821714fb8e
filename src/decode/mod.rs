//! Turns uploaded bytes into rows of cells (first sheet only).
//!
//! - Workbooks (xlsx/xlsm/xlsb/xls/ods) go through `calamine`.
//! - CSV exports go through `csv_async`, with optional gzip/zstd and charset transcoding.
//!
//! [`decode_rows`] yields every row, header included. [`decode_records`]
//! yields the data rows keyed by the header.

mod codec;
mod csv;
mod workbook;

use std::path::Path;

use bytes::Bytes;
use thiserror::Error;

use crate::record::{Cell, Record};

pub type Row = Vec<Cell>;

#[derive(Debug, Error)]
pub enum DecodeError {
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Csv(#[from] csv_async::Error),
    #[error(transparent)]
    Workbook(#[from] calamine::Error),
    #[error("workbook has no sheets")]
    NoSheets,
}

pub type DecodeResult<T> = std::result::Result<T, DecodeError>;

const WORKBOOK_EXTENSIONS: [&str; 5] = [".xlsx", ".xlsm", ".xlsb", ".xls", ".ods"];

const WORKBOOK_CONTENT_TYPES: [&str; 5] = [
    "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet",
    "application/vnd.ms-excel",
    "application/vnd.ms-excel.sheet.macroenabled.12",
    "application/vnd.ms-excel.sheet.binary.macroenabled.12",
    "application/vnd.oasis.opendocument.spreadsheet",
];

const ZIP_MAGIC: &[u8] = b"PK\x03\x04";
const OLE_MAGIC: &[u8] = &[0xD0, 0xCF, 0x11, 0xE0, 0xA1, 0xB1, 0x1A, 0xE1];

/// What we know about an upload besides its bytes.
#[derive(Debug, Clone)]
pub struct UploadMeta {
    /// file name as selected by the user (used for extension fallback)
    pub name_hint: String,
    /// e.g. "text/csv" or the xlsx MIME type; may be empty
    pub content_type: String,
    /// e.g. "gzip", "zstd", or empty
    pub content_encoding: String,
    /// charset of CSV uploads (defaults to UTF-8)
    pub charset: &'static encoding_rs::Encoding,
}

impl Default for UploadMeta {
    fn default() -> Self {
        Self {
            name_hint: String::new(),
            content_type: String::new(),
            content_encoding: String::new(),
            charset: encoding_rs::UTF_8,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SheetFormat {
    Workbook,
    Csv,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Compression {
    None,
    Gzip,
    Zstd,
}

impl UploadMeta {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name_hint: name.into(),
            ..Default::default()
        }
    }

    /// Meta for a local file; only the file name is known.
    pub fn from_path(path: &Path) -> Self {
        Self::named(
            path.file_name()
                .and_then(|s| s.to_str())
                .unwrap_or_default(),
        )
    }

    pub fn with_charset(mut self, charset: &'static encoding_rs::Encoding) -> Self {
        self.charset = charset;
        self
    }

    /// Compression of a CSV upload: encoding first, then type, then extension.
    pub fn compression(&self) -> Compression {
        let ce = self.content_encoding.to_ascii_lowercase();
        let ct = self.content_type.to_ascii_lowercase();
        let name = self.name_hint.to_ascii_lowercase();
        let encoded = |tag: &str| ce.split(',').any(|s| s.trim() == tag);

        if encoded("gzip")
            || matches!(ct.as_str(), "application/gzip" | "application/x-gzip")
            || name.ends_with(".gz")
        {
            Compression::Gzip
        } else if encoded("zstd") || ct == "application/zstd" || name.ends_with(".zst") {
            Compression::Zstd
        } else {
            Compression::None
        }
    }

    /// Picks the decoder: declared type, then extension, then magic bytes.
    pub fn format(&self, bytes: &[u8]) -> SheetFormat {
        let ct = self.content_type.to_ascii_lowercase();
        let name = self.name_hint.to_ascii_lowercase();

        if WORKBOOK_CONTENT_TYPES.contains(&ct.as_str())
            || WORKBOOK_EXTENSIONS.iter().any(|ext| name.ends_with(ext))
        {
            return SheetFormat::Workbook;
        }
        if ct == "text/csv" || name.ends_with(".csv") || self.compression() != Compression::None {
            return SheetFormat::Csv;
        }
        if bytes.starts_with(ZIP_MAGIC) || bytes.starts_with(OLE_MAGIC) {
            SheetFormat::Workbook
        } else {
            SheetFormat::Csv
        }
    }
}

/// Decodes all rows of the first sheet, header row included.
pub async fn decode_rows(bytes: Bytes, meta: &UploadMeta) -> DecodeResult<Vec<Row>> {
    let format = meta.format(&bytes);
    tracing::debug!(name = %meta.name_hint, ?format, len = bytes.len(), "decoding upload");
    match format {
        SheetFormat::Workbook => workbook::first_sheet_rows(bytes),
        SheetFormat::Csv => csv::read_rows(bytes, meta).await,
    }
}

/// Decodes the first sheet as records keyed by its header row.
pub async fn decode_records(bytes: Bytes, meta: &UploadMeta) -> DecodeResult<Vec<Record>> {
    let rows = decode_rows(bytes, meta).await?;
    Ok(rows_to_records(&rows))
}

/// Keys each row after the first by the first row's labels.
///
/// Blank rows are skipped, empty cells are left out of the record, and
/// cells past the header's width or under a blank label are ignored.
pub fn rows_to_records(rows: &[Row]) -> Vec<Record> {
    let Some((header, body)) = rows.split_first() else {
        return Vec::new();
    };
    let labels: Vec<String> = header.iter().map(ToString::to_string).collect();

    body.iter()
        .filter(|row| !row.iter().all(Cell::is_empty))
        .map(|row| {
            labels
                .iter()
                .zip(row)
                .filter(|(label, cell)| !label.is_empty() && !cell.is_empty())
                .map(|(label, cell)| (label.clone(), cell.clone()))
                .collect::<Record>()
        })
        .collect()
}
