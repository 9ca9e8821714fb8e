use std::io::Cursor;

use async_compression::tokio::bufread::{GzipDecoder, ZstdDecoder};
use bytes::Bytes;
use csv_async::AsyncReaderBuilder;
use futures::TryStreamExt;
use tokio::io::{AsyncRead, BufReader};
use tokio_util::codec::FramedRead;
use tokio_util::io::StreamReader;

use super::codec::Utf8Transcoder;
use super::{Compression, DecodeResult, Row, UploadMeta};
use crate::record::Cell;

const BOM: char = '\u{feff}';

/// Wraps the upload with decompression and UTF-8 transcoding as `meta` asks.
fn plain_text(bytes: Bytes, meta: &UploadMeta) -> Box<dyn AsyncRead + Unpin + Send> {
    let buf = BufReader::new(Cursor::new(bytes));
    let decompressed: Box<dyn AsyncRead + Unpin + Send> = match meta.compression() {
        Compression::Gzip => Box::new(GzipDecoder::new(buf)),
        Compression::Zstd => Box::new(ZstdDecoder::new(buf)),
        Compression::None => Box::new(buf),
    };

    // transcode only when the export is not UTF-8 already
    if meta.charset == encoding_rs::UTF_8 {
        decompressed
    } else {
        let framed = FramedRead::new(decompressed, Utf8Transcoder::new(meta.charset));
        Box::new(StreamReader::new(framed))
    }
}

/// Reads every CSV row as text cells. The first row is returned like any
/// other; rows may differ in width.
pub(crate) async fn read_rows(bytes: Bytes, meta: &UploadMeta) -> DecodeResult<Vec<Row>> {
    let reader = AsyncReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .create_reader(plain_text(bytes, meta));
    let mut records = std::pin::pin!(reader.into_records());

    let mut rows = Vec::new();
    while let Some(record) = records.try_next().await? {
        let row: Row = record
            .iter()
            .map(|field| {
                if field.is_empty() {
                    Cell::Empty
                } else {
                    Cell::text(field)
                }
            })
            .collect();
        rows.push(row);
    }

    // a UTF-8 export may still carry its BOM in the first cell
    if let Some(Cell::Text(first)) = rows.first_mut().and_then(|row| row.first_mut()) {
        if let Some(stripped) = first.strip_prefix(BOM) {
            *first = stripped.to_string();
        }
    }

    Ok(rows)
}
