//! Upload orchestration: decode, validate, dedupe, stage, and commit on confirm.

use std::path::Path;

use bytes::Bytes;
use tracing::{debug, info, warn};

use crate::config::CatalogConfig;
use crate::decode::{self, DecodeError, UploadMeta};
use crate::dedup::find_duplicate;
use crate::record::Record;
use crate::schema::Schema;
use crate::stage::BatchStager;
use crate::store::{CollectionStore, FileStore, KeyValueStore, StoreResult};
use crate::{UploadError, UploadResult};

/// An upload passed every check and is waiting for confirm or cancel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PreviewReady {
    pub rows: usize,
}

/// Owns the catalog and the staging slot and drives one upload at a time.
///
/// A rejected upload leaves both the catalog and any pending preview as
/// they were; nothing reaches the catalog without [`confirm`](Self::confirm).
#[derive(Debug)]
pub struct IngestionPipeline<S> {
    schema: Schema,
    stager: BatchStager,
    store: CollectionStore<S>,
}

impl IngestionPipeline<FileStore> {
    /// Pipeline over the file-backed catalog described by `config`.
    pub fn open(config: &CatalogConfig) -> Self {
        Self::new(FileStore::new(&config.store_dir), &config.storage_key)
    }
}

impl<S: KeyValueStore> IngestionPipeline<S> {
    pub fn new(storage: S, key: impl Into<String>) -> Self {
        Self {
            schema: Schema::default(),
            stager: BatchStager::new(),
            store: CollectionStore::open(storage, key),
        }
    }

    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    /// Runs one upload attempt through to a staged preview.
    pub async fn ingest(
        &mut self,
        raw: impl Into<Bytes>,
        meta: &UploadMeta,
    ) -> UploadResult<PreviewReady> {
        let result = self.attempt(raw.into(), meta).await;
        if let Err(err) = &result {
            warn!(name = %meta.name_hint, error = %err, "upload rejected");
        }
        result
    }

    /// Reads a local file and ingests it, guessing the format from its name.
    pub async fn ingest_path(&mut self, path: &Path) -> UploadResult<PreviewReady> {
        let meta = UploadMeta::from_path(path);
        let raw = match tokio::fs::read(path).await {
            Ok(raw) => raw,
            Err(err) => {
                let err = UploadError::Decode(DecodeError::Io(err));
                warn!(path = %path.display(), error = %err, "upload rejected");
                return Err(err);
            }
        };
        self.ingest(raw, &meta).await
    }

    async fn attempt(&mut self, raw: Bytes, meta: &UploadMeta) -> UploadResult<PreviewReady> {
        let rows = decode::decode_rows(raw, meta).await?;
        debug!(rows = rows.len(), "parsed");

        self.schema.validate(&rows)?;
        debug!("header checked");

        let records = decode::rows_to_records(&rows);
        self.schema.check_key_column(&records)?;
        let batch: Vec<Record> = records.iter().map(|r| self.schema.normalize(r)).collect();
        debug!(records = batch.len(), "records extracted");

        if let Some(key) = find_duplicate(self.store.records(), &batch, self.schema.key_column()) {
            return Err(UploadError::DuplicateProductName(key));
        }

        let ready = PreviewReady { rows: batch.len() };
        self.stager.stage(batch);
        info!(rows = ready.rows, name = %meta.name_hint, "batch staged for confirmation");
        Ok(ready)
    }

    /// Commits the staged batch to the catalog; returns how many records were added.
    pub fn confirm(&mut self) -> UploadResult<usize> {
        let batch = self.stager.confirm()?;
        let added = batch.len();
        self.store.append(batch)?;
        Ok(added)
    }

    /// Drops the staged batch, if any.
    pub fn cancel(&mut self) {
        if self.stager.has_pending() {
            debug!("staged batch cancelled");
        }
        self.stager.cancel();
    }

    /// Deletes the catalog record at `index`; `Ok(None)` if out of range.
    pub fn remove_at(&mut self, index: usize) -> StoreResult<Option<Record>> {
        self.store.remove_at(index)
    }

    pub fn has_pending(&self) -> bool {
        self.stager.has_pending()
    }

    pub fn preview(&self) -> Option<&[Record]> {
        self.stager.pending()
    }

    pub fn collection(&self) -> &[Record] {
        self.store.records()
    }

    pub fn into_storage(self) -> S {
        self.store.into_storage()
    }
}
