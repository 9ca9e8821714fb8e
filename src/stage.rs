//! Single-slot holding area for a batch awaiting the user's decision.

use thiserror::Error;

use crate::record::Record;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StageError {
    #[error("no batch is pending confirmation")]
    NoPendingBatch,
}

/// Holds at most one validated batch until it is confirmed or cancelled.
#[derive(Debug, Default)]
pub struct BatchStager {
    pending: Option<Vec<Record>>,
}

impl BatchStager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stages `batch`, replacing whatever was pending.
    pub fn stage(&mut self, batch: Vec<Record>) {
        if let Some(previous) = self.pending.replace(batch) {
            tracing::debug!(rows = previous.len(), "discarded superseded preview");
        }
    }

    /// Takes the pending batch out of the slot.
    pub fn confirm(&mut self) -> Result<Vec<Record>, StageError> {
        self.pending.take().ok_or(StageError::NoPendingBatch)
    }

    pub fn cancel(&mut self) {
        self.pending = None;
    }

    pub fn has_pending(&self) -> bool {
        self.pending.is_some()
    }

    pub fn pending(&self) -> Option<&[Record]> {
        self.pending.as_deref()
    }
}
