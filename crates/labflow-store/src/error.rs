//! Error types for labflow storage

use labflow_model::{LabwareId, SlotId};

/// Storage errors
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// Another transaction committed after this one began
    #[error("transaction conflict: store moved from version {base} to {current}")]
    Conflict { base: u64, current: u64 },

    /// Labware id not present
    #[error("unknown labware id: {0}")]
    UnknownLabware(LabwareId),

    /// Slot id not present
    #[error("unknown slot id: {0}")]
    UnknownSlot(SlotId),

    /// Work number not present
    #[error("unknown work number: {0}")]
    UnknownWork(String),

    /// Two labware share a barcode
    #[error("duplicate labware barcode: {0}")]
    DuplicateBarcode(String),

    /// Snapshot file could not be read or written
    #[error("snapshot io failed: {0}")]
    Io(#[from] std::io::Error),

    /// Snapshot file is not valid JSON for a snapshot
    #[error("snapshot json invalid: {0}")]
    Json(#[from] serde_json::Error),
}

impl StoreError {
    /// Check if retrying the whole request may succeed
    #[inline]
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Conflict { .. })
    }
}
