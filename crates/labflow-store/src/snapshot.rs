//! Serialisable store contents
//!
//! A [`Snapshot`] seeds a [`MemoryStore`](crate::MemoryStore) and is what the
//! store dumps back out, e.g. for the CLI's `--output`.

use crate::error::StoreError;
use labflow_model::{
    Comment, Labware, Measurement, Operation, OperationComment, OperationNote, PlanNote,
    PlanOperation, Sample, SamplePosition, SlotRegion, Work,
};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Every table in the store, as plain vectors
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    /// All labware
    #[serde(default)]
    pub labware: Vec<Labware>,
    /// Samples not held in any slot; samples in slots are picked up from there
    #[serde(default)]
    pub samples: Vec<Sample>,
    /// Plans
    #[serde(default)]
    pub plans: Vec<PlanOperation>,
    /// Plan notes
    #[serde(default)]
    pub plan_notes: Vec<PlanNote>,
    /// Recorded operations
    #[serde(default)]
    pub operations: Vec<Operation>,
    /// Measurements
    #[serde(default)]
    pub measurements: Vec<Measurement>,
    /// Operation comments
    #[serde(default)]
    pub operation_comments: Vec<OperationComment>,
    /// Sample positions
    #[serde(default)]
    pub sample_positions: Vec<SamplePosition>,
    /// Operation notes
    #[serde(default)]
    pub operation_notes: Vec<OperationNote>,
    /// Comments
    #[serde(default)]
    pub comments: Vec<Comment>,
    /// Slot regions
    #[serde(default)]
    pub regions: Vec<SlotRegion>,
    /// Works
    #[serde(default)]
    pub works: Vec<Work>,
}

impl Snapshot {
    /// Read a snapshot from a JSON file
    pub fn load(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let text = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&text)?)
    }

    /// Write the snapshot as pretty JSON
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), StoreError> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        Ok(())
    }

    /// Find labware by barcode, ignoring case
    #[must_use]
    pub fn labware_by_barcode(&self, barcode: &str) -> Option<&Labware> {
        self.labware
            .iter()
            .find(|lw| lw.barcode.eq_ignore_ascii_case(barcode))
    }
}
