//! Comments, annotations, regions and sample positions

use crate::ids::{CommentId, LabwareId, OperationId, RegionId, SampleId, SlotId};
use serde::{Deserialize, Serialize};

/// Reusable predefined comment
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Comment {
    /// Comment id
    pub id: CommentId,
    /// Grouping such as "section"
    pub category: String,
    /// Display text
    pub text: String,
    /// Disabled comments cannot be used in new records
    #[serde(default = "enabled_by_default")]
    pub enabled: bool,
}

fn enabled_by_default() -> bool {
    true
}

/// A comment attached to an operation, optionally scoped to a sample in a slot
///
/// `sample_id` is `None` when the slot was empty at confirmation time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OperationComment {
    /// Recorded comment
    pub comment: Comment,
    /// Operation it belongs to, if any
    pub operation_id: Option<OperationId>,
    /// Sample it applies to; none for an empty slot
    pub sample_id: Option<SampleId>,
    /// Slot it applies to
    pub slot_id: Option<SlotId>,
    /// Labware it applies to
    pub labware_id: LabwareId,
}

/// Named sub-area of a slot, e.g. `Top` or `Bottom`
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SlotRegion {
    /// Region id
    pub id: RegionId,
    /// Region name, unique ignoring case
    pub name: String,
    /// Disabled regions cannot be used in new records
    #[serde(default = "enabled_by_default")]
    pub enabled: bool,
}

/// Records which region of a slot a confirmed section was placed in
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SamplePosition {
    /// Slot holding the sample
    pub slot_id: SlotId,
    /// Positioned sample
    pub sample_id: SampleId,
    /// Region of the slot
    pub region: SlotRegion,
    /// Operation that placed the sample
    pub operation_id: OperationId,
}
