//! Recorded operations, actions, measurements and notes

use crate::ids::{ActionId, LabwareId, OperationId, OperationTypeId, PlanId, SampleId, SlotId};
use crate::sample::Sample;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Kind of lab operation, e.g. `Section`
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct OperationType {
    /// Operation type id
    pub id: OperationTypeId,
    /// Type name
    pub name: String,
    /// Sources must be blocks (sectioning)
    #[serde(default)]
    pub source_is_block: bool,
}

/// Action as handed to the store, before ids are assigned
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PendingAction {
    /// Source slot
    pub source_slot_id: SlotId,
    /// Destination slot
    pub destination_slot_id: SlotId,
    /// Sample placed in the destination
    pub sample: Sample,
    /// Sample taken from the source
    pub source_sample: Sample,
}

/// One recorded sample placement
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Action {
    /// Action id
    pub id: ActionId,
    /// Operation the action belongs to
    pub operation_id: OperationId,
    /// Source slot
    pub source_slot_id: SlotId,
    /// Destination slot
    pub destination_slot_id: SlotId,
    /// Sample placed in the destination
    pub sample: Sample,
    /// Sample it was derived from
    pub source_sample: Sample,
}

/// Operation as handed to the store, before ids are assigned
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewOperation {
    /// Operation type
    pub operation_type: OperationType,
    /// User who performed it
    pub username: String,
    /// Actions to record
    pub actions: Vec<PendingAction>,
    /// Plan being confirmed
    pub plan_operation_id: Option<PlanId>,
    /// When it was performed
    pub performed: DateTime<Utc>,
}

/// The persisted record of confirmed work
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Operation {
    /// Operation id
    pub id: OperationId,
    /// Operation type
    pub operation_type: OperationType,
    /// Recorded actions
    pub actions: Vec<Action>,
    /// User who performed it
    pub username: String,
    /// Plan it confirmed
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub plan_operation_id: Option<PlanId>,
    /// When it was performed
    pub performed: DateTime<Utc>,
}

impl Operation {
    /// Destination slots touched by this operation
    pub fn destination_slots(&self) -> impl Iterator<Item = SlotId> + '_ {
        self.actions.iter().map(|a| a.destination_slot_id)
    }
}

/// Measured value attached to a sample by an operation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Measurement {
    /// Measurement name
    pub name: String,
    /// Measured value
    pub value: String,
    /// Measured sample
    pub sample_id: SampleId,
    /// Slot holding the sample
    pub slot_id: SlotId,
    /// Operation the measurement belongs to
    pub operation_id: OperationId,
}

/// Labware-scoped note attached to an operation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OperationNote {
    /// Operation the note belongs to
    pub operation_id: OperationId,
    /// Labware the note is about
    pub labware_id: LabwareId,
    /// Note name
    pub name: String,
    /// Note value
    pub value: String,
}
