//! Planned work
//!
//! A [`PlanOperation`] is recorded before the lab does anything. It is
//! read-only input to confirmation.

use crate::address::Address;
use crate::ids::{LabwareId, PlanActionId, PlanId, SlotId};
use crate::operation::OperationType;
use crate::sample::{BioState, Sample};
use serde::{Deserialize, Serialize};

/// Reference to a slot in a specific piece of labware
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SlotRef {
    /// Labware holding the slot
    pub labware_id: LabwareId,
    /// Slot id
    pub slot_id: SlotId,
    /// Slot address
    pub address: Address,
}

/// One proposed transfer from a source sample into a destination slot
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlanAction {
    /// Plan action id
    pub id: PlanActionId,
    /// Plan the action belongs to
    pub plan_id: PlanId,
    /// Where the sample comes from
    pub source: SlotRef,
    /// Where the sample goes
    pub destination: SlotRef,
    /// Sample in the source slot
    pub sample: Sample,
    /// Section number to cut
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub new_section: Option<i32>,
    /// Bio-state the placed sample takes
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub new_bio_state: Option<BioState>,
    /// Planned section thickness
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thickness: Option<String>,
}

/// A proposed operation grouping plan actions of one operation type
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlanOperation {
    /// Plan id
    pub id: PlanId,
    /// Operation type to record
    pub operation_type: OperationType,
    /// Planned actions
    pub actions: Vec<PlanAction>,
}

impl PlanOperation {
    /// Plan actions whose destination is the given labware
    pub fn actions_into(&self, labware_id: LabwareId) -> impl Iterator<Item = &PlanAction> + '_ {
        self.actions
            .iter()
            .filter(move |a| a.destination.labware_id == labware_id)
    }

    /// Check whether any action targets the given labware
    #[inline]
    #[must_use]
    pub fn targets(&self, labware_id: LabwareId) -> bool {
        self.actions_into(labware_id).next().is_some()
    }

    /// Find the action placing `sample_id` at `address` in `labware_id`
    #[must_use]
    pub fn find_action(
        &self,
        labware_id: LabwareId,
        address: Address,
        sample_id: crate::ids::SampleId,
    ) -> Option<&PlanAction> {
        self.actions_into(labware_id)
            .find(|a| a.destination.address == address && a.sample.id == sample_id)
    }
}

/// Labware-scoped note recorded against a plan, e.g. a chosen reagent lot
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlanNote {
    /// Plan the note belongs to
    pub plan_id: PlanId,
    /// Labware the note is about
    pub labware_id: LabwareId,
    /// Note name
    pub name: String,
    /// Note value
    pub value: String,
}
