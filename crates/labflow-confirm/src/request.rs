//! Confirmation requests and results
//!
//! One request shape covers both ways the lab reports work: by listing the
//! sections actually cut ([`ActionSelection::Sections`]) or by listing the
//! planned actions that were not done ([`ActionSelection::Planned`]).

use labflow_model::{Address, CommentId, Labware, Operation, SampleId};
use serde::{Deserialize, Serialize};

/// What the lab reports for a batch of labware
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfirmationRequest {
    /// Work to link the recorded operations to
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub work_number: Option<String>,
    /// Confirmations, one per labware
    pub labware: Vec<LabwareConfirmation>,
}

impl ConfirmationRequest {
    /// Create new request
    #[inline]
    #[must_use]
    pub fn new(labware: Vec<LabwareConfirmation>) -> Self {
        Self {
            work_number: None,
            labware,
        }
    }

    /// With work number
    #[inline]
    #[must_use]
    pub fn with_work_number(mut self, work_number: impl Into<String>) -> Self {
        self.work_number = Some(work_number.into());
        self
    }
}

/// Report for one destination labware
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LabwareConfirmation {
    /// Destination labware barcode
    pub barcode: String,
    /// Nothing was done; the labware is discarded
    #[serde(default)]
    pub cancelled: bool,
    /// Which planned actions to carry out
    pub selection: ActionSelection,
    /// Comments on destination addresses
    #[serde(default)]
    pub address_comments: Vec<AddressComment>,
}

impl LabwareConfirmation {
    /// Confirm explicitly listed sections
    #[must_use]
    pub fn sections(barcode: impl Into<String>, sections: Vec<ConfirmedSection>) -> Self {
        Self {
            barcode: barcode.into(),
            cancelled: false,
            selection: ActionSelection::Sections { sections },
            address_comments: Vec::new(),
        }
    }

    /// Confirm the plan as recorded, minus the given cancellations
    #[must_use]
    pub fn planned(barcode: impl Into<String>, cancelled: Vec<CancelledAction>) -> Self {
        Self {
            barcode: barcode.into(),
            cancelled: false,
            selection: ActionSelection::Planned { cancelled },
            address_comments: Vec::new(),
        }
    }

    /// Cancel all planned work into this labware
    #[must_use]
    pub fn cancelled(barcode: impl Into<String>) -> Self {
        Self {
            barcode: barcode.into(),
            cancelled: true,
            selection: ActionSelection::Planned {
                cancelled: Vec::new(),
            },
            address_comments: Vec::new(),
        }
    }

    /// With a comment on an address
    #[inline]
    #[must_use]
    pub fn with_address_comment(mut self, address: Address, comment_id: CommentId) -> Self {
        self.address_comments.push(AddressComment {
            address,
            comment_id,
        });
        self
    }
}

/// Which planned actions were carried out
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ActionSelection {
    /// Exactly these sections were cut; an empty list cancels the labware
    Sections { sections: Vec<ConfirmedSection> },
    /// Everything planned except these
    Planned {
        #[serde(default)]
        cancelled: Vec<CancelledAction>,
    },
}

/// One section the lab reports as cut and placed
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfirmedSection {
    /// Slot the section was placed in
    pub destination_address: Address,
    /// Source sample the section was cut from
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sample_id: Option<SampleId>,
    /// Omitted for fetal waste labware
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub new_section: Option<i32>,
    /// Region of the slot the section occupies
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub region: Option<String>,
    /// Comments on this section
    #[serde(default)]
    pub comment_ids: Vec<CommentId>,
}

impl ConfirmedSection {
    /// Create new confirmed section
    #[inline]
    #[must_use]
    pub fn new(destination_address: Address, sample_id: SampleId, new_section: i32) -> Self {
        Self {
            destination_address,
            sample_id: Some(sample_id),
            new_section: Some(new_section),
            region: None,
            comment_ids: Vec::new(),
        }
    }

    /// With region
    #[inline]
    #[must_use]
    pub fn with_region(mut self, region: impl Into<String>) -> Self {
        self.region = Some(region.into());
        self
    }

    /// With comments on the placed section
    #[inline]
    #[must_use]
    pub fn with_comments(mut self, comment_ids: Vec<CommentId>) -> Self {
        self.comment_ids = comment_ids;
        self
    }
}

/// A planned action that was not carried out
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CancelledAction {
    /// Slot of the cancelled action
    pub destination_address: Address,
    /// Source sample of the cancelled action
    pub sample_id: SampleId,
    /// Narrows the match when one sample is planned into an address twice
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub new_section: Option<i32>,
}

impl CancelledAction {
    /// Check if this cancellation names the given plan action
    #[must_use]
    pub fn matches(&self, action: &labflow_model::PlanAction) -> bool {
        action.destination.address == self.destination_address
            && action.sample.id == self.sample_id
            && (self.new_section.is_none() || self.new_section == action.new_section)
    }
}

/// A comment on a destination address
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AddressComment {
    /// Destination slot
    pub address: Address,
    /// Comment to attach
    pub comment_id: CommentId,
}

/// Outcome of a committed confirmation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfirmationResult {
    /// One per labware that was not discarded
    pub operations: Vec<Operation>,
    /// Final state of every labware in the request
    pub labware: Vec<Labware>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn selection_is_tagged_in_json() {
        let conf = LabwareConfirmation::sections(
            "STAN-1",
            vec![ConfirmedSection::new(Address::new(1, 1), SampleId(4), 12)],
        );
        let json = serde_json::to_value(&conf).unwrap();
        assert_eq!(json["selection"]["kind"], "sections");
        assert_eq!(json["selection"]["sections"][0]["destination_address"], "A1");
    }

    #[test]
    fn request_json_defaults() {
        let json = r#"{
            "labware": [
                { "barcode": "STAN-1", "selection": { "kind": "planned" } }
            ]
        }"#;
        let request: ConfirmationRequest = serde_json::from_str(json).unwrap();
        let conf = &request.labware[0];
        assert!(!conf.cancelled);
        assert!(conf.address_comments.is_empty());
        assert_eq!(conf.selection, ActionSelection::Planned { cancelled: vec![] });
        assert!(request.work_number.is_none());
    }
}
