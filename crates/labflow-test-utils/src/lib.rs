//! Testing utilities for labflow workspace
//!
//! Shared fixtures for building stores, labware, plans and requests.

#![allow(missing_docs)]

use labflow_confirm::{ConfirmService, EngineConfig};
use labflow_model::{
    Address, BioState, Comment, CommentId, Labware, LabwareId, LabwareType, OperationType,
    OperationTypeId, PlanAction, PlanActionId, PlanId, PlanNote, PlanOperation, RegionId,
    Sample, SampleId, Slot, SlotId, SlotRef, SlotRegion, TissueId, User, Work, WorkId,
    WorkStatus,
};
use labflow_store::{LabRead, LabStore, MemoryStore, Snapshot};

pub const FETAL_WASTE: &str = "Fetal waste container";

pub fn addr(text: &str) -> Address {
    text.parse().unwrap()
}

pub fn tissue() -> BioState {
    BioState::new(1, "Tissue")
}

pub fn rna() -> BioState {
    BioState::new(2, "RNA")
}

pub fn section_op() -> OperationType {
    OperationType {
        id: OperationTypeId(1),
        name: "Section".to_string(),
        source_is_block: true,
    }
}

pub fn transfer_op() -> OperationType {
    OperationType {
        id: OperationTypeId(2),
        name: "Transfer".to_string(),
        source_is_block: false,
    }
}

pub fn user() -> User {
    User::new("user1")
}

/// One planned move from a source slot to a destination slot
#[derive(Debug, Clone)]
pub struct PlanStep {
    source: Labware,
    source_address: Address,
    destination: Labware,
    destination_address: Address,
    new_section: Option<i32>,
    new_bio_state: Option<BioState>,
    thickness: Option<String>,
}

impl PlanStep {
    pub fn new(source: &Labware, from: &str, destination: &Labware, to: &str) -> Self {
        Self {
            source: source.clone(),
            source_address: addr(from),
            destination: destination.clone(),
            destination_address: addr(to),
            new_section: None,
            new_bio_state: None,
            thickness: None,
        }
    }

    #[must_use]
    pub fn section(mut self, section: i32) -> Self {
        self.new_section = Some(section);
        self
    }

    #[must_use]
    pub fn bio_state(mut self, bio_state: BioState) -> Self {
        self.new_bio_state = Some(bio_state);
        self
    }

    #[must_use]
    pub fn thickness(mut self, thickness: &str) -> Self {
        self.thickness = Some(thickness.to_string());
        self
    }
}

/// Builds a store snapshot with sequential ids
#[derive(Debug, Clone)]
pub struct LabBuilder {
    snapshot: Snapshot,
    config: EngineConfig,
    next_labware: i64,
    next_slot: i64,
    next_sample: i64,
    next_tissue: i64,
    next_plan: i64,
    next_plan_action: i64,
}

impl Default for LabBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl LabBuilder {
    pub fn new() -> Self {
        Self {
            snapshot: Snapshot::default(),
            config: EngineConfig::default(),
            next_labware: 0,
            next_slot: 0,
            next_sample: 0,
            next_tissue: 0,
            next_plan: 0,
            next_plan_action: 0,
        }
    }

    fn bump(counter: &mut i64) -> i64 {
        *counter += 1;
        *counter
    }

    #[must_use]
    pub fn with_config(mut self, config: EngineConfig) -> Self {
        self.config = config;
        self
    }

    /// Empty labware of any type
    pub fn labware(&mut self, barcode: &str, labware_type: LabwareType) -> Labware {
        let id = LabwareId(Self::bump(&mut self.next_labware));
        let slots = labware_type
            .addresses()
            .map(|address| Slot::new(SlotId(Self::bump(&mut self.next_slot)), id, address))
            .collect();
        let labware = Labware {
            id,
            barcode: barcode.to_string(),
            labware_type,
            slots,
            discarded: false,
            released: false,
            destroyed: false,
            used: false,
        };
        self.snapshot.labware.push(labware.clone());
        labware
    }

    /// Empty slide with slots A1 to A4
    pub fn slide(&mut self, barcode: &str) -> Labware {
        self.labware(barcode, LabwareType::new("Slide", 1, 4))
    }

    pub fn fetal_waste(&mut self, barcode: &str) -> Labware {
        self.labware(barcode, LabwareType::new(FETAL_WASTE, 1, 1))
    }

    /// Single-slot labware holding a fresh tissue block in A1
    pub fn block(&mut self, barcode: &str, watermark: Option<i32>) -> Labware {
        let mut labware = self.labware(barcode, LabwareType::new("Proviasette", 1, 1));
        let sample = Sample {
            id: SampleId(Self::bump(&mut self.next_sample)),
            tissue_id: TissueId(Self::bump(&mut self.next_tissue)),
            section: None,
            bio_state: tissue(),
        };
        let slot = &mut labware.slots[0];
        slot.block_sample_id = Some(sample.id);
        slot.block_highest_section = watermark;
        slot.samples.push(sample);
        self.update(&labware);
        labware
    }

    /// Single-slot labware holding an already cut section in A1
    pub fn section_tube(&mut self, barcode: &str, section: i32) -> Labware {
        let mut labware = self.labware(barcode, LabwareType::new("Tube", 1, 1));
        labware.slots[0].samples.push(Sample {
            id: SampleId(Self::bump(&mut self.next_sample)),
            tissue_id: TissueId(Self::bump(&mut self.next_tissue)),
            section: Some(section),
            bio_state: tissue(),
        });
        self.update(&labware);
        labware
    }

    /// Replace stored labware with `labware`
    pub fn update(&mut self, labware: &Labware) {
        if let Some(stored) = self
            .snapshot
            .labware
            .iter_mut()
            .find(|lw| lw.id == labware.id)
        {
            *stored = labware.clone();
        }
    }

    pub fn plan(&mut self, operation_type: OperationType, steps: &[PlanStep]) -> PlanOperation {
        let plan_id = PlanId(Self::bump(&mut self.next_plan));
        let actions = steps
            .iter()
            .map(|step| {
                let source_slot = step.source.slot(step.source_address).unwrap();
                let destination_slot = step.destination.slot(step.destination_address).unwrap();
                PlanAction {
                    id: PlanActionId(Self::bump(&mut self.next_plan_action)),
                    plan_id,
                    source: SlotRef {
                        labware_id: step.source.id,
                        slot_id: source_slot.id,
                        address: step.source_address,
                    },
                    destination: SlotRef {
                        labware_id: step.destination.id,
                        slot_id: destination_slot.id,
                        address: step.destination_address,
                    },
                    sample: source_slot.samples[0].clone(),
                    new_section: step.new_section,
                    new_bio_state: step.new_bio_state.clone(),
                    thickness: step.thickness.clone(),
                }
            })
            .collect();
        let plan = PlanOperation {
            id: plan_id,
            operation_type,
            actions,
        };
        self.snapshot.plans.push(plan.clone());
        plan
    }

    pub fn plan_note(&mut self, plan: &PlanOperation, labware: &Labware, name: &str, value: &str) {
        self.snapshot.plan_notes.push(PlanNote {
            plan_id: plan.id,
            labware_id: labware.id,
            name: name.to_string(),
            value: value.to_string(),
        });
    }

    pub fn comment(&mut self, id: i64, text: &str, enabled: bool) -> Comment {
        let comment = Comment {
            id: CommentId(id),
            category: "section".to_string(),
            text: text.to_string(),
            enabled,
        };
        self.snapshot.comments.push(comment.clone());
        comment
    }

    pub fn region(&mut self, id: i64, name: &str, enabled: bool) -> SlotRegion {
        let region = SlotRegion {
            id: RegionId(id),
            name: name.to_string(),
            enabled,
        };
        self.snapshot.regions.push(region.clone());
        region
    }

    pub fn work(&mut self, work_number: &str, status: WorkStatus) -> Work {
        let work = Work {
            id: WorkId(self.snapshot.works.len() as i64 + 1),
            work_number: work_number.to_string(),
            status,
            operation_ids: Vec::new(),
        };
        self.snapshot.works.push(work.clone());
        work
    }

    pub fn snapshot(&self) -> Snapshot {
        self.snapshot.clone()
    }

    pub fn store(&self) -> MemoryStore {
        MemoryStore::from_snapshot(self.snapshot()).unwrap()
    }

    pub fn service(&self) -> ConfirmService<MemoryStore> {
        ConfirmService::with_config(self.store(), self.config.clone())
    }
}

/// Committed labware by barcode
pub fn stored_labware(store: &MemoryStore, barcode: &str) -> Labware {
    store.begin().labware_by_barcode(barcode).unwrap()
}

/// Committed slot by id
pub fn stored_slot(store: &MemoryStore, slot_id: SlotId) -> Slot {
    store.begin().slot(slot_id).unwrap()
}
