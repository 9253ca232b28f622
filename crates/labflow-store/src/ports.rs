//! Storage ports
//!
//! The confirmation engine only talks to storage through these traits.
//! [`LabRead`] is all validation needs; [`LabWrite`] adds the mutations the
//! reconciler performs; [`LabStore`] hands out transactions.

use crate::error::StoreError;
use labflow_model::{
    BioState, Comment, CommentId, Labware, LabwareId, Measurement, NewOperation, Operation,
    OperationComment, OperationId, OperationNote, PlanId, PlanNote, PlanOperation, Sample,
    SampleId, SamplePosition, Slot, SlotId, SlotRegion, TissueId, Work,
};

/// Read-only lookups
pub trait LabRead {
    /// Find labware by barcode, ignoring case
    fn labware_by_barcode(&self, barcode: &str) -> Option<Labware>;

    /// Find labware by id
    fn labware(&self, id: LabwareId) -> Option<Labware>;

    /// Find a slot by id, in any labware
    fn slot(&self, id: SlotId) -> Option<Slot>;

    /// Find a sample by id
    fn sample(&self, id: SampleId) -> Option<Sample>;

    /// Every plan with at least one action into any of the given labware
    fn plans_targeting(&self, labware_ids: &[LabwareId]) -> Vec<PlanOperation>;

    /// Notes recorded against a plan for one piece of labware
    fn plan_notes(&self, plan_id: PlanId, labware_id: LabwareId) -> Vec<PlanNote>;

    /// Comments with the given ids; unknown ids are skipped
    fn comments(&self, ids: &[CommentId]) -> Vec<Comment>;

    /// Find a slot region by name, ignoring case
    fn region_by_name(&self, name: &str) -> Option<SlotRegion>;

    /// Find a work record by work number, ignoring case
    fn work_by_number(&self, work_number: &str) -> Option<Work>;
}

/// Mutations, scoped to one unit of work
pub trait LabWrite: LabRead {
    /// Mint and persist a new sample
    fn create_sample(
        &mut self,
        tissue_id: TissueId,
        section: Option<i32>,
        bio_state: BioState,
    ) -> Result<Sample, StoreError>;

    /// Replace a labware record, slots included
    fn save_labware(&mut self, labware: &Labware) -> Result<(), StoreError>;

    /// Replace a batch of slots inside their labware
    fn save_slots(&mut self, slots: &[Slot]) -> Result<(), StoreError>;

    /// Persist an operation, assigning operation and action ids
    fn create_operation(&mut self, operation: NewOperation) -> Result<Operation, StoreError>;

    /// Save measurements
    fn save_measurements(&mut self, measurements: Vec<Measurement>) -> Result<(), StoreError>;

    /// Save operation comments
    fn save_operation_comments(&mut self, comments: Vec<OperationComment>)
        -> Result<(), StoreError>;

    /// Save sample positions
    fn save_sample_positions(&mut self, positions: Vec<SamplePosition>) -> Result<(), StoreError>;

    /// Save operation notes
    fn save_operation_notes(&mut self, notes: Vec<OperationNote>) -> Result<(), StoreError>;

    /// Link operations to a work record
    fn link_work(
        &mut self,
        work_number: &str,
        operation_ids: &[OperationId],
    ) -> Result<Work, StoreError>;
}

/// Source of transactions
///
/// A transaction is an explicit unit of work: nothing it writes is visible
/// until [`LabStore::commit`] succeeds, and dropping it discards everything.
pub trait LabStore {
    /// Transaction type
    type Tx: LabWrite;

    /// Start a unit of work against the current committed state
    fn begin(&self) -> Self::Tx;

    /// Make every write in `tx` visible at once
    ///
    /// # Errors
    /// Returns [`StoreError::Conflict`] if another transaction committed
    /// after `tx` began.
    fn commit(&self, tx: Self::Tx) -> Result<(), StoreError>;
}
