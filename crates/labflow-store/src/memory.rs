//! In-memory transactional store
//!
//! Tables live in `im` persistent collections, so starting a transaction is
//! an O(1) structural clone of the committed state. Commits are optimistic:
//! the working copy replaces the committed tables only if nothing else was
//! committed in between.

use crate::error::StoreError;
use crate::ports::{LabRead, LabStore, LabWrite};
use crate::snapshot::Snapshot;
use im::{OrdMap, Vector};
use labflow_model::{
    Action, ActionId, BioState, Comment, CommentId, Labware, LabwareId, Measurement,
    NewOperation, Operation, OperationComment, OperationId, OperationNote, PlanId, PlanNote,
    PlanOperation, Sample, SampleId, SamplePosition, Slot, SlotId, SlotRegion, TissueId, Work,
};
use parking_lot::RwLock;

/// Last id handed out per sequence
#[derive(Debug, Clone, Copy, Default)]
struct Sequences {
    sample: i64,
    operation: i64,
    action: i64,
}

impl Sequences {
    fn bump(counter: &mut i64) -> i64 {
        *counter += 1;
        *counter
    }
}

#[derive(Debug, Clone, Default)]
struct Tables {
    labware: OrdMap<LabwareId, Labware>,
    /// Upper-cased barcode -> labware
    barcodes: OrdMap<String, LabwareId>,
    slot_owner: OrdMap<SlotId, LabwareId>,
    samples: OrdMap<SampleId, Sample>,
    plans: OrdMap<PlanId, PlanOperation>,
    plan_notes: Vector<PlanNote>,
    operations: OrdMap<OperationId, Operation>,
    measurements: Vector<Measurement>,
    operation_comments: Vector<OperationComment>,
    sample_positions: Vector<SamplePosition>,
    operation_notes: Vector<OperationNote>,
    comments: OrdMap<CommentId, Comment>,
    /// Upper-cased name -> region
    regions: OrdMap<String, SlotRegion>,
    /// Upper-cased work number -> work
    works: OrdMap<String, Work>,
    sequences: Sequences,
}

impl Tables {
    fn from_snapshot(snapshot: Snapshot) -> Result<Self, StoreError> {
        let mut tables = Self::default();

        for sample in snapshot.samples {
            tables.register_sample(sample);
        }
        for labware in snapshot.labware {
            let key = labware.barcode.to_uppercase();
            if tables.barcodes.contains_key(&key) {
                return Err(StoreError::DuplicateBarcode(labware.barcode));
            }
            tables.barcodes.insert(key, labware.id);
            tables.index_labware(labware);
        }
        for plan in snapshot.plans {
            for action in &plan.actions {
                tables.register_sample(action.sample.clone());
            }
            tables.plans.insert(plan.id, plan);
        }
        for operation in snapshot.operations {
            for action in &operation.actions {
                tables.sequences.action = tables.sequences.action.max(action.id.get());
                tables.register_sample(action.sample.clone());
                tables.register_sample(action.source_sample.clone());
            }
            tables.sequences.operation = tables.sequences.operation.max(operation.id.get());
            tables.operations.insert(operation.id, operation);
        }

        tables.plan_notes = snapshot.plan_notes.into_iter().collect();
        tables.measurements = snapshot.measurements.into_iter().collect();
        tables.operation_comments = snapshot.operation_comments.into_iter().collect();
        tables.sample_positions = snapshot.sample_positions.into_iter().collect();
        tables.operation_notes = snapshot.operation_notes.into_iter().collect();
        tables.comments = snapshot.comments.into_iter().map(|c| (c.id, c)).collect();
        tables.regions = snapshot
            .regions
            .into_iter()
            .map(|r| (r.name.to_uppercase(), r))
            .collect();
        tables.works = snapshot
            .works
            .into_iter()
            .map(|w| (w.work_number.to_uppercase(), w))
            .collect();

        Ok(tables)
    }

    fn to_snapshot(&self) -> Snapshot {
        Snapshot {
            labware: self.labware.values().cloned().collect(),
            samples: self.samples.values().cloned().collect(),
            plans: self.plans.values().cloned().collect(),
            plan_notes: self.plan_notes.iter().cloned().collect(),
            operations: self.operations.values().cloned().collect(),
            measurements: self.measurements.iter().cloned().collect(),
            operation_comments: self.operation_comments.iter().cloned().collect(),
            sample_positions: self.sample_positions.iter().cloned().collect(),
            operation_notes: self.operation_notes.iter().cloned().collect(),
            comments: self.comments.values().cloned().collect(),
            regions: self.regions.values().cloned().collect(),
            works: self.works.values().cloned().collect(),
        }
    }

    fn register_sample(&mut self, sample: Sample) {
        self.sequences.sample = self.sequences.sample.max(sample.id.get());
        self.samples.insert(sample.id, sample);
    }

    /// Store labware and index its slots and samples
    fn index_labware(&mut self, labware: Labware) {
        for slot in &labware.slots {
            self.slot_owner.insert(slot.id, labware.id);
            for sample in &slot.samples {
                self.register_sample(sample.clone());
            }
        }
        self.labware.insert(labware.id, labware);
    }
}

/// A unit of work against a [`MemoryStore`]
///
/// Reads see the committed state as of [`MemoryStore::begin`] plus this
/// transaction's own writes.
#[derive(Debug, Clone)]
pub struct MemoryTransaction {
    base_version: u64,
    tables: Tables,
}

impl MemoryTransaction {
    /// Committed version this transaction started from
    #[inline]
    #[must_use]
    pub fn base_version(&self) -> u64 {
        self.base_version
    }

    /// Current contents, including uncommitted writes
    #[must_use]
    pub fn snapshot(&self) -> Snapshot {
        self.tables.to_snapshot()
    }
}

impl LabRead for MemoryTransaction {
    fn labware_by_barcode(&self, barcode: &str) -> Option<Labware> {
        let id = self.tables.barcodes.get(&barcode.to_uppercase())?;
        self.tables.labware.get(id).cloned()
    }

    fn labware(&self, id: LabwareId) -> Option<Labware> {
        self.tables.labware.get(&id).cloned()
    }

    fn slot(&self, id: SlotId) -> Option<Slot> {
        let owner = self.tables.slot_owner.get(&id)?;
        self.tables
            .labware
            .get(owner)
            .and_then(|lw| lw.slot_by_id(id))
            .cloned()
    }

    fn sample(&self, id: SampleId) -> Option<Sample> {
        self.tables.samples.get(&id).cloned()
    }

    fn plans_targeting(&self, labware_ids: &[LabwareId]) -> Vec<PlanOperation> {
        self.tables
            .plans
            .values()
            .filter(|plan| labware_ids.iter().any(|&id| plan.targets(id)))
            .cloned()
            .collect()
    }

    fn plan_notes(&self, plan_id: PlanId, labware_id: LabwareId) -> Vec<PlanNote> {
        self.tables
            .plan_notes
            .iter()
            .filter(|n| n.plan_id == plan_id && n.labware_id == labware_id)
            .cloned()
            .collect()
    }

    fn comments(&self, ids: &[CommentId]) -> Vec<Comment> {
        ids.iter()
            .filter_map(|id| self.tables.comments.get(id))
            .cloned()
            .collect()
    }

    fn region_by_name(&self, name: &str) -> Option<SlotRegion> {
        self.tables.regions.get(&name.trim().to_uppercase()).cloned()
    }

    fn work_by_number(&self, work_number: &str) -> Option<Work> {
        self.tables.works.get(&work_number.trim().to_uppercase()).cloned()
    }
}

impl LabWrite for MemoryTransaction {
    fn create_sample(
        &mut self,
        tissue_id: TissueId,
        section: Option<i32>,
        bio_state: BioState,
    ) -> Result<Sample, StoreError> {
        let id = SampleId(Sequences::bump(&mut self.tables.sequences.sample));
        let sample = Sample {
            id,
            tissue_id,
            section,
            bio_state,
        };
        self.tables.samples.insert(id, sample.clone());
        tracing::trace!(sample_id = %id, "created sample");
        Ok(sample)
    }

    fn save_labware(&mut self, labware: &Labware) -> Result<(), StoreError> {
        let previous = self
            .tables
            .labware
            .get(&labware.id)
            .ok_or(StoreError::UnknownLabware(labware.id))?;
        let old_key = previous.barcode.to_uppercase();
        let new_key = labware.barcode.to_uppercase();
        if old_key != new_key {
            if self.tables.barcodes.contains_key(&new_key) {
                return Err(StoreError::DuplicateBarcode(labware.barcode.clone()));
            }
            self.tables.barcodes.remove(&old_key);
            self.tables.barcodes.insert(new_key, labware.id);
        }
        self.tables.index_labware(labware.clone());
        Ok(())
    }

    fn save_slots(&mut self, slots: &[Slot]) -> Result<(), StoreError> {
        for slot in slots {
            let owner = *self
                .tables
                .slot_owner
                .get(&slot.id)
                .ok_or(StoreError::UnknownSlot(slot.id))?;
            let labware = self
                .tables
                .labware
                .get_mut(&owner)
                .ok_or(StoreError::UnknownLabware(owner))?;
            let target = labware
                .slots
                .iter_mut()
                .find(|s| s.id == slot.id)
                .ok_or(StoreError::UnknownSlot(slot.id))?;
            *target = slot.clone();
            for sample in &slot.samples {
                self.tables.register_sample(sample.clone());
            }
        }
        Ok(())
    }

    fn create_operation(&mut self, operation: NewOperation) -> Result<Operation, StoreError> {
        let id = OperationId(Sequences::bump(&mut self.tables.sequences.operation));
        let actions = operation
            .actions
            .into_iter()
            .map(|pending| Action {
                id: ActionId(Sequences::bump(&mut self.tables.sequences.action)),
                operation_id: id,
                source_slot_id: pending.source_slot_id,
                destination_slot_id: pending.destination_slot_id,
                sample: pending.sample,
                source_sample: pending.source_sample,
            })
            .collect();
        let operation = Operation {
            id,
            operation_type: operation.operation_type,
            actions,
            username: operation.username,
            plan_operation_id: operation.plan_operation_id,
            performed: operation.performed,
        };
        self.tables.operations.insert(id, operation.clone());
        Ok(operation)
    }

    fn save_measurements(&mut self, measurements: Vec<Measurement>) -> Result<(), StoreError> {
        self.tables.measurements.extend(measurements);
        Ok(())
    }

    fn save_operation_comments(
        &mut self,
        comments: Vec<OperationComment>,
    ) -> Result<(), StoreError> {
        self.tables.operation_comments.extend(comments);
        Ok(())
    }

    fn save_sample_positions(&mut self, positions: Vec<SamplePosition>) -> Result<(), StoreError> {
        self.tables.sample_positions.extend(positions);
        Ok(())
    }

    fn save_operation_notes(&mut self, notes: Vec<OperationNote>) -> Result<(), StoreError> {
        self.tables.operation_notes.extend(notes);
        Ok(())
    }

    fn link_work(
        &mut self,
        work_number: &str,
        operation_ids: &[OperationId],
    ) -> Result<Work, StoreError> {
        let work = self
            .tables
            .works
            .get_mut(&work_number.trim().to_uppercase())
            .ok_or_else(|| StoreError::UnknownWork(work_number.to_string()))?;
        work.link(operation_ids.iter().copied());
        Ok(work.clone())
    }
}

#[derive(Debug, Default)]
struct Committed {
    version: u64,
    tables: Tables,
}

/// Thread-safe in-memory store with snapshot-isolated transactions
#[derive(Debug, Default)]
pub struct MemoryStore {
    committed: RwLock<Committed>,
}

impl MemoryStore {
    /// Create an empty store
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store seeded from a snapshot
    ///
    /// # Errors
    /// Returns [`StoreError::DuplicateBarcode`] if two labware share a barcode
    pub fn from_snapshot(snapshot: Snapshot) -> Result<Self, StoreError> {
        Ok(Self {
            committed: RwLock::new(Committed {
                version: 0,
                tables: Tables::from_snapshot(snapshot)?,
            }),
        })
    }

    /// Dump the committed state
    #[must_use]
    pub fn snapshot(&self) -> Snapshot {
        self.committed.read().tables.to_snapshot()
    }

    /// Number of successful commits so far
    #[must_use]
    pub fn version(&self) -> u64 {
        self.committed.read().version
    }
}

impl LabStore for MemoryStore {
    type Tx = MemoryTransaction;

    fn begin(&self) -> MemoryTransaction {
        let committed = self.committed.read();
        MemoryTransaction {
            base_version: committed.version,
            tables: committed.tables.clone(),
        }
    }

    fn commit(&self, tx: MemoryTransaction) -> Result<(), StoreError> {
        let mut committed = self.committed.write();
        if committed.version != tx.base_version {
            tracing::warn!(
                base = tx.base_version,
                current = committed.version,
                "rejecting stale transaction"
            );
            return Err(StoreError::Conflict {
                base: tx.base_version,
                current: committed.version,
            });
        }
        committed.tables = tx.tables;
        committed.version += 1;
        tracing::debug!(version = committed.version, "transaction committed");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use labflow_model::{
        Address, LabwareType, OperationType, OperationTypeId, PendingAction, WorkId, WorkStatus,
    };
    use pretty_assertions::assert_eq;

    fn tissue_state() -> BioState {
        BioState::new(1, "Tissue")
    }

    fn slide(id: i64, barcode: &str) -> Labware {
        let labware_type = LabwareType::new("Slide", 2, 1);
        let slots = labware_type
            .addresses()
            .enumerate()
            .map(|(i, a)| Slot::new(SlotId(id * 10 + i as i64), LabwareId(id), a))
            .collect();
        Labware {
            id: LabwareId(id),
            barcode: barcode.into(),
            labware_type,
            slots,
            discarded: false,
            released: false,
            destroyed: false,
            used: false,
        }
    }

    fn seeded() -> MemoryStore {
        let mut block = slide(1, "STAN-BLOCK");
        block.slots[0].samples.push(Sample {
            id: SampleId(5),
            tissue_id: TissueId(1),
            section: None,
            bio_state: tissue_state(),
        });
        block.slots[0].block_sample_id = Some(SampleId(5));
        MemoryStore::from_snapshot(Snapshot {
            labware: vec![block, slide(2, "STAN-DEST")],
            works: vec![Work {
                id: WorkId(1),
                work_number: "SGP1".into(),
                status: WorkStatus::Active,
                operation_ids: vec![],
            }],
            ..Snapshot::default()
        })
        .unwrap()
    }

    #[test]
    fn barcode_lookup_ignores_case() {
        let tx = seeded().begin();
        assert_eq!(tx.labware_by_barcode("stan-dest").map(|l| l.id), Some(LabwareId(2)));
        assert!(tx.labware_by_barcode("STAN-NONE").is_none());
    }

    #[test]
    fn sequences_continue_after_seeded_ids() {
        let mut tx = seeded().begin();
        let sample = tx.create_sample(TissueId(1), Some(1), tissue_state()).unwrap();
        assert_eq!(sample.id, SampleId(6));
    }

    #[test]
    fn uncommitted_writes_are_invisible() {
        let store = seeded();
        let mut tx = store.begin();
        tx.create_sample(TissueId(1), Some(1), tissue_state()).unwrap();
        drop(tx);

        assert_eq!(store.snapshot().samples.len(), 1);
        assert_eq!(store.version(), 0);
    }

    #[test]
    fn commit_publishes_writes() {
        let store = seeded();
        let mut tx = store.begin();
        let mut slot = tx.slot(SlotId(20)).unwrap();
        let sample = tx.create_sample(TissueId(1), Some(1), tissue_state()).unwrap();
        slot.add_sample(sample.clone());
        tx.save_slots(&[slot]).unwrap();
        store.commit(tx).unwrap();

        let view = store.begin();
        assert_eq!(view.slot(SlotId(20)).unwrap().samples, vec![sample]);
        assert_eq!(store.version(), 1);
    }

    #[test]
    fn stale_transaction_is_rejected() {
        let store = seeded();
        let first = store.begin();
        let second = store.begin();
        store.commit(first).unwrap();

        let err = store.commit(second).unwrap_err();
        assert!(matches!(err, StoreError::Conflict { base: 0, current: 1 }));
    }

    #[test]
    fn create_operation_assigns_ids() {
        let store = seeded();
        let mut tx = store.begin();
        let source = tx.sample(SampleId(5)).unwrap();
        let op = tx
            .create_operation(NewOperation {
                operation_type: OperationType {
                    id: OperationTypeId(1),
                    name: "Section".into(),
                    source_is_block: true,
                },
                username: "alice".into(),
                actions: vec![PendingAction {
                    source_slot_id: SlotId(10),
                    destination_slot_id: SlotId(20),
                    sample: source.clone(),
                    source_sample: source,
                }],
                plan_operation_id: Some(PlanId(3)),
                performed: Utc::now(),
            })
            .unwrap();

        assert_eq!(op.id, OperationId(1));
        assert_eq!(op.actions[0].id, ActionId(1));
        assert_eq!(op.actions[0].operation_id, op.id);
    }

    #[test]
    fn save_slots_rejects_unknown_slot() {
        let mut tx = seeded().begin();
        let stray = Slot::new(SlotId(999), LabwareId(2), Address::new(1, 1));
        assert!(matches!(
            tx.save_slots(&[stray]),
            Err(StoreError::UnknownSlot(SlotId(999)))
        ));
    }

    #[test]
    fn link_work_records_operations() {
        let mut tx = seeded().begin();
        let work = tx.link_work("sgp1", &[OperationId(4)]).unwrap();
        assert_eq!(work.operation_ids, vec![OperationId(4)]);
        assert!(matches!(
            tx.link_work("SGP2", &[]),
            Err(StoreError::UnknownWork(_))
        ));
    }

    #[test]
    fn duplicate_barcodes_are_rejected() {
        let err = MemoryStore::from_snapshot(Snapshot {
            labware: vec![slide(1, "STAN-A"), slide(2, "stan-a")],
            ..Snapshot::default()
        })
        .unwrap_err();
        assert!(matches!(err, StoreError::DuplicateBarcode(_)));
    }
}
