//! Block section watermarks
//!
//! Section numbers taken from each source block are accumulated as a running
//! maximum while labware is processed and written once at the end, so the
//! result does not depend on the order labware or actions are visited.

use labflow_model::{Slot, SlotId};
use labflow_store::{LabWrite, StoreError};
use std::collections::BTreeMap;

/// Highest section taken per source block slot within one confirmation
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SectionWatermarks {
    highest: BTreeMap<SlotId, i32>,
}

impl SectionWatermarks {
    /// Empty accumulator
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record that `section` was cut from the block in `slot_id`
    pub fn observe(&mut self, slot_id: SlotId, section: i32) {
        self.highest
            .entry(slot_id)
            .and_modify(|h| *h = (*h).max(section))
            .or_insert(section);
    }

    /// Highest section observed for a slot
    #[inline]
    #[must_use]
    pub fn get(&self, slot_id: SlotId) -> Option<i32> {
        self.highest.get(&slot_id).copied()
    }

    /// True when no block section was observed
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.highest.is_empty()
    }

    /// Raise each block's stored watermark to at least what was observed
    ///
    /// Slots that no longer exist are reported as [`StoreError::UnknownSlot`].
    ///
    /// # Errors
    /// Returns the store error from loading or saving slots
    pub fn apply<W: LabWrite + ?Sized>(&self, tx: &mut W) -> Result<Vec<Slot>, StoreError> {
        if self.is_empty() {
            return Ok(Vec::new());
        }
        let mut slots = Vec::with_capacity(self.highest.len());
        for (&slot_id, &section) in &self.highest {
            let mut slot = tx.slot(slot_id).ok_or(StoreError::UnknownSlot(slot_id))?;
            let before = slot.block_highest_section;
            slot.raise_highest_section(section);
            tracing::debug!(slot_id = %slot_id, ?before, after = ?slot.block_highest_section, "raised block watermark");
            slots.push(slot);
        }
        tx.save_slots(&slots)?;
        Ok(slots)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use labflow_model::{Address, BioState, Labware, LabwareId, LabwareType, Sample, SampleId, TissueId};
    use labflow_store::{LabRead, LabStore, MemoryStore, Snapshot};
    use proptest::prelude::*;

    fn block_store(watermark: Option<i32>) -> MemoryStore {
        let mut slot = Slot::new(SlotId(5), LabwareId(1), Address::new(1, 1));
        slot.samples.push(Sample {
            id: SampleId(1),
            tissue_id: TissueId(1),
            section: None,
            bio_state: BioState::new(1, "Tissue"),
        });
        slot.block_sample_id = Some(SampleId(1));
        slot.block_highest_section = watermark;
        let labware = Labware {
            id: LabwareId(1),
            barcode: "BLOCK-1".to_string(),
            labware_type: LabwareType::new("Proviasette", 1, 1),
            slots: vec![slot],
            discarded: false,
            released: false,
            destroyed: false,
            used: false,
        };
        MemoryStore::from_snapshot(Snapshot {
            labware: vec![labware],
            ..Snapshot::default()
        })
        .unwrap()
    }

    #[test]
    fn observe_keeps_running_max() {
        let mut marks = SectionWatermarks::new();
        marks.observe(SlotId(5), 4);
        marks.observe(SlotId(5), 9);
        marks.observe(SlotId(5), 6);
        marks.observe(SlotId(6), 1);
        assert_eq!(marks.get(SlotId(5)), Some(9));
        assert_eq!(marks.get(SlotId(6)), Some(1));
        assert_eq!(marks.get(SlotId(7)), None);
    }

    #[test]
    fn apply_never_lowers_stored_watermark() {
        let store = block_store(Some(12));
        let mut tx = store.begin();
        let mut marks = SectionWatermarks::new();
        marks.observe(SlotId(5), 8);
        marks.apply(&mut tx).unwrap();
        assert_eq!(tx.slot(SlotId(5)).unwrap().block_highest_section, Some(12));
    }

    #[test]
    fn apply_raises_unset_watermark() {
        let store = block_store(None);
        let mut tx = store.begin();
        let mut marks = SectionWatermarks::new();
        marks.observe(SlotId(5), 3);
        let saved = marks.apply(&mut tx).unwrap();
        assert_eq!(saved.len(), 1);
        assert_eq!(tx.slot(SlotId(5)).unwrap().block_highest_section, Some(3));
    }

    #[test]
    fn apply_unknown_slot_fails() {
        let store = block_store(None);
        let mut tx = store.begin();
        let mut marks = SectionWatermarks::new();
        marks.observe(SlotId(99), 3);
        assert!(matches!(
            marks.apply(&mut tx),
            Err(StoreError::UnknownSlot(SlotId(99)))
        ));
    }

    proptest! {
        #[test]
        fn result_is_order_independent(
            observations in prop::collection::vec((1i64..4, 0i32..50), 0..30)
        ) {
            let mut forward = SectionWatermarks::new();
            for &(slot, section) in &observations {
                forward.observe(SlotId(slot), section);
            }
            let mut backward = SectionWatermarks::new();
            for &(slot, section) in observations.iter().rev() {
                backward.observe(SlotId(slot), section);
            }
            prop_assert_eq!(&forward, &backward);

            for slot in 1i64..4 {
                let expected = observations.iter().filter(|(s, _)| *s == slot).map(|(_, n)| *n).max();
                prop_assert_eq!(forward.get(SlotId(slot)), expected);
            }
        }
    }
}
