//! Labware, labware types and slots

use crate::address::Address;
use crate::ids::{LabwareId, SampleId, SlotId};
use crate::sample::Sample;
use serde::{Deserialize, Serialize};

/// Geometry of a kind of labware
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LabwareType {
    /// Type name
    pub name: String,
    /// Number of rows
    pub rows: u32,
    /// Number of columns
    pub columns: u32,
}

impl LabwareType {
    /// Create a labware type with the given geometry
    #[inline]
    #[must_use]
    pub fn new(name: impl Into<String>, rows: u32, columns: u32) -> Self {
        Self {
            name: name.into(),
            rows,
            columns,
        }
    }

    /// Check if address lies within this geometry
    #[inline]
    #[must_use]
    pub fn contains(&self, address: Address) -> bool {
        address.row() <= self.rows && address.column() <= self.columns
    }

    /// All addresses, row-major
    pub fn addresses(&self) -> impl Iterator<Item = Address> + '_ {
        (1..=self.rows).flat_map(move |row| (1..=self.columns).map(move |col| Address::new(row, col)))
    }
}

/// One addressable position in a piece of labware
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Slot {
    /// Slot id
    pub id: SlotId,
    /// Labware the slot belongs to
    pub labware_id: LabwareId,
    /// Position in the labware
    pub address: Address,
    /// Samples in the slot, each at most once
    #[serde(default)]
    pub samples: Vec<Sample>,
    /// Set when the slot holds a block that sections are cut from
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub block_sample_id: Option<SampleId>,
    /// Highest section number ever taken from this block
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub block_highest_section: Option<i32>,
}

impl Slot {
    /// Empty slot
    #[inline]
    #[must_use]
    pub fn new(id: SlotId, labware_id: LabwareId, address: Address) -> Self {
        Self {
            id,
            labware_id,
            address,
            samples: Vec::new(),
            block_sample_id: None,
            block_highest_section: None,
        }
    }

    /// True when the slot holds a block
    #[inline]
    #[must_use]
    pub fn is_block(&self) -> bool {
        self.block_sample_id.is_some()
    }

    /// True when the slot holds no samples
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Check if a sample is in the slot
    #[inline]
    #[must_use]
    pub fn contains_sample(&self, sample_id: SampleId) -> bool {
        self.samples.iter().any(|s| s.id == sample_id)
    }

    /// Add a sample unless already present. Returns whether it was added.
    pub fn add_sample(&mut self, sample: Sample) -> bool {
        if self.contains_sample(sample.id) {
            return false;
        }
        self.samples.push(sample);
        true
    }

    /// Raise the block watermark; never lowers it
    pub fn raise_highest_section(&mut self, section: i32) {
        self.block_highest_section = Some(match self.block_highest_section {
            Some(current) => current.max(section),
            None => section,
        });
    }
}

/// Derived lifecycle state of a piece of labware
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LabwareState {
    /// No samples in any slot
    Empty,
    /// Holds samples
    Active,
    /// Already used as a destination
    Used,
    /// Discarded
    Discarded,
    /// Released to another site
    Released,
    /// Destroyed
    Destroyed,
}

impl std::fmt::Display for LabwareState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Empty => "empty",
            Self::Active => "active",
            Self::Used => "used",
            Self::Discarded => "discarded",
            Self::Released => "released",
            Self::Destroyed => "destroyed",
        };
        f.write_str(name)
    }
}

/// A physical container with addressable slots
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Labware {
    /// Labware id
    pub id: LabwareId,
    /// Unique barcode
    pub barcode: String,
    /// Type and geometry
    pub labware_type: LabwareType,
    /// Slots in row-major order
    pub slots: Vec<Slot>,
    /// Thrown away
    #[serde(default)]
    pub discarded: bool,
    /// Sent elsewhere
    #[serde(default)]
    pub released: bool,
    /// Destroyed
    #[serde(default)]
    pub destroyed: bool,
    /// Already used as a destination
    #[serde(default)]
    pub used: bool,
}

impl Labware {
    /// Lifecycle state; explicit flags take precedence over contents
    #[must_use]
    pub fn state(&self) -> LabwareState {
        if self.destroyed {
            LabwareState::Destroyed
        } else if self.released {
            LabwareState::Released
        } else if self.discarded {
            LabwareState::Discarded
        } else if self.used {
            LabwareState::Used
        } else if self.is_empty() {
            LabwareState::Empty
        } else {
            LabwareState::Active
        }
    }

    /// True when no slot holds a sample
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.slots.iter().all(Slot::is_empty)
    }

    /// Slot at an address
    #[inline]
    #[must_use]
    pub fn slot(&self, address: Address) -> Option<&Slot> {
        self.slots.iter().find(|s| s.address == address)
    }

    /// Mutable slot at an address
    #[inline]
    pub fn slot_mut(&mut self, address: Address) -> Option<&mut Slot> {
        self.slots.iter_mut().find(|s| s.address == address)
    }

    /// Slot by id
    #[inline]
    #[must_use]
    pub fn slot_by_id(&self, slot_id: SlotId) -> Option<&Slot> {
        self.slots.iter().find(|s| s.id == slot_id)
    }
}
