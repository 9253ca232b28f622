//! Samples and bio-states
//!
//! A [`Sample`] is immutable once recorded. Cutting a new section or moving
//! a sample into a new bio-state always produces a new sample identity.

use crate::ids::{BioStateId, SampleId, TissueId};
use serde::{Deserialize, Serialize};

/// Processing stage of a sample, e.g. `Tissue` or `RNA`
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BioState {
    /// Bio-state id
    pub id: BioStateId,
    /// Bio-state name
    pub name: String,
}

impl BioState {
    /// Create a bio-state
    #[inline]
    #[must_use]
    pub fn new(id: impl Into<BioStateId>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
        }
    }
}

/// A physical piece of tissue, either a whole block or a numbered section
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Sample {
    /// Sample id
    pub id: SampleId,
    /// Tissue the sample comes from
    pub tissue_id: TissueId,
    /// `None` for an unsectioned block
    pub section: Option<i32>,
    /// Biological state
    pub bio_state: BioState,
}

impl Sample {
    /// Whether this sample has the given tissue, section and bio-state
    #[inline]
    #[must_use]
    pub fn matches(&self, tissue_id: TissueId, section: Option<i32>, bio_state: &BioState) -> bool {
        self.tissue_id == tissue_id && self.section == section && self.bio_state.id == bio_state.id
    }
}
