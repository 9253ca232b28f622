//! Sample identity resolution
//!
//! Decides which sample a plan action places into its destination: the
//! source itself, a matching sample already in the destination slot, or a
//! freshly minted one. Each (tissue, section, bio-state) triple ends up with
//! at most one sample per slot.

use labflow_model::{BioState, Sample, Slot};
use labflow_store::{LabWrite, StoreError};

/// How a destination sample was obtained
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    /// Section and bio-state unchanged; the source sample moves as is
    Source(Sample),
    /// An equivalent sample was already in the destination slot
    Reused(Sample),
    /// A new sample was created in the transaction
    Created(Sample),
}

impl Resolution {
    /// Sample placed in the destination
    #[inline]
    #[must_use]
    pub fn sample(&self) -> &Sample {
        match self {
            Self::Source(s) | Self::Reused(s) | Self::Created(s) => s,
        }
    }

    /// Take the placed sample
    #[inline]
    #[must_use]
    pub fn into_sample(self) -> Sample {
        match self {
            Self::Source(s) | Self::Reused(s) | Self::Created(s) => s,
        }
    }

    /// Check if a new sample row was written
    #[inline]
    #[must_use]
    pub fn is_created(&self) -> bool {
        matches!(self, Self::Created(_))
    }
}

/// Sample identity resolver
#[derive(Debug, Clone, Copy, Default)]
pub struct SampleIdentityResolver;

impl SampleIdentityResolver {
    /// Resolve the sample a plan action places into `destination`
    ///
    /// `destination` must reflect samples already placed earlier in the same
    /// confirmation, otherwise two actions with the same outcome would mint
    /// two samples.
    ///
    /// # Errors
    /// Returns the store error if a new sample cannot be created
    pub fn resolve<W: LabWrite + ?Sized>(
        tx: &mut W,
        source: &Sample,
        destination: &Slot,
        section: Option<i32>,
        bio_state: Option<&BioState>,
    ) -> Result<Resolution, StoreError> {
        let target_section = section.or(source.section);
        let target_bio_state = bio_state.unwrap_or(&source.bio_state);

        if source.matches(source.tissue_id, target_section, target_bio_state) {
            return Ok(Resolution::Source(source.clone()));
        }

        if let Some(existing) = destination
            .samples
            .iter()
            .find(|s| s.matches(source.tissue_id, target_section, target_bio_state))
        {
            return Ok(Resolution::Reused(existing.clone()));
        }

        let created = tx.create_sample(source.tissue_id, target_section, target_bio_state.clone())?;
        tracing::debug!(
            sample_id = %created.id,
            source_id = %source.id,
            section = ?created.section,
            bio_state = %created.bio_state.name,
            "created sample"
        );
        Ok(Resolution::Created(created))
    }
}
