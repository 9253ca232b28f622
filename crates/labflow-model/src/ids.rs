//! Database-style identifiers
//!
//! Every persisted record is keyed by an `i64` assigned by the store.
//! Each kind of record gets its own newtype so ids cannot be mixed up.

use serde::{Deserialize, Serialize};

/// Declares a transparent integer record id
macro_rules! record_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(
            Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
        )]
        #[serde(transparent)]
        pub struct $name(pub i64);

        impl $name {
            /// Raw numeric value
            #[inline]
            #[must_use]
            pub fn get(self) -> i64 {
                self.0
            }
        }

        impl From<i64> for $name {
            fn from(value: i64) -> Self {
                Self(value)
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

record_id!(
    /// Labware (container) identifier
    LabwareId
);
record_id!(
    /// Slot identifier, unique across all labware
    SlotId
);
record_id!(
    /// Sample identifier
    SampleId
);
record_id!(
    /// Originating tissue identifier
    TissueId
);
record_id!(
    /// Bio-state identifier
    BioStateId
);
record_id!(
    /// Plan operation identifier
    PlanId
);
record_id!(
    /// Plan action identifier
    PlanActionId
);
record_id!(
    /// Operation type identifier
    OperationTypeId
);
record_id!(
    /// Recorded operation identifier
    OperationId
);
record_id!(
    /// Recorded action identifier
    ActionId
);
record_id!(
    /// Reusable comment identifier
    CommentId
);
record_id!(
    /// Slot region identifier
    RegionId
);
record_id!(
    /// Work (tracking record) identifier
    WorkId
);
