//! labflow Model
//!
//! Passive records for labware, samples, plans and the operations that
//! confirm them.
//!
//! # Core Concepts
//!
//! - [`Labware`]: a container with addressable [`Slot`]s
//! - [`Sample`]: an immutable piece of tissue in a [`BioState`]
//! - [`PlanOperation`]: proposed transfers, recorded before the lab acts
//! - [`Operation`]: the persisted record of confirmed work
//!
//! # Example
//!
//! ```rust
//! use labflow_model::{Address, LabwareType};
//!
//! let slide = LabwareType::new("Slide", 4, 1);
//! let a1: Address = "A1".parse().unwrap();
//! assert!(slide.contains(a1));
//! assert!(!slide.contains("A2".parse().unwrap()));
//! ```

#![warn(unreachable_pub)]
#![warn(missing_docs)]

mod address;
mod annotation;
mod ids;
mod labware;
mod operation;
mod plan;
mod sample;
mod work;

pub use address::{Address, AddressError};
pub use annotation::{Comment, OperationComment, SamplePosition, SlotRegion};
pub use ids::{
    ActionId, BioStateId, CommentId, LabwareId, OperationId, OperationTypeId, PlanActionId,
    PlanId, RegionId, SampleId, SlotId, TissueId, WorkId,
};
pub use labware::{Labware, LabwareState, LabwareType, Slot};
pub use operation::{
    Action, Measurement, NewOperation, Operation, OperationNote, OperationType, PendingAction,
};
pub use plan::{PlanAction, PlanNote, PlanOperation, SlotRef};
pub use sample::{BioState, Sample};
pub use work::{User, Work, WorkStatus};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
