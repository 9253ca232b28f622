//! Execution Phase
//!
//! Only ever handed a request that validated cleanly. Nothing here reports
//! user problems; anything unexpected is a [`ConfirmError::Integrity`]
//! fault and the transaction is abandoned.
//!
//! [`ConfirmError::Integrity`]: crate::error::ConfirmError::Integrity

pub mod annotation;
pub mod identity;
pub mod reconciler;
pub mod watermark;

pub use annotation::AnnotationRecorder;
pub use identity::{Resolution, SampleIdentityResolver};
pub use reconciler::Reconciler;
pub use watermark::SectionWatermarks;
