//! labflow Confirm
//!
//! Reconciles recorded plans with what the lab reports it actually did.
//! Two-phase design:
//! 1. **Validation Phase**: check the whole request, collect every problem
//! 2. **Execution Phase**: apply a clean request inside one transaction
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use labflow_confirm::prelude::*;
//!
//! let service = ConfirmService::new(store);
//! let request = ConfirmationRequest::new(vec![
//!     LabwareConfirmation::sections("STAN-100", vec![
//!         ConfirmedSection::new("A1".parse()?, sample_id, 12),
//!     ]),
//! ]);
//!
//! match service.confirm(&User::new("user1"), &request) {
//!     Ok(result) => println!("{} operations", result.operations.len()),
//!     Err(e) if e.is_user_correctable() => eprintln!("{e}"),
//!     Err(e) => return Err(e.into()),
//! }
//! ```

pub mod config;
pub mod error;
pub mod execution;
pub mod request;
pub mod service;
pub mod validation;

// Re-exports
pub use config::EngineConfig;
pub use error::{ConfirmError, ValidationFailure};
pub use request::{
    ActionSelection, AddressComment, CancelledAction, ConfirmationRequest, ConfirmationResult,
    ConfirmedSection, LabwareConfirmation,
};
pub use service::ConfirmService;

/// Commonly used types
pub mod prelude {
    pub use crate::config::EngineConfig;
    pub use crate::error::{ConfirmError, ValidationFailure};
    pub use crate::execution::{
        AnnotationRecorder, Reconciler, Resolution, SampleIdentityResolver, SectionWatermarks,
    };
    pub use crate::request::{
        ActionSelection, AddressComment, CancelledAction, ConfirmationRequest,
        ConfirmationResult, ConfirmedSection, LabwareConfirmation,
    };
    pub use crate::service::ConfirmService;
    pub use crate::validation::{PlanLookup, ValidatedRequest, Validator};
    pub use labflow_model::User;
}

/// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
