//! Validation Phase
//!
//! Every rule a confirmation must satisfy is checked here, against the same
//! transaction the reconciler will later write through. Validation produces a
//! [`ValidatedRequest`] carrying the loaded records and the full list of
//! problems.
//!
//! # Two-Phase Confirmation
//!
//! 1. **Validation** (this module):
//!    - Resolve barcodes and check labware state
//!    - Find the unique plan per labware
//!    - Check sections, cancellations, regions, comments and work
//!    - Never write
//!
//! 2. **Execution** (execution module):
//!    - Only runs on a request with zero problems
//!    - Any surprise is an integrity fault, not a user problem

pub mod plan_lookup;
pub mod validator;

pub use plan_lookup::PlanLookup;
pub use validator::{ValidatedRequest, Validator};
