//! Confirmation service
//!
//! The entry point callers use. One call is one transaction:
//! begin, validate, reconcile, commit. Any failure drops the transaction, so
//! nothing from a rejected request is ever visible.

use crate::config::EngineConfig;
use crate::error::ConfirmError;
use crate::execution::Reconciler;
use crate::request::{ConfirmationRequest, ConfirmationResult};
use crate::validation::{ValidatedRequest, Validator};
use chrono::{DateTime, Utc};
use labflow_model::User;
use labflow_store::LabStore;

/// Plan confirmation service over a store
#[derive(Debug)]
pub struct ConfirmService<S> {
    store: S,
    config: EngineConfig,
}

impl<S: LabStore> ConfirmService<S> {
    /// Create a service with default configuration
    #[inline]
    #[must_use]
    pub fn new(store: S) -> Self {
        Self::with_config(store, EngineConfig::default())
    }

    /// Create a service with the given configuration
    #[inline]
    #[must_use]
    pub fn with_config(store: S, config: EngineConfig) -> Self {
        Self { store, config }
    }

    /// Underlying store
    #[inline]
    #[must_use]
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Validate without writing anything
    #[tracing::instrument(skip_all, fields(labware = request.labware.len()))]
    pub fn validate(&self, request: &ConfirmationRequest) -> ValidatedRequest {
        let tx = self.store.begin();
        Validator::new(self.config.clone()).validate(&tx, request)
    }

    /// Validate and apply a confirmation as one transaction
    ///
    /// # Errors
    /// - [`ConfirmError::Validation`] with every problem found; nothing written
    /// - [`ConfirmError::Integrity`] if execution hits a state validation
    ///   should have ruled out
    /// - [`ConfirmError::Store`] on a storage failure, including a commit
    ///   conflict with a concurrent confirmation
    #[tracing::instrument(skip_all, fields(user = %user.username, labware = request.labware.len()))]
    pub fn confirm(
        &self,
        user: &User,
        request: &ConfirmationRequest,
    ) -> Result<ConfirmationResult, ConfirmError> {
        self.confirm_at(user, request, Utc::now())
    }

    /// As [`confirm`](Self::confirm), stamping operations with `performed`
    ///
    /// # Errors
    /// Same as [`confirm`](Self::confirm)
    pub fn confirm_at(
        &self,
        user: &User,
        request: &ConfirmationRequest,
        performed: DateTime<Utc>,
    ) -> Result<ConfirmationResult, ConfirmError> {
        let mut tx = self.store.begin();

        let validated = Validator::new(self.config.clone()).validate(&tx, request);
        if let Some(failure) = validated.failure() {
            tracing::warn!(problems = failure.problems().len(), "confirmation rejected");
            return Err(failure.into());
        }

        let result = Reconciler::new(&self.config, user)
            .with_performed(performed)
            .reconcile(&mut tx, request, &validated)
            .map_err(|e| {
                if let ConfirmError::Integrity(message) = &e {
                    tracing::error!(%message, "integrity fault, rolling back");
                }
                e
            })?;

        self.store.commit(tx)?;
        tracing::info!(
            operations = result.operations.len(),
            labware = result.labware.len(),
            "confirmation committed"
        );
        Ok(result)
    }
}
