//! Reconciler
//!
//! Applies a validated confirmation inside a transaction. Each labware either
//! takes the discard path (cancelled, or nothing left to do) or the confirm
//! path (samples placed, one operation recorded). Block watermarks and work
//! linkage are applied once after every labware has been processed.

use crate::config::EngineConfig;
use crate::error::ConfirmError;
use crate::execution::annotation::AnnotationRecorder;
use crate::execution::identity::SampleIdentityResolver;
use crate::execution::watermark::SectionWatermarks;
use crate::request::{
    ActionSelection, ConfirmationRequest, ConfirmationResult, ConfirmedSection,
    LabwareConfirmation,
};
use crate::validation::ValidatedRequest;
use chrono::{DateTime, Utc};
use labflow_model::{
    Address, Comment, Labware, Measurement, NewOperation, Operation, OperationComment,
    OperationId, OperationNote, PendingAction, PlanAction, PlanOperation, SampleId,
    SamplePosition, SlotId, SlotRegion, User,
};
use labflow_store::LabWrite;
use std::collections::BTreeSet;

/// A plan action that survived cancellation, with the section that confirmed it
#[derive(Debug, Clone, Copy)]
struct Selected<'a> {
    action: &'a PlanAction,
    confirmed: Option<&'a ConfirmedSection>,
}

/// Records that need the operation id before they can be written
#[derive(Debug, Default)]
struct Staged {
    thickness: Vec<(SampleId, SlotId, String)>,
    positions: Vec<(SlotId, SampleId, SlotRegion)>,
    comments: Vec<(Comment, SampleId, SlotId)>,
}

/// Applies validated confirmations
#[derive(Debug, Clone)]
pub struct Reconciler<'a> {
    config: &'a EngineConfig,
    user: &'a User,
    performed: DateTime<Utc>,
}

impl<'a> Reconciler<'a> {
    /// Create a reconciler acting as `user`, stamping operations with now
    #[must_use]
    pub fn new(config: &'a EngineConfig, user: &'a User) -> Self {
        Self {
            config,
            user,
            performed: Utc::now(),
        }
    }

    /// With a fixed performed timestamp
    #[inline]
    #[must_use]
    pub fn with_performed(mut self, performed: DateTime<Utc>) -> Self {
        self.performed = performed;
        self
    }

    /// Apply `request` through `tx`
    ///
    /// `validated` must be the problem-free result of validating `request`
    /// against the same transaction.
    ///
    /// # Errors
    /// Returns [`ConfirmError::Integrity`] when the request and the validated
    /// records disagree, or the store error from any write. Either way the
    /// caller must drop `tx`.
    pub fn reconcile<W: LabWrite + ?Sized>(
        &self,
        tx: &mut W,
        request: &ConfirmationRequest,
        validated: &ValidatedRequest,
    ) -> Result<ConfirmationResult, ConfirmError> {
        let mut watermarks = SectionWatermarks::new();
        let mut operations = Vec::new();
        let mut touched = Vec::with_capacity(request.labware.len());

        for conf in &request.labware {
            let labware = validated.labware_for(&conf.barcode).ok_or_else(|| {
                ConfirmError::integrity(format!("labware {} was not loaded", conf.barcode))
            })?;
            let plan = validated.plan_for(labware.id).ok_or_else(|| {
                ConfirmError::integrity(format!("no plan loaded for labware {}", labware.barcode))
            })?;
            touched.push(labware.id);

            let selected = if conf.cancelled {
                Vec::new()
            } else {
                select_actions(conf, labware, plan)?
            };

            if selected.is_empty() {
                self.discard(tx, conf, labware, validated)?;
            } else {
                let operation =
                    self.confirm(tx, conf, labware, plan, &selected, validated, &mut watermarks)?;
                operations.push(operation);
            }
        }

        watermarks.apply(tx)?;

        if let Some(work) = &validated.work {
            let ids: Vec<OperationId> = operations.iter().map(|op| op.id).collect();
            if !ids.is_empty() {
                tx.link_work(&work.work_number, &ids)?;
                tracing::info!(work_number = %work.work_number, operations = ids.len(), "linked work");
            }
        }

        let labware = touched
            .into_iter()
            .map(|id| {
                tx.labware(id).ok_or_else(|| {
                    ConfirmError::integrity(format!("labware {id} disappeared during confirmation"))
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(ConfirmationResult {
            operations,
            labware,
        })
    }

    fn discard<W: LabWrite + ?Sized>(
        &self,
        tx: &mut W,
        conf: &LabwareConfirmation,
        labware: &Labware,
        validated: &ValidatedRequest,
    ) -> Result<(), ConfirmError> {
        let mut discarded = labware.clone();
        discarded.discarded = true;
        tx.save_labware(&discarded)?;
        tracing::info!(barcode = %labware.barcode, "discarded labware");

        AnnotationRecorder::record(
            tx,
            &conf.address_comments,
            None,
            &discarded,
            &validated.comments,
        )?;
        Ok(())
    }

    #[allow(clippy::too_many_arguments)]
    fn confirm<W: LabWrite + ?Sized>(
        &self,
        tx: &mut W,
        conf: &LabwareConfirmation,
        labware: &Labware,
        plan: &PlanOperation,
        selected: &[Selected<'_>],
        validated: &ValidatedRequest,
        watermarks: &mut SectionWatermarks,
    ) -> Result<Operation, ConfirmError> {
        let mut working = labware.clone();
        let mut changed: BTreeSet<Address> = BTreeSet::new();
        let mut actions = Vec::with_capacity(selected.len());
        let mut staged = Staged::default();

        for sel in selected {
            let action = sel.action;
            let address = action.destination.address;
            let section = sel
                .confirmed
                .and_then(|c| c.new_section)
                .or(action.new_section);

            let destination = working.slot(address).ok_or_else(|| {
                ConfirmError::integrity(format!(
                    "labware {} has no slot {address}",
                    labware.barcode
                ))
            })?;
            let resolution = SampleIdentityResolver::resolve(
                tx,
                &action.sample,
                destination,
                section,
                action.new_bio_state.as_ref(),
            )?;
            tracing::debug!(
                barcode = %labware.barcode,
                %address,
                plan_action = %action.id,
                ?resolution,
                "resolved destination sample"
            );
            let sample = resolution.into_sample();

            if let Some(slot) = working.slot_mut(address) {
                if slot.add_sample(sample.clone()) {
                    changed.insert(address);
                }
            }

            if let Some(thickness) = &action.thickness {
                staged
                    .thickness
                    .push((sample.id, action.destination.slot_id, thickness.clone()));
            }
            if let Some(section) = sel.confirmed {
                if let Some(region) = section.region.as_deref().and_then(|n| validated.region(n)) {
                    staged
                        .positions
                        .push((action.destination.slot_id, sample.id, region.clone()));
                }
                for comment_id in &section.comment_ids {
                    let comment = validated.comments.get(comment_id).ok_or_else(|| {
                        ConfirmError::integrity(format!("comment {comment_id} was not loaded"))
                    })?;
                    staged
                        .comments
                        .push((comment.clone(), sample.id, action.destination.slot_id));
                }
            }

            if let Some(n) = sample.section {
                let from_block = tx
                    .slot(action.source.slot_id)
                    .is_some_and(|slot| slot.is_block());
                if from_block {
                    watermarks.observe(action.source.slot_id, n);
                }
            }

            actions.push(PendingAction {
                source_slot_id: action.source.slot_id,
                destination_slot_id: action.destination.slot_id,
                sample,
                source_sample: action.sample.clone(),
            });
        }

        let slots: Vec<_> = changed
            .iter()
            .filter_map(|address| working.slot(*address).cloned())
            .collect();
        tx.save_slots(&slots)?;

        let operation = tx.create_operation(NewOperation {
            operation_type: plan.operation_type.clone(),
            username: self.user.username.clone(),
            actions,
            plan_operation_id: Some(plan.id),
            performed: self.performed,
        })?;
        tracing::info!(
            barcode = %labware.barcode,
            operation_id = %operation.id,
            actions = operation.actions.len(),
            "recorded operation"
        );

        self.write_staged(tx, staged, operation.id, labware)?;

        let notes: Vec<OperationNote> = tx
            .plan_notes(plan.id, labware.id)
            .into_iter()
            .map(|note| OperationNote {
                operation_id: operation.id,
                labware_id: labware.id,
                name: note.name,
                value: note.value,
            })
            .collect();
        if !notes.is_empty() {
            tx.save_operation_notes(notes)?;
        }

        let current = tx.labware(labware.id).ok_or_else(|| {
            ConfirmError::integrity(format!("labware {} disappeared", labware.barcode))
        })?;
        AnnotationRecorder::record(
            tx,
            &conf.address_comments,
            Some(operation.id),
            &current,
            &validated.comments,
        )?;

        Ok(operation)
    }

    fn write_staged<W: LabWrite + ?Sized>(
        &self,
        tx: &mut W,
        staged: Staged,
        operation_id: OperationId,
        labware: &Labware,
    ) -> Result<(), ConfirmError> {
        if !staged.thickness.is_empty() {
            let measurements = staged
                .thickness
                .into_iter()
                .map(|(sample_id, slot_id, value)| Measurement {
                    name: self.config.thickness_measurement.clone(),
                    value,
                    sample_id,
                    slot_id,
                    operation_id,
                })
                .collect();
            tx.save_measurements(measurements)?;
        }
        if !staged.positions.is_empty() {
            let positions = staged
                .positions
                .into_iter()
                .map(|(slot_id, sample_id, region)| SamplePosition {
                    slot_id,
                    sample_id,
                    region,
                    operation_id,
                })
                .collect();
            tx.save_sample_positions(positions)?;
        }
        if !staged.comments.is_empty() {
            let comments = staged
                .comments
                .into_iter()
                .map(|(comment, sample_id, slot_id)| OperationComment {
                    comment,
                    operation_id: Some(operation_id),
                    sample_id: Some(sample_id),
                    slot_id: Some(slot_id),
                    labware_id: labware.id,
                })
                .collect();
            tx.save_operation_comments(comments)?;
        }
        Ok(())
    }
}

/// Plan actions to carry out for one labware, in plan or request order
fn select_actions<'a>(
    conf: &'a LabwareConfirmation,
    labware: &Labware,
    plan: &'a PlanOperation,
) -> Result<Vec<Selected<'a>>, ConfirmError> {
    match &conf.selection {
        ActionSelection::Sections { sections } => sections
            .iter()
            .map(|section| {
                let sample_id = section.sample_id.ok_or_else(|| {
                    ConfirmError::integrity("confirmed section without sample id")
                })?;
                let action = plan
                    .find_action(labware.id, section.destination_address, sample_id)
                    .ok_or_else(|| {
                        ConfirmError::integrity(format!(
                            "plan action for sample {sample_id} at {} in {} vanished",
                            section.destination_address, labware.barcode
                        ))
                    })?;
                Ok(Selected {
                    action,
                    confirmed: Some(section),
                })
            })
            .collect(),
        ActionSelection::Planned { cancelled } => Ok(plan
            .actions_into(labware.id)
            .filter(|action| !cancelled.iter().any(|c| c.matches(action)))
            .map(|action| Selected {
                action,
                confirmed: None,
            })
            .collect()),
    }
}
