//! Address comment recording
//!
//! Fans an address-level comment out over whatever the slot holds once
//! confirmation has placed its samples: one row per sample, or a single row
//! with no sample for an empty slot.

use crate::error::ConfirmError;
use crate::request::AddressComment;
use labflow_model::{Comment, CommentId, Labware, OperationComment, OperationId};
use labflow_store::LabWrite;
use std::collections::HashMap;

/// Annotation recorder
#[derive(Debug, Clone, Copy, Default)]
pub struct AnnotationRecorder;

impl AnnotationRecorder {
    /// Record `pairs` against the current state of `labware`
    ///
    /// `operation_id` is `None` for discarded labware. Returns the number of
    /// rows written.
    ///
    /// # Errors
    /// A comment id missing from `comments` or an address with no slot is an
    /// integrity fault; validation rules both out.
    pub fn record<W: LabWrite + ?Sized>(
        tx: &mut W,
        pairs: &[AddressComment],
        operation_id: Option<OperationId>,
        labware: &Labware,
        comments: &HashMap<CommentId, Comment>,
    ) -> Result<usize, ConfirmError> {
        if pairs.is_empty() {
            return Ok(0);
        }
        let mut rows = Vec::new();
        for pair in pairs {
            let comment = comments.get(&pair.comment_id).ok_or_else(|| {
                ConfirmError::integrity(format!("comment {} was not loaded", pair.comment_id))
            })?;
            let slot = labware.slot(pair.address).ok_or_else(|| {
                ConfirmError::integrity(format!(
                    "labware {} has no slot {}",
                    labware.barcode, pair.address
                ))
            })?;

            if slot.samples.is_empty() {
                rows.push(OperationComment {
                    comment: comment.clone(),
                    operation_id,
                    sample_id: None,
                    slot_id: Some(slot.id),
                    labware_id: labware.id,
                });
            } else {
                rows.extend(slot.samples.iter().map(|sample| OperationComment {
                    comment: comment.clone(),
                    operation_id,
                    sample_id: Some(sample.id),
                    slot_id: Some(slot.id),
                    labware_id: labware.id,
                }));
            }
        }

        let count = rows.len();
        tx.save_operation_comments(rows)?;
        tracing::debug!(barcode = %labware.barcode, rows = count, "recorded address comments");
        Ok(count)
    }
}
