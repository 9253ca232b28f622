//! Work tracking records and users

use crate::ids::{OperationId, WorkId};
use serde::{Deserialize, Serialize};

/// Lifecycle of a work record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkStatus {
    /// Not yet started
    Unstarted,
    /// In progress
    Active,
    /// Paused
    Paused,
    /// Completed
    Completed,
    /// Failed
    Failed,
    /// Withdrawn
    Withdrawn,
}

impl WorkStatus {
    /// Whether new operations may be linked to work in this state
    #[inline]
    #[must_use]
    pub fn is_usable(self) -> bool {
        matches!(self, Self::Unstarted | Self::Active)
    }
}

impl std::fmt::Display for WorkStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Unstarted => "unstarted",
            Self::Active => "active",
            Self::Paused => "paused",
            Self::Completed => "completed",
            Self::Failed => "failed",
            Self::Withdrawn => "withdrawn",
        };
        f.write_str(name)
    }
}

/// Tracking record that operations are billed against
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Work {
    /// Work id
    pub id: WorkId,
    /// Work number
    pub work_number: String,
    /// Current status
    pub status: WorkStatus,
    /// Operations linked to the work
    #[serde(default)]
    pub operation_ids: Vec<OperationId>,
}

impl Work {
    /// Link operations, ignoring ones already linked
    pub fn link(&mut self, operation_ids: impl IntoIterator<Item = OperationId>) {
        for id in operation_ids {
            if !self.operation_ids.contains(&id) {
                self.operation_ids.push(id);
            }
        }
    }
}

/// The person recording work
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct User {
    /// Login name
    pub username: String,
}

impl User {
    /// Create a user
    #[inline]
    #[must_use]
    pub fn new(username: impl Into<String>) -> Self {
        Self {
            username: username.into(),
        }
    }
}
