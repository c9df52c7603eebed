//! Membership operations and the batch plan of a bulk job.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::CoreError;
use crate::ids::{CollectionId, CompanyId};

/// Default number of items dispatched together in one batch.
pub const DEFAULT_BATCH_SIZE: usize = 100;

/// A list-membership change applied to every selected company.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MembershipOp {
    /// Add to the collection with this name.
    Add { list_name: String },
    /// Remove from the collection with this id.
    Remove { list_id: CollectionId },
}

impl MembershipOp {
    /// Add to a named list.
    pub fn add(list_name: impl Into<String>) -> Self {
        Self::Add {
            list_name: list_name.into(),
        }
    }

    /// Remove from a list.
    pub fn remove(list_id: impl Into<CollectionId>) -> Self {
        Self::Remove {
            list_id: list_id.into(),
        }
    }
}

impl fmt::Display for MembershipOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Add { list_name } => write!(f, "add to '{}'", list_name),
            Self::Remove { list_id } => write!(f, "remove from {}", list_id),
        }
    }
}

/// The ordered partition of a selection into fixed-size batches.
///
/// Batches are contiguous and non-overlapping. Every batch holds
/// `batch_size` items except possibly the last one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchPlan {
    items: Vec<CompanyId>,
    batch_size: usize,
}

impl BatchPlan {
    /// Build a plan over `items` with the given batch size.
    pub fn new(items: Vec<CompanyId>, batch_size: usize) -> Result<Self, CoreError> {
        if batch_size == 0 {
            return Err(CoreError::InvalidBatchSize(batch_size));
        }
        Ok(Self { items, batch_size })
    }

    /// Number of items across all batches.
    pub fn total_items(&self) -> usize {
        self.items.len()
    }

    /// Configured batch size.
    pub fn batch_size(&self) -> usize {
        self.batch_size
    }

    /// Number of batches, `ceil(total_items / batch_size)`.
    pub fn total_batches(&self) -> usize {
        self.items.len().div_ceil(self.batch_size)
    }

    /// Returns true if there is nothing to do.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Whether a caller should render a progress indicator for this plan.
    pub fn needs_progress_display(&self) -> bool {
        self.items.len() > self.batch_size
    }

    /// Iterate the batches in selection order.
    pub fn batches(&self) -> impl Iterator<Item = &[CompanyId]> + '_ {
        self.items.chunks(self.batch_size)
    }

    /// Completion percentage once `settled` items have settled.
    ///
    /// Always lands on exactly 100.0 when every item has settled.
    pub fn percent_after(&self, settled: usize) -> f64 {
        if self.items.is_empty() {
            return 100.0;
        }
        let settled = settled.min(self.items.len());
        // Share of items, not of batches: with a short last batch the
        // intermediate values differ from batches_completed / total_batches.
        (settled * 100) as f64 / self.items.len() as f64
    }
}
