//! Core domain errors.

use thiserror::Error;

/// Core domain errors for Shortlist.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Batch size must be at least one.
    #[error("Invalid batch size: {0} (must be > 0)")]
    InvalidBatchSize(usize),

    /// Page size must be at least one.
    #[error("Invalid page size: {0} (must be > 0)")]
    InvalidPageSize(usize),

    /// Invalid input.
    #[error("Invalid input: {0}")]
    InvalidInput(String),
}
