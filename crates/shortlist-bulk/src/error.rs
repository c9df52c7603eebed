//! Error types for bulk jobs and progress channels.

use thiserror::Error;

use shortlist_core::CompanyId;

/// Errors raised by a progress channel.
#[derive(Debug, Error)]
pub enum ChannelError {
    /// Could not open the channel.
    #[error("connection failed: {0}")]
    Connect(String),

    /// The peer closed the channel.
    #[error("channel closed")]
    Closed,

    /// Transport-level failure on an open channel.
    #[error("transport error: {0}")]
    Transport(String),
}

/// Errors raised by the bulk coordinator.
#[derive(Debug, Error)]
pub enum BulkError {
    /// The progress channel could not be opened; nothing was mutated.
    #[error("progress channel could not be established: {0}")]
    ChannelEstablishmentFailed(#[source] ChannelError),

    /// A single item's remote request failed. Logged, never returned from a job.
    #[error("operation failed for company {company_id}: {cause}")]
    ItemOperationFailed { company_id: CompanyId, cause: String },

    /// Batch size must be at least one.
    #[error("invalid batch size: {0}")]
    InvalidBatchSize(usize),

    /// The job task ended abnormally.
    #[error("job task failed: {0}")]
    Join(String),
}

