//! Shortlist Core Domain Types
//!
//! This crate contains pure domain types with no dependencies on:
//! - HTTP or WebSocket transports
//! - The async runtime
//!
//! All types here represent the core domain of Shortlist: companies,
//! collections, selections and the bookkeeping of bulk membership jobs.

pub mod batch;
pub mod error;
pub mod ids;
pub mod job;
pub mod model;
pub mod progress;
pub mod view;

// Re-export commonly used types
pub use batch::{BatchPlan, MembershipOp, DEFAULT_BATCH_SIZE};
pub use error::CoreError;
pub use ids::{CollectionId, CompanyId, JobId};
pub use job::{ItemFailure, JobOutcome, JobReport};
pub use model::{CollectionMetadata, CollectionPage, Company, CompanyBatch};
pub use progress::ProgressEvent;
pub use view::{CollectionView, Reconciliation, Selection, DEFAULT_PAGE_SIZE};

/// Name of the collection that backs the "like" action.
pub const LIKED_LIST_NAME: &str = "Liked Companies List";
