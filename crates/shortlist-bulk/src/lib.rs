//! Batched list-membership jobs with streamed progress.
//!
//! A [`BulkCoordinator`] takes a selection of companies and a
//! [`MembershipOp`](shortlist_core::MembershipOp), applies the operation to
//! every company in fixed-size batches through a [`CollectionApi`], and
//! reports progress over a [`ProgressChannel`] after each batch. The caller
//! consumes the acknowledged progress events as a stream from the returned
//! [`BulkJob`].

pub mod api;
pub mod channel;
pub mod coordinator;
pub mod error;

pub use api::CollectionApi;
pub use channel::{LoopbackChannel, LoopbackConnector, ProgressChannel, ProgressConnector};
pub use coordinator::{BulkCoordinator, BulkJob};
pub use error::{BulkError, ChannelError};
