//! Bulk coordinator - applies a membership change to many companies.
//!
//! Batches run strictly one after another. Inside a batch every request is
//! in flight at once and the batch ends only when all of them have settled.
//! Per-item failures are logged and recorded but never stop the job.

use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

use futures_util::future::join_all;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_stream::wrappers::UnboundedReceiverStream;
use tokio_stream::{Stream, StreamExt};
use tracing::{debug, info, warn};

use shortlist_core::{
    BatchPlan, CompanyId, JobId, JobOutcome, JobReport, MembershipOp, ProgressEvent,
    DEFAULT_BATCH_SIZE,
};

use crate::api::CollectionApi;
use crate::channel::{ProgressChannel, ProgressConnector};
use crate::error::{BulkError, ChannelError};

/// Runs bulk membership jobs against a remote API.
pub struct BulkCoordinator<A: ?Sized> {
    api: Arc<A>,
    batch_size: usize,
}

impl<A> BulkCoordinator<A>
where
    A: CollectionApi + ?Sized + 'static,
{
    /// Create a coordinator with the default batch size.
    pub fn new(api: Arc<A>) -> Self {
        Self {
            api,
            batch_size: DEFAULT_BATCH_SIZE,
        }
    }

    /// Builder method to set the batch size.
    pub fn with_batch_size(mut self, batch_size: usize) -> Result<Self, BulkError> {
        if batch_size == 0 {
            return Err(BulkError::InvalidBatchSize(batch_size));
        }
        self.batch_size = batch_size;
        Ok(self)
    }

    /// Configured batch size.
    pub fn batch_size(&self) -> usize {
        self.batch_size
    }

    /// Start a job applying `op` to every company in `selection`.
    ///
    /// The progress channel is opened before any request is issued; if that
    /// fails the job is aborted with [`BulkError::ChannelEstablishmentFailed`]
    /// and nothing is mutated. An empty selection opens no channel and
    /// yields a job with no events.
    pub async fn run<C>(
        &self,
        selection: Vec<CompanyId>,
        op: MembershipOp,
        connector: &C,
    ) -> Result<BulkJob, BulkError>
    where
        C: ProgressConnector + ?Sized,
    {
        let job_id = JobId::generate();
        let plan = BatchPlan::new(selection, self.batch_size)
            .map_err(|_| BulkError::InvalidBatchSize(self.batch_size))?;
        let (events_tx, events_rx) = mpsc::unbounded_channel();

        if plan.is_empty() {
            debug!(job_id = %job_id, op = %op, "Empty selection, nothing to do");
            let mut report = JobReport::new(job_id.clone(), op, 0, 0);
            report.finish(JobOutcome::Completed);
            drop(events_tx);
            return Ok(BulkJob {
                job_id,
                total_items: 0,
                total_batches: 0,
                show_progress: false,
                events: UnboundedReceiverStream::new(events_rx),
                handle: tokio::spawn(async move { report }),
            });
        }

        let channel = connector.connect().await.map_err(|e| {
            warn!(job_id = %job_id, error = %e, "Failed to open progress channel, aborting job");
            BulkError::ChannelEstablishmentFailed(e)
        })?;

        info!(
            job_id = %job_id,
            op = %op,
            items = plan.total_items(),
            batches = plan.total_batches(),
            batch_size = plan.batch_size(),
            "Starting bulk job"
        );

        let total_items = plan.total_items();
        let total_batches = plan.total_batches();
        let show_progress = plan.needs_progress_display();

        let api = Arc::clone(&self.api);
        let handle = tokio::spawn(drive(api, channel, plan, op, job_id.clone(), events_tx));

        Ok(BulkJob {
            job_id,
            total_items,
            total_batches,
            show_progress,
            events: UnboundedReceiverStream::new(events_rx),
            handle,
        })
    }
}

/// Handle to a running bulk job.
///
/// Acknowledged progress events are available as a [`Stream`]; the stream
/// ends after the terminal event, or early if the progress channel is lost.
pub struct BulkJob {
    job_id: JobId,
    total_items: usize,
    total_batches: usize,
    show_progress: bool,
    events: UnboundedReceiverStream<ProgressEvent>,
    handle: JoinHandle<JobReport>,
}

impl BulkJob {
    pub fn id(&self) -> &JobId {
        &self.job_id
    }

    pub fn total_items(&self) -> usize {
        self.total_items
    }

    pub fn total_batches(&self) -> usize {
        self.total_batches
    }

    /// Whether the selection spans more than one batch, i.e. whether a
    /// progress indicator is worth rendering.
    pub fn shows_progress(&self) -> bool {
        self.show_progress
    }

    /// Wait for the next acknowledged progress event.
    pub async fn next_event(&mut self) -> Option<ProgressEvent> {
        self.events.next().await
    }

    /// Wait for the job task to end and return its report.
    ///
    /// Events not yet consumed are discarded.
    pub async fn wait(self) -> Result<JobReport, BulkError> {
        self.handle.await.map_err(|e| BulkError::Join(e.to_string()))
    }

    /// Drain every event, then wait for the report.
    pub async fn drain(mut self) -> Result<(Vec<ProgressEvent>, JobReport), BulkError> {
        let mut events = Vec::with_capacity(self.total_batches + 1);
        while let Some(event) = self.events.next().await {
            events.push(event);
        }
        let report = self.wait().await?;
        Ok((events, report))
    }
}

impl Stream for BulkJob {
    type Item = ProgressEvent;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        Pin::new(&mut self.events).poll_next(cx)
    }
}

/// Body of the job task.
async fn drive<A, Ch>(
    api: Arc<A>,
    mut channel: Ch,
    plan: BatchPlan,
    op: MembershipOp,
    job_id: JobId,
    events: mpsc::UnboundedSender<ProgressEvent>,
) -> JobReport
where
    A: CollectionApi + ?Sized,
    Ch: ProgressChannel,
{
    let mut report = JobReport::new(
        job_id.clone(),
        op.clone(),
        plan.total_items(),
        plan.total_batches(),
    );

    for (index, batch) in plan.batches().enumerate() {
        let outcomes = join_all(batch.iter().map(|&id| apply(api.as_ref(), id, &op))).await;

        for (&company_id, outcome) in batch.iter().zip(outcomes) {
            match outcome {
                Ok(()) => report.succeeded += 1,
                Err(e) => {
                    let failure = BulkError::ItemOperationFailed {
                        company_id,
                        cause: e.to_string(),
                    };
                    warn!(job_id = %job_id, batch = index, error = %failure, "Item operation failed");
                    report.record_failure(company_id, e.to_string());
                }
            }
        }
        report.batches_completed += 1;

        let event = ProgressEvent::progress(plan.percent_after(report.settled()));
        debug!(job_id = %job_id, batch = index, progress = event.percentage(), "Batch settled");

        if let Err(e) = exchange(&mut channel, event, &events).await {
            warn!(
                job_id = %job_id,
                batch = index,
                error = %e,
                "Progress channel lost, remaining batches not dispatched"
            );
            report.finish(JobOutcome::Interrupted);
            return report;
        }
    }

    if let Err(e) = exchange(&mut channel, ProgressEvent::Completed, &events).await {
        warn!(job_id = %job_id, error = %e, "Progress channel lost before completion was acknowledged");
        report.finish(JobOutcome::Interrupted);
        return report;
    }
    channel.close().await;

    report.finish(JobOutcome::Completed);
    info!(
        job_id = %job_id,
        succeeded = report.succeeded,
        failed = report.failures.len(),
        duration_ms = report.duration_ms(),
        "Bulk job completed"
    );
    report
}

/// Issue the remote request for one company.
async fn apply<A>(api: &A, company_id: CompanyId, op: &MembershipOp) -> Result<(), A::Error>
where
    A: CollectionApi + ?Sized,
{
    match op {
        MembershipOp::Add { list_name } => api.add_to_list(company_id, list_name).await,
        MembershipOp::Remove { list_id } => api.remove_from_list(company_id, list_id).await,
    }
}

/// Send one event and, once the peer acknowledges it, forward it to the caller.
///
/// Any recognized reply counts as the acknowledgement, but the caller always
/// receives the event the coordinator produced, so ordering and the single
/// terminal event do not depend on what the peer echoes.
async fn exchange<Ch>(
    channel: &mut Ch,
    event: ProgressEvent,
    events: &mpsc::UnboundedSender<ProgressEvent>,
) -> Result<(), ChannelError>
where
    Ch: ProgressChannel + ?Sized,
{
    channel.send(&event).await?;
    match channel.recv().await {
        Some(Ok(ack)) => {
            if ack != event {
                debug!(sent = ?event, received = ?ack, "Peer acknowledged with a different event");
            }
            // The caller may have stopped listening; the job still runs to the end.
            let _ = events.send(event);
            Ok(())
        }
        Some(Err(e)) => Err(e),
        None => Err(ChannelError::Closed),
    }
}
