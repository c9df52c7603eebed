//! Bookkeeping of a single bulk job.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{CompanyId, JobId, MembershipOp};

/// How a bulk job ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum JobOutcome {
    /// Every batch settled and the terminal sentinel was acknowledged.
    Completed,
    /// The progress channel was lost; later batches were not dispatched.
    Interrupted,
}

/// A per-item remote failure. Recorded, never fatal to the job.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemFailure {
    /// Company whose request failed.
    pub company_id: CompanyId,

    /// Rendered cause.
    pub cause: String,
}

/// Summary of a bulk job once its task has ended.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobReport {
    /// Job identifier.
    pub job_id: JobId,

    /// Operation applied to each item.
    pub op: MembershipOp,

    /// Number of selected items.
    pub total_items: usize,

    /// Number of batches in the plan.
    pub total_batches: usize,

    /// Number of batches whose requests all settled.
    pub batches_completed: usize,

    /// Number of items whose request succeeded.
    pub succeeded: usize,

    /// Items whose request failed.
    pub failures: Vec<ItemFailure>,

    /// How the job ended.
    pub outcome: JobOutcome,

    /// When the job started.
    pub started_at: DateTime<Utc>,

    /// When the job ended.
    pub finished_at: DateTime<Utc>,
}

impl JobReport {
    /// Create a report for a job that is about to start.
    pub fn new(job_id: JobId, op: MembershipOp, total_items: usize, total_batches: usize) -> Self {
        let now = Utc::now();
        Self {
            job_id,
            op,
            total_items,
            total_batches,
            batches_completed: 0,
            succeeded: 0,
            failures: Vec::new(),
            outcome: JobOutcome::Completed,
            started_at: now,
            finished_at: now,
        }
    }

    /// Record a failed item.
    pub fn record_failure(&mut self, company_id: CompanyId, cause: impl Into<String>) {
        self.failures.push(ItemFailure {
            company_id,
            cause: cause.into(),
        });
    }

    /// Mark the job as finished with the given outcome.
    pub fn finish(&mut self, outcome: JobOutcome) {
        self.outcome = outcome;
        self.finished_at = Utc::now();
    }

    /// Number of items whose request was issued and settled.
    pub fn settled(&self) -> usize {
        self.succeeded + self.failures.len()
    }

    /// Returns true if the job reached its terminal event.
    pub fn is_completed(&self) -> bool {
        self.outcome == JobOutcome::Completed
    }

    /// Duration in milliseconds between start and finish.
    pub fn duration_ms(&self) -> i64 {
        (self.finished_at - self.started_at).num_milliseconds()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_report_counts() {
        let mut report = JobReport::new(JobId::generate(), MembershipOp::add("x"), 3, 1);
        report.succeeded = 2;
        report.record_failure(CompanyId::new(5), "HTTP 400");
        report.batches_completed = 1;
        report.finish(JobOutcome::Completed);

        assert_eq!(report.settled(), 3);
        assert!(report.is_completed());
        assert!(report.duration_ms() >= 0);
        assert_eq!(report.failures[0].company_id, CompanyId::new(5));
    }

    #[test]
    fn test_interrupted_is_not_completed() {
        let mut report = JobReport::new(JobId::generate(), MembershipOp::remove("c"), 10, 2);
        report.finish(JobOutcome::Interrupted);
        assert!(!report.is_completed());
    }
}
