//! Client-side state of a paginated collection with a multi-row selection.

use std::collections::HashSet;

use crate::error::CoreError;
use crate::{
    CollectionId, CollectionPage, Company, CompanyId, ItemFailure, JobReport, MembershipOp,
};
use crate::LIKED_LIST_NAME;

/// Default number of rows shown per page.
pub const DEFAULT_PAGE_SIZE: usize = 25;

/// Ordered, duplicate-free set of selected companies.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Selection {
    order: Vec<CompanyId>,
    members: HashSet<CompanyId>,
}

impl Selection {
    /// Create an empty selection.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a selection from ids, keeping first-seen order.
    pub fn from_ids(ids: impl IntoIterator<Item = CompanyId>) -> Self {
        let mut selection = Self::new();
        for id in ids {
            selection.insert(id);
        }
        selection
    }

    /// Add an id. Returns false if it was already selected.
    pub fn insert(&mut self, id: CompanyId) -> bool {
        if self.members.insert(id) {
            self.order.push(id);
            true
        } else {
            false
        }
    }

    /// Remove an id. Returns false if it was not selected.
    pub fn remove(&mut self, id: CompanyId) -> bool {
        if self.members.remove(&id) {
            self.order.retain(|x| *x != id);
            true
        } else {
            false
        }
    }

    /// Flip the selection state of an id.
    pub fn toggle(&mut self, id: CompanyId) {
        if !self.remove(id) {
            self.insert(id);
        }
    }

    pub fn contains(&self, id: CompanyId) -> bool {
        self.members.contains(&id)
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    pub fn clear(&mut self) {
        self.order.clear();
        self.members.clear();
    }

    /// Selected ids in selection order.
    pub fn ids(&self) -> &[CompanyId] {
        &self.order
    }

    /// Copy of the selected ids, ready to hand to a bulk job.
    pub fn to_vec(&self) -> Vec<CompanyId> {
        self.order.clone()
    }
}

/// What changed locally after a bulk job completed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Reconciliation {
    /// Rows dropped from the current page.
    pub rows_removed: usize,
    /// Rows whose liked flag was set.
    pub rows_liked: usize,
    /// The caller should refetch the current page.
    pub refresh: bool,
}

/// Paginated view over one collection.
#[derive(Debug, Clone)]
pub struct CollectionView {
    collection_id: CollectionId,
    collection_name: Option<String>,
    offset: usize,
    page_size: usize,
    rows: Vec<Company>,
    total: usize,
    selection: Selection,
}

impl CollectionView {
    /// Create a view positioned on the first page of a collection.
    pub fn new(collection_id: impl Into<CollectionId>) -> Self {
        Self {
            collection_id: collection_id.into(),
            collection_name: None,
            offset: 0,
            page_size: DEFAULT_PAGE_SIZE,
            rows: Vec::new(),
            total: 0,
            selection: Selection::new(),
        }
    }

    /// Builder method to set the page size.
    pub fn with_page_size(mut self, page_size: usize) -> Result<Self, CoreError> {
        if page_size == 0 {
            return Err(CoreError::InvalidPageSize(page_size));
        }
        self.page_size = page_size;
        Ok(self)
    }

    pub fn collection_id(&self) -> &CollectionId {
        &self.collection_id
    }

    pub fn collection_name(&self) -> Option<&str> {
        self.collection_name.as_deref()
    }

    pub fn offset(&self) -> usize {
        self.offset
    }

    pub fn page_size(&self) -> usize {
        self.page_size
    }

    /// Zero-based index of the current page.
    pub fn page(&self) -> usize {
        self.offset / self.page_size
    }

    /// Number of pages needed for the whole collection.
    pub fn page_count(&self) -> usize {
        self.total.div_ceil(self.page_size)
    }

    pub fn rows(&self) -> &[Company] {
        &self.rows
    }

    pub fn total(&self) -> usize {
        self.total
    }

    pub fn selection(&self) -> &Selection {
        &self.selection
    }

    /// Switch to another collection.
    ///
    /// Moves back to the first page and drops rows and selection, which
    /// belong to the previous collection.
    pub fn set_collection(&mut self, collection_id: impl Into<CollectionId>) {
        let collection_id = collection_id.into();
        if collection_id == self.collection_id {
            return;
        }
        self.collection_id = collection_id;
        self.collection_name = None;
        self.offset = 0;
        self.rows.clear();
        self.total = 0;
        self.selection.clear();
    }

    /// Move to a page; `offset = page * page_size`.
    pub fn set_page(&mut self, page: usize, page_size: usize) -> Result<(), CoreError> {
        if page_size == 0 {
            return Err(CoreError::InvalidPageSize(page_size));
        }
        self.page_size = page_size;
        self.offset = page * page_size;
        Ok(())
    }

    /// Install a fetched page.
    ///
    /// Returns false and leaves the view untouched when the page belongs to
    /// a collection other than the one currently shown.
    pub fn apply_page(&mut self, page: CollectionPage) -> bool {
        if page.id != self.collection_id {
            return false;
        }
        self.collection_name = Some(page.collection_name);
        self.rows = page.companies;
        self.total = page.total;
        true
    }

    pub fn toggle(&mut self, id: CompanyId) {
        self.selection.toggle(id);
    }

    /// Select every id, typically all members across pages.
    pub fn select_all(&mut self, ids: impl IntoIterator<Item = CompanyId>) {
        for id in ids {
            self.selection.insert(id);
        }
    }

    pub fn deselect_all(&mut self) {
        self.selection.clear();
    }

    /// Apply the local effect of a completed bulk job.
    ///
    /// Only call this once the terminal event has been observed. Items that
    /// failed remotely keep their rows. The selection is cleared.
    pub fn reconcile(&mut self, op: &MembershipOp, failures: &[ItemFailure]) -> Reconciliation {
        let failed: HashSet<CompanyId> = failures.iter().map(|f| f.company_id).collect();
        let applied: HashSet<CompanyId> = self
            .selection
            .ids()
            .iter()
            .copied()
            .filter(|id| !failed.contains(id))
            .collect();

        let mut result = Reconciliation {
            rows_removed: 0,
            rows_liked: 0,
            refresh: true,
        };

        match op {
            MembershipOp::Remove { list_id } if *list_id == self.collection_id => {
                let before = self.rows.len();
                self.rows.retain(|row| !applied.contains(&row.id));
                result.rows_removed = before - self.rows.len();
                self.total = self.total.saturating_sub(applied.len());

                // Step back if the current page no longer exists.
                if self.offset >= self.total && self.offset > 0 {
                    let last_page = self.page_count().saturating_sub(1);
                    self.offset = last_page * self.page_size;
                }
            }
            MembershipOp::Add { list_name } if list_name == LIKED_LIST_NAME => {
                for row in self.rows.iter_mut() {
                    if applied.contains(&row.id) && !row.liked {
                        row.liked = true;
                        result.rows_liked += 1;
                    }
                }
            }
            _ => {}
        }

        self.selection.clear();
        result
    }

    /// Reconcile against a finished job's report.
    ///
    /// Returns `None` and keeps rows and selection untouched unless the job
    /// reached its terminal event; after channel loss the remote state is
    /// unknown.
    pub fn apply_report(&mut self, report: &JobReport) -> Option<Reconciliation> {
        if !report.is_completed() {
            return None;
        }
        Some(self.reconcile(&report.op, &report.failures))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{JobId, JobOutcome};

    fn page(id: &str, range: std::ops::Range<i64>, total: usize) -> CollectionPage {
        CollectionPage {
            id: CollectionId::new(id),
            collection_name: "My List".to_string(),
            companies: range.map(|i| Company::new(i, format!("Company {i}"))).collect(),
            total,
        }
    }

    #[test]
    fn test_selection_keeps_order_without_duplicates() {
        let mut selection = Selection::from_ids([3, 1, 3, 2].map(CompanyId::new));
        assert_eq!(selection.ids(), &[3, 1, 2].map(CompanyId::new));

        selection.toggle(CompanyId::new(1));
        assert!(!selection.contains(CompanyId::new(1)));
        selection.toggle(CompanyId::new(1));
        assert_eq!(selection.ids().last(), Some(&CompanyId::new(1)));
        assert_eq!(selection.len(), 3);
    }

    #[test]
    fn test_set_page_computes_offset() {
        let mut view = CollectionView::new("c1");
        view.set_page(3, 25).unwrap();
        assert_eq!(view.offset(), 75);
        assert_eq!(view.page(), 3);
        assert!(view.set_page(1, 0).is_err());
    }

    #[test]
    fn test_switching_collection_resets_offset() {
        let mut view = CollectionView::new("c1");
        view.set_page(2, 25).unwrap();
        view.apply_page(page("c1", 51..76, 100));
        view.toggle(CompanyId::new(51));

        view.set_collection("c2");
        assert_eq!(view.offset(), 0);
        assert!(view.rows().is_empty());
        assert!(view.selection().is_empty());
    }

    #[test]
    fn test_stale_page_ignored() {
        let mut view = CollectionView::new("c1");
        assert!(!view.apply_page(page("c2", 1..5, 4)));
        assert!(view.rows().is_empty());
        assert!(view.apply_page(page("c1", 1..5, 4)));
        assert_eq!(view.collection_name(), Some("My List"));
        assert_eq!(view.page_count(), 1);
    }

    #[test]
    fn test_reconcile_remove_drops_rows_and_clears_selection() {
        let mut view = CollectionView::new("c1");
        view.apply_page(page("c1", 1..26, 30));
        view.select_all([1, 2, 3, 28].map(CompanyId::new));

        let failures = vec![ItemFailure {
            company_id: CompanyId::new(3),
            cause: "HTTP 500".to_string(),
        }];
        let result = view.reconcile(&MembershipOp::remove("c1"), &failures);

        assert_eq!(result.rows_removed, 2);
        assert!(result.refresh);
        assert_eq!(view.total(), 27);
        assert!(view.rows().iter().any(|r| r.id == CompanyId::new(3)));
        assert!(view.selection().is_empty());
    }

    #[test]
    fn test_reconcile_remove_steps_back_from_vanished_page() {
        let mut view = CollectionView::new("c1").with_page_size(10).unwrap();
        view.set_page(1, 10).unwrap();
        view.apply_page(page("c1", 11..13, 12));
        view.select_all([11, 12].map(CompanyId::new));

        view.reconcile(&MembershipOp::remove("c1"), &[]);
        assert_eq!(view.total(), 10);
        assert_eq!(view.offset(), 0);
    }

    #[test]
    fn test_reconcile_like_marks_rows() {
        let mut view = CollectionView::new("c1");
        view.apply_page(page("c1", 1..4, 3));
        view.select_all([1, 2].map(CompanyId::new));

        let result = view.reconcile(&MembershipOp::add(LIKED_LIST_NAME), &[]);
        assert_eq!(result.rows_liked, 2);
        assert_eq!(result.rows_removed, 0);
        assert_eq!(view.rows().len(), 3);
        assert!(view.rows()[0].liked && view.rows()[1].liked && !view.rows()[2].liked);
    }

    #[test]
    fn test_reconcile_other_collection_only_clears_selection() {
        let mut view = CollectionView::new("c1");
        view.apply_page(page("c1", 1..4, 3));
        view.select_all([1].map(CompanyId::new));

        let result = view.reconcile(&MembershipOp::remove("c9"), &[]);
        assert_eq!(result.rows_removed, 0);
        assert_eq!(view.rows().len(), 3);
        assert!(view.selection().is_empty());
    }

    fn report(op: MembershipOp, outcome: JobOutcome) -> JobReport {
        let mut report = JobReport::new(JobId::generate(), op, 3, 1);
        report.finish(outcome);
        report
    }

    #[test]
    fn test_interrupted_report_keeps_selection_and_rows() {
        let mut view = CollectionView::new("c1");
        view.apply_page(page("c1", 1..4, 3));
        view.select_all([1, 2].map(CompanyId::new));

        let report = report(MembershipOp::remove("c1"), JobOutcome::Interrupted);
        assert_eq!(view.apply_report(&report), None);
        assert_eq!(view.selection().ids(), &[1, 2].map(CompanyId::new));
        assert_eq!(view.rows().len(), 3);
        assert_eq!(view.total(), 3);
    }

    #[test]
    fn test_completed_report_reconciles() {
        let mut view = CollectionView::new("c1");
        view.apply_page(page("c1", 1..4, 3));
        view.select_all([1, 2].map(CompanyId::new));

        let report = report(MembershipOp::remove("c1"), JobOutcome::Completed);
        let result = view.apply_report(&report).unwrap();
        assert_eq!(result.rows_removed, 2);
        assert!(view.selection().is_empty());
        assert_eq!(view.total(), 1);
    }
}
