//! Remote operations the coordinator and front-ends depend on.

use async_trait::async_trait;

use shortlist_core::{CollectionId, CollectionMetadata, CollectionPage, CompanyId};

/// Single-item access to the remote collections service.
///
/// Every method issues one request and either returns a typed result or
/// fails. Implementations must be shareable across the concurrent requests
/// of a batch.
#[async_trait]
pub trait CollectionApi: Send + Sync {
    /// Error returned by every operation.
    type Error: std::error::Error + Send + Sync + 'static;

    /// List every collection.
    async fn list_collections(&self) -> Result<Vec<CollectionMetadata>, Self::Error>;

    /// Fetch one page of a collection.
    async fn fetch_page(
        &self,
        collection_id: &CollectionId,
        offset: usize,
        limit: usize,
    ) -> Result<CollectionPage, Self::Error>;

    /// Fetch the ids of every member of a collection, unpaginated.
    async fn fetch_all_member_ids(
        &self,
        collection_id: &CollectionId,
    ) -> Result<Vec<CompanyId>, Self::Error>;

    /// Add one company to the collection with the given name.
    async fn add_to_list(&self, company_id: CompanyId, list_name: &str) -> Result<(), Self::Error>;

    /// Remove one company from a collection.
    async fn remove_from_list(
        &self,
        company_id: CompanyId,
        list_id: &CollectionId,
    ) -> Result<(), Self::Error>;
}
