//! HTTP client for the collection and membership endpoints.

use async_trait::async_trait;
use reqwest::{Response, StatusCode};
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::debug;

use shortlist_bulk::CollectionApi;
use shortlist_core::{CollectionId, CollectionMetadata, CollectionPage, CompanyBatch, CompanyId};

use crate::error::ClientError;

/// HTTP client for REST API endpoints.
#[derive(Debug, Clone)]
pub struct HttpClient {
    inner: reqwest::Client,
    base_url: String,
}

impl HttpClient {
    /// Create a new HTTP client.
    pub fn new(base_url: &str) -> Self {
        Self {
            inner: reqwest::Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    /// Base URL requests are issued against.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Fetch one page of all companies, regardless of collection.
    pub async fn fetch_companies(
        &self,
        offset: usize,
        limit: usize,
    ) -> Result<CompanyBatch, ClientError> {
        self.get_json("/companies", &[("offset", offset), ("limit", limit)])
            .await
    }

    /// Get JSON from an endpoint.
    async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, usize)],
    ) -> Result<T, ClientError> {
        let url = format!("{}{}", self.base_url, path);
        debug!(url = %url, "GET request");

        let response = self.inner.get(&url).query(query).send().await?;
        let response = check(response, path).await?;

        response
            .json()
            .await
            .map_err(|e| ClientError::Serialization(e.to_string()))
    }
}

/// Turn a non-success response into an error carrying the service's detail.
async fn check(response: Response, path: &str) -> Result<Response, ClientError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    let detail = serde_json::from_str::<Value>(&body)
        .ok()
        .and_then(|v| v.get("detail").and_then(Value::as_str).map(str::to_string))
        .unwrap_or(body);

    if status == StatusCode::NOT_FOUND {
        return Err(ClientError::NotFound(format!("{}: {}", path, detail)));
    }

    Err(ClientError::Status {
        status: status.as_u16(),
        path: path.to_string(),
        detail,
    })
}

#[async_trait]
impl CollectionApi for HttpClient {
    type Error = ClientError;

    async fn list_collections(&self) -> Result<Vec<CollectionMetadata>, ClientError> {
        self.get_json("/collections", &[]).await
    }

    async fn fetch_page(
        &self,
        collection_id: &CollectionId,
        offset: usize,
        limit: usize,
    ) -> Result<CollectionPage, ClientError> {
        let path = format!("/collections/{}", collection_id);
        self.get_json(&path, &[("offset", offset), ("limit", limit)])
            .await
    }

    async fn fetch_all_member_ids(
        &self,
        collection_id: &CollectionId,
    ) -> Result<Vec<CompanyId>, ClientError> {
        let path = format!("/collections/{}/companies/all", collection_id);
        match self.get_json::<CompanyBatch>(&path, &[]).await {
            Ok(batch) => Ok(batch.ids()),
            // The service answers 404 for a collection without members.
            Err(ClientError::NotFound(detail)) => {
                debug!(collection_id = %collection_id, detail = %detail, "Collection has no members");
                Ok(Vec::new())
            }
            Err(e) => Err(e),
        }
    }

    async fn add_to_list(&self, company_id: CompanyId, list_name: &str) -> Result<(), ClientError> {
        let path = format!("/companies/{}/add-to-collection", company_id);
        let url = format!("{}{}", self.base_url, path);
        debug!(url = %url, list_name = %list_name, "POST request");

        let response = self
            .inner
            .post(&url)
            .query(&[("collection_name", list_name)])
            .send()
            .await?;
        check(response, &path).await?;
        Ok(())
    }

    async fn remove_from_list(
        &self,
        company_id: CompanyId,
        list_id: &CollectionId,
    ) -> Result<(), ClientError> {
        let path = format!(
            "/companies/{}/remove-from-collection/{}",
            company_id, list_id
        );
        let url = format!("{}{}", self.base_url, path);
        debug!(url = %url, "DELETE request");

        let response = self.inner.delete(&url).send().await?;
        check(response, &path).await?;
        Ok(())
    }
}
