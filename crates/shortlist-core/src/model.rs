//! Company and collection records as served by the remote API.

use serde::{Deserialize, Serialize};

use crate::ids::{CollectionId, CompanyId};

/// A single company row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Company {
    /// Company identifier.
    pub id: CompanyId,

    /// Display name.
    pub company_name: String,

    /// Whether the company is a member of the liked list.
    #[serde(default)]
    pub liked: bool,
}

impl Company {
    /// Create a new Company that is not liked.
    pub fn new(id: impl Into<CompanyId>, company_name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            company_name: company_name.into(),
            liked: false,
        }
    }

    /// Builder method to set the liked flag.
    pub fn with_liked(mut self, liked: bool) -> Self {
        self.liked = liked;
        self
    }
}

/// Identity of a collection without its members.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CollectionMetadata {
    /// Collection identifier.
    pub id: CollectionId,

    /// Human-readable collection name.
    pub collection_name: String,
}

/// A slice of companies plus the total count they were drawn from.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompanyBatch {
    /// Companies in this slice.
    pub companies: Vec<Company>,

    /// Total number of companies available.
    #[serde(default)]
    pub total: usize,
}

impl CompanyBatch {
    /// Identifiers of the companies in this slice, in order.
    pub fn ids(&self) -> Vec<CompanyId> {
        self.companies.iter().map(|c| c.id).collect()
    }
}

/// One page of a collection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CollectionPage {
    /// Collection identifier.
    pub id: CollectionId,

    /// Human-readable collection name.
    pub collection_name: String,

    /// Companies on this page.
    pub companies: Vec<Company>,

    /// Number of members in the whole collection.
    pub total: usize,
}
