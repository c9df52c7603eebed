//! CLI configuration.

use shortlist_core::{DEFAULT_BATCH_SIZE, DEFAULT_PAGE_SIZE, LIKED_LIST_NAME};

/// Resolved configuration for one CLI invocation.
#[derive(Debug, Clone)]
pub struct Config {
    /// Base URL of the collections API.
    pub api_url: String,

    /// URL of the progress relay.
    pub progress_url: String,

    /// Items dispatched together in one batch.
    pub batch_size: usize,

    /// Rows per page when printing a collection.
    pub page_size: usize,

    /// Collection that `like` adds to.
    pub liked_list_name: String,

    /// Use an in-process progress channel instead of the relay.
    pub local_progress: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_url: "http://localhost:8000".to_string(),
            progress_url: "ws://localhost:8000/ws/progress".to_string(),
            batch_size: DEFAULT_BATCH_SIZE,
            page_size: DEFAULT_PAGE_SIZE,
            liked_list_name: LIKED_LIST_NAME.to_string(),
            local_progress: false,
        }
    }
}
