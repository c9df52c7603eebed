//! Client library for the Shortlist collections service.
//!
//! Provides the HTTP client for collection and membership endpoints and the
//! WebSocket connector for the progress relay.

pub mod error;
pub mod http;
pub mod progress;

pub use error::ClientError;
pub use http::HttpClient;
pub use progress::{WsConnector, WsProgressChannel};
