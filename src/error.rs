//! Error types for the data layer
//!
//! Provides unified error handling using thiserror. The cache itself never
//! wraps producer failures (they propagate through `get_or_fetch` verbatim);
//! this is the error vocabulary of the bundled data layer that sits on top.

use thiserror::Error;

// == Data Error Enum ==
/// Failures surfaced by [`DataSource`](crate::data::DataSource)
/// implementations and by [`DataService`](crate::data::DataService).
#[derive(Error, Debug)]
pub enum DataError {
    /// The hosted backend rejected or failed the request
    #[error("backend request failed: {0}")]
    Backend(String),

    /// No row with the given id
    #[error("row not found: {0}")]
    NotFound(String),

    /// A payload could not be converted to or from a cacheable value
    #[error("payload serialization failed: {0}")]
    Payload(#[from] serde_json::Error),
}

// == Result Type Alias ==
/// Convenience Result type for data-layer operations.
pub type Result<T> = std::result::Result<T, DataError>;
