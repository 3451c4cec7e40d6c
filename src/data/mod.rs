//! Data Module
//!
//! The cached data layer the dashboard screens consume: key-building
//! conventions, the backend seam, and the service that reads through the
//! shared cache and invalidates on writes.

pub mod keys;
mod service;
mod source;

// Re-export public types
pub use service::{DataService, SharedCache};
pub use source::{DataSource, MemorySource};
