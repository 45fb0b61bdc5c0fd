//! WPCC Store: ephemeral + durable key-value tiers and the response cache
//!
//! The host CMS keeps connector state in two places: short-lived
//! transients and permanent options. [`KeyValueStore`] models both tiers
//! behind one trait so the transformer never touches globals.
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use wpcc_store::{MemoryStore, ResponseCache};
//! use serde_json::json;
//!
//! let cache = ResponseCache::new(Arc::new(MemoryStore::new()));
//! cache.save_config("/r", json!({ "x": 1 })).unwrap();
//! assert_eq!(cache.read("/r"), Some(json!({ "x": 1 })));
//! ```

pub mod cache;
pub mod store;

pub use cache::{cache_key, ResponseCache, SavedRouteConfig};
pub use store::{FileStore, KeyValueStore, MemoryStore};

use thiserror::Error;

/// Errors raised by a storage backend
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Store I/O failed: {0}")]
    Io(#[from] std::io::Error),
    #[error("Store encoding failed: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Store lock poisoned")]
    Poisoned,
}

impl From<StoreError> for wpcc_core::WpccError {
    fn from(err: StoreError) -> Self {
        wpcc_core::WpccError::Store(err.to_string())
    }
}
