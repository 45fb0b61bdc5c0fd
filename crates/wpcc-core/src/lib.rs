//! WPCC Core: data model, request context and error types
//!
//! Shared vocabulary for the community connector crates. Nothing in here
//! performs I/O.

pub mod context;
pub mod data_model;
pub mod error;

pub use context::{ParamValue, RequestParams, RouteContext};
pub use data_model::{ClassifiedValue, ValueType, DEFAULT_AGGREGATION};
pub use error::WpccError;

/// Connector version
pub const WPCC_VERSION: &str = "1.0.5";

/// Path segment that marks a route as a connector report
pub const REPORTS_ENDPOINT: &str = "reports";

/// REST namespace owned by the connector itself
pub const NAMESPACE: &str = "wpcc/v1";

/// Default TTL of the ephemeral cache tier, in seconds
pub const DEFAULT_CACHE_TTL_SECS: u64 = 60;

/// Nonce purpose for listing routes
pub const NONCE_ACTION_GET: &str = "acj_wpcc_nonce_get";

/// Nonce purpose for saving a route configuration
pub const NONCE_ACTION_SAVE: &str = "acj_wpcc_nonce_save";
