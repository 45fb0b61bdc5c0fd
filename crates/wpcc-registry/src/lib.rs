//! WPCC Registry: REST route table, report aliases and route listing
pub mod exclusions;
pub mod route_registry;

pub use exclusions::EXCLUDED_ROUTES;
pub use route_registry::{AllowAll, ArgSpec, EndpointSpec, RoutePermission, RouteRegistry, RouteSpec};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("Failed to read route table: {0}")]
    Io(#[from] std::io::Error),
    #[error("Invalid route table: {0}")]
    Json(#[from] serde_json::Error),
}

impl From<RegistryError> for wpcc_core::WpccError {
    fn from(err: RegistryError) -> Self {
        wpcc_core::WpccError::Config(err.to_string())
    }
}
