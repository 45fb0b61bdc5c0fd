//! Route Registry
//!
//! Mirrors the host's REST route table: path → endpoint handlers, each
//! with its methods and declared arguments. The connector UI only ever
//! sees the subset returned by [`RouteRegistry::list_connectable`].

use crate::exclusions::is_excluded;
use crate::RegistryError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ArgSpec {
    #[serde(default)]
    pub required: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EndpointSpec {
    #[serde(default)]
    pub methods: Vec<String>,
    #[serde(default)]
    pub args: BTreeMap<String, ArgSpec>,
}

impl EndpointSpec {
    pub fn get() -> Self {
        Self {
            methods: vec!["GET".to_string()],
            args: BTreeMap::new(),
        }
    }

    pub fn with_methods(methods: &[&str]) -> Self {
        Self {
            methods: methods.iter().map(|m| m.to_string()).collect(),
            args: BTreeMap::new(),
        }
    }

    pub fn with_arg(mut self, name: &str, required: bool) -> Self {
        self.args.insert(name.to_string(), ArgSpec { required });
        self
    }

    pub fn allows_get(&self) -> bool {
        self.methods.iter().any(|m| m.eq_ignore_ascii_case("GET"))
    }

    pub fn has_required_args(&self) -> bool {
        self.args.values().any(|a| a.required)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RouteSpec {
    pub path: String,
    #[serde(default)]
    pub endpoints: Vec<EndpointSpec>,
}

impl RouteSpec {
    pub fn new(path: &str, endpoints: Vec<EndpointSpec>) -> Self {
        Self {
            path: path.to_string(),
            endpoints,
        }
    }

    /// Regex groups (`(?P<id>...)`) or `{id}` / `:id` path parameters
    pub fn has_placeholder(&self) -> bool {
        self.path.contains("?P<")
            || self.path.contains('{')
            || self.path.split('/').any(|seg| seg.starts_with(':'))
    }
}

/// Extension point restricting routes from the listing.
/// Nothing is restricted by default.
pub trait RoutePermission: Send + Sync {
    fn is_restricted(&self, route: &str) -> bool;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct AllowAll;

impl RoutePermission for AllowAll {
    fn is_restricted(&self, _route: &str) -> bool {
        false
    }
}

/// Route table file: either a list of routes or the host's own
/// `{ path: [endpoint, ...] }` dump.
#[derive(Deserialize)]
#[serde(untagged)]
enum RouteTable {
    List(Vec<RouteSpec>),
    Map(serde_json::Map<String, serde_json::Value>),
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct RouteRegistry {
    routes: Vec<RouteSpec>,
}

impl RouteRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a route, replacing an existing one with the same path
    pub fn register(&mut self, route: RouteSpec) {
        match self.routes.iter_mut().find(|r| r.path == route.path) {
            Some(existing) => *existing = route,
            None => self.routes.push(route),
        }
    }

    pub fn routes(&self) -> &[RouteSpec] {
        &self.routes
    }

    pub fn get(&self, path: &str) -> Option<&RouteSpec> {
        self.routes.iter().find(|r| r.path == path)
    }

    pub fn len(&self) -> usize {
        self.routes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }

    pub fn from_json_str(json: &str) -> Result<Self, RegistryError> {
        let table: RouteTable = serde_json::from_str(json)?;
        let mut registry = Self::new();
        match table {
            RouteTable::List(routes) => {
                for route in routes {
                    registry.register(route);
                }
            }
            RouteTable::Map(map) => {
                for (path, endpoints) in map {
                    let endpoints: Vec<EndpointSpec> = serde_json::from_value(endpoints)?;
                    registry.register(RouteSpec { path, endpoints });
                }
            }
        }
        Ok(registry)
    }

    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, RegistryError> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json_str(&json)
    }

    /// Register `<route>/<reports_endpoint>` next to every route, sharing
    /// its endpoints.
    pub fn with_report_aliases(mut self, reports_endpoint: &str) -> Self {
        let suffix = format!("/{}", reports_endpoint);
        let aliases: Vec<RouteSpec> = self
            .routes
            .iter()
            .filter(|r| !r.path.ends_with(&suffix))
            .map(|r| RouteSpec {
                path: format!("{}{}", r.path, suffix),
                endpoints: r.endpoints.clone(),
            })
            .collect();

        for alias in aliases {
            if self.get(&alias.path).is_none() {
                self.routes.push(alias);
            }
        }
        self
    }

    /// Routes the connector may offer, in registration order: plain GET
    /// collections with no required arguments and no path parameters,
    /// outside the connector's own namespace, the reports aliases and the
    /// exclusion list.
    pub fn list_connectable(
        &self,
        namespace: &str,
        reports_endpoint: &str,
        permission: &dyn RoutePermission,
    ) -> Vec<String> {
        let reports_marker = format!("/{}", reports_endpoint);

        self.routes
            .iter()
            .filter(|route| {
                let path = route.path.as_str();
                if path.contains(&reports_marker) || path.contains(namespace) {
                    return false;
                }
                if route.endpoints.iter().all(|e| e.methods.is_empty()) {
                    return false;
                }
                if is_excluded(path) {
                    return false;
                }
                if !route.endpoints.iter().any(EndpointSpec::allows_get) {
                    return false;
                }
                if path == "/" || route.has_placeholder() {
                    return false;
                }
                if route.endpoints.first().map(EndpointSpec::has_required_args).unwrap_or(false) {
                    return false;
                }
                if permission.is_restricted(path) {
                    tracing::debug!(route = path, "route restricted by permission hook");
                    return false;
                }
                true
            })
            .map(|route| route.path.clone())
            .collect()
    }
}
