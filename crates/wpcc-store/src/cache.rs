//! Route-keyed response cache over a [`KeyValueStore`]

use crate::{KeyValueStore, StoreError};
use md5::{Digest, Md5};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use wpcc_core::DEFAULT_CACHE_TTL_SECS;

/// Cache key for a route: lowercase hex MD5 of the route string.
///
/// Matches the key the host stores options and transients under, so state
/// saved by either side is shared.
pub fn cache_key(route: &str) -> String {
    Md5::digest(route.as_bytes())
        .iter()
        .map(|b| format!("{:02x}", b))
        .collect()
}

/// A persisted route configuration, echoed back by the save operation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SavedRouteConfig {
    pub route: String,
    pub data: Value,
    pub key: String,
}

#[derive(Clone)]
pub struct ResponseCache {
    store: Arc<dyn KeyValueStore>,
    ttl: Duration,
}

impl ResponseCache {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self::with_ttl(store, Duration::from_secs(DEFAULT_CACHE_TTL_SECS))
    }

    pub fn with_ttl(store: Arc<dyn KeyValueStore>, ttl: Duration) -> Self {
        Self { store, ttl }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Look up both tiers and merge them, ephemeral keys winning.
    ///
    /// Backend errors count as a miss. Empty values (null, `[]`, `{}`,
    /// `""`, `false`) count as absent.
    pub fn read(&self, route: &str) -> Option<Value> {
        let key = cache_key(route);

        let ephemeral = self
            .store
            .get_ephemeral(&key)
            .unwrap_or_else(|err| {
                tracing::warn!(route, error = %err, "ephemeral cache read failed");
                None
            })
            .filter(|v| !is_blank(v));

        let durable = self
            .store
            .get_durable(&key)
            .unwrap_or_else(|err| {
                tracing::warn!(route, error = %err, "durable cache read failed");
                None
            })
            .filter(|v| !is_blank(v));

        let merged = match (ephemeral, durable) {
            (Some(Value::Object(mut fresh)), Some(Value::Object(saved))) => {
                for (k, v) in saved {
                    fresh.entry(k).or_insert(v);
                }
                Some(Value::Object(fresh))
            }
            (Some(fresh), _) => Some(fresh),
            (None, saved) => saved,
        };

        tracing::debug!(route, key = %key, hit = merged.is_some(), "response cache lookup");
        merged
    }

    /// Write the durable tier, then replace the ephemeral entry.
    pub fn write(&self, route: &str, data: Value, ttl: Duration) -> Result<String, StoreError> {
        let key = cache_key(route);
        self.store.set_durable(&key, data.clone())?;
        self.store.delete_ephemeral(&key)?;
        self.store.set_ephemeral_with_ttl(&key, data, ttl)?;
        Ok(key)
    }

    /// Keep a computed result in the ephemeral tier only
    pub fn remember(&self, route: &str, data: Value) -> Result<(), StoreError> {
        let key = cache_key(route);
        self.store.set_ephemeral_with_ttl(&key, data, self.ttl)
    }

    /// Persist an explicit route configuration in both tiers
    pub fn save_config(&self, route: &str, data: Value) -> Result<SavedRouteConfig, StoreError> {
        let key = self.write(route, data.clone(), self.ttl)?;
        tracing::info!(route, key = %key, "saved route configuration");
        Ok(SavedRouteConfig {
            route: route.to_string(),
            data,
            key,
        })
    }
}

fn is_blank(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::Bool(b) => !b,
        Value::String(s) => s.is_empty() || s == "0",
        Value::Array(a) => a.is_empty(),
        Value::Object(o) => o.is_empty(),
        Value::Number(_) => false,
    }
}
