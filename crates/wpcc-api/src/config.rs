//! Environment configuration for the API server
use std::path::PathBuf;
use std::time::Duration;
use wpcc_core::{WpccError, DEFAULT_CACHE_TTL_SECS};

const DEFAULT_ADDR: &str = "0.0.0.0:8787";
const DEFAULT_NONCE_LIFETIME_SECS: u64 = 86_400;
const DEFAULT_PROBE_TIMEOUT_MS: u64 = 2_000;
const DEFAULT_MAX_DEPTH: usize = 64;

/// Context string for deriving the nonce key from `WPCC_NONCE_SECRET`
const NONCE_KEY_CONTEXT: &str = "wpcc-api 2024 nonce key";

#[derive(Clone)]
pub struct ApiConfig {
    pub addr: String,
    pub nonce_key: [u8; 32],
    pub nonce_lifetime: Duration,
    /// Token required by the nonce-issuing endpoint; unset disables it
    pub admin_token: Option<String>,
    pub store_path: Option<PathBuf>,
    pub routes_path: Option<PathBuf>,
    pub cache_ttl: Duration,
    pub probe_images: bool,
    pub probe_timeout: Duration,
    pub probe_allow_private: bool,
    pub max_depth: usize,
}

impl std::fmt::Debug for ApiConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        f.debug_struct("ApiConfig")
            .field("addr", &self.addr)
            .field("nonce_lifetime", &self.nonce_lifetime)
            .field("admin_token", &self.admin_token.as_ref().map(|_| "<set>"))
            .field("store_path", &self.store_path)
            .field("routes_path", &self.routes_path)
            .field("cache_ttl", &self.cache_ttl)
            .field("probe_images", &self.probe_images)
            .field("probe_timeout", &self.probe_timeout)
            .field("probe_allow_private", &self.probe_allow_private)
            .field("max_depth", &self.max_depth)
            .finish_non_exhaustive()
    }
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            addr: DEFAULT_ADDR.to_string(),
            nonce_key: random_key(),
            nonce_lifetime: Duration::from_secs(DEFAULT_NONCE_LIFETIME_SECS),
            admin_token: None,
            store_path: None,
            routes_path: None,
            cache_ttl: Duration::from_secs(DEFAULT_CACHE_TTL_SECS),
            probe_images: true,
            probe_timeout: Duration::from_millis(DEFAULT_PROBE_TIMEOUT_MS),
            probe_allow_private: false,
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }
}

impl ApiConfig {
    pub fn from_env() -> Result<Self, WpccError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Build from any variable source; unset or empty variables keep
    /// their defaults.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, WpccError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());
        let mut config = Self::default();

        if let Some(addr) = get("WPCC_ADDR") {
            config.addr = addr;
        }
        if let Some(secret) = get("WPCC_NONCE_SECRET") {
            config.nonce_key = blake3::derive_key(NONCE_KEY_CONTEXT, secret.as_bytes());
        }
        if let Some(v) = get("WPCC_NONCE_LIFETIME_SECS") {
            let secs: u64 = parse_number("WPCC_NONCE_LIFETIME_SECS", &v)?;
            if secs < 2 {
                return Err(WpccError::Config("WPCC_NONCE_LIFETIME_SECS must be at least 2".into()));
            }
            config.nonce_lifetime = Duration::from_secs(secs);
        }
        config.admin_token = get("WPCC_ADMIN_TOKEN");
        config.store_path = get("WPCC_STORE_PATH").map(PathBuf::from);
        config.routes_path = get("WPCC_ROUTES_PATH").map(PathBuf::from);
        if let Some(v) = get("WPCC_CACHE_TTL_SECS") {
            config.cache_ttl = Duration::from_secs(parse_number("WPCC_CACHE_TTL_SECS", &v)?);
        }
        if let Some(v) = get("WPCC_PROBE_IMAGES") {
            config.probe_images = parse_bool("WPCC_PROBE_IMAGES", &v)?;
        }
        if let Some(v) = get("WPCC_PROBE_TIMEOUT_MS") {
            config.probe_timeout = Duration::from_millis(parse_number("WPCC_PROBE_TIMEOUT_MS", &v)?);
        }
        if let Some(v) = get("WPCC_PROBE_ALLOW_PRIVATE") {
            config.probe_allow_private = parse_bool("WPCC_PROBE_ALLOW_PRIVATE", &v)?;
        }
        if let Some(v) = get("WPCC_MAX_DEPTH") {
            config.max_depth = parse_number("WPCC_MAX_DEPTH", &v)?;
        }

        Ok(config)
    }
}

fn parse_number<T: std::str::FromStr>(name: &str, value: &str) -> Result<T, WpccError> {
    value
        .trim()
        .parse()
        .map_err(|_| WpccError::Config(format!("{} must be a non-negative integer, got {:?}", name, value)))
}

fn parse_bool(name: &str, value: &str) -> Result<bool, WpccError> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(WpccError::Config(format!("{} must be a boolean, got {:?}", name, value))),
    }
}

/// Per-process key, so nonces do not survive a restart
fn random_key() -> [u8; 32] {
    *blake3::hash(uuid::Uuid::new_v4().as_bytes()).as_bytes()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config_from(vars: &[(&str, &str)]) -> Result<ApiConfig, WpccError> {
        let vars: HashMap<String, String> = vars.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
        ApiConfig::from_lookup(|name| vars.get(name).cloned())
    }

    #[test]
    fn test_defaults() {
        let config = config_from(&[]).unwrap();
        assert_eq!(config.addr, "0.0.0.0:8787");
        assert_eq!(config.cache_ttl, Duration::from_secs(60));
        assert!(config.probe_images);
        assert!(!config.probe_allow_private);
        assert_eq!(config.max_depth, 64);
        assert!(config.store_path.is_none());
    }

    #[test]
    fn test_overrides() {
        let config = config_from(&[
            ("WPCC_ADDR", "127.0.0.1:9000"),
            ("WPCC_CACHE_TTL_SECS", "5"),
            ("WPCC_PROBE_IMAGES", "off"),
            ("WPCC_PROBE_TIMEOUT_MS", "250"),
            ("WPCC_STORE_PATH", "/tmp/wpcc.json"),
            ("WPCC_MAX_DEPTH", "8"),
        ])
        .unwrap();
        assert_eq!(config.addr, "127.0.0.1:9000");
        assert_eq!(config.cache_ttl, Duration::from_secs(5));
        assert!(!config.probe_images);
        assert_eq!(config.probe_timeout, Duration::from_millis(250));
        assert_eq!(config.store_path, Some(PathBuf::from("/tmp/wpcc.json")));
        assert_eq!(config.max_depth, 8);
    }

    #[test]
    fn test_secret_is_deterministic() {
        let a = config_from(&[("WPCC_NONCE_SECRET", "s3cret")]).unwrap();
        let b = config_from(&[("WPCC_NONCE_SECRET", "s3cret")]).unwrap();
        assert_eq!(a.nonce_key, b.nonce_key);
        assert_ne!(config_from(&[]).unwrap().nonce_key, config_from(&[]).unwrap().nonce_key);
    }

    #[test]
    fn test_invalid_values() {
        assert!(matches!(config_from(&[("WPCC_CACHE_TTL_SECS", "soon")]), Err(WpccError::Config(_))));
        assert!(matches!(config_from(&[("WPCC_PROBE_IMAGES", "maybe")]), Err(WpccError::Config(_))));
        assert!(matches!(config_from(&[("WPCC_NONCE_LIFETIME_SECS", "1")]), Err(WpccError::Config(_))));
    }

    #[test]
    fn test_debug_hides_secrets() {
        let config = config_from(&[("WPCC_ADMIN_TOKEN", "topsecret")]).unwrap();
        let printed = format!("{:?}", config);
        assert!(!printed.contains("topsecret"));
        assert!(!printed.contains("nonce_key"));
    }
}
