//! WPCC API /wpcc/v1: REST endpoints for the community connector
pub mod config;
pub mod handlers;
pub mod metrics;
pub mod middleware;
pub mod nonce;

pub use config::ApiConfig;
pub use metrics::{CountingProbe, Metrics};
pub use nonce::{NonceAge, NonceAuthority};

use axum::{
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::trace::TraceLayer;
use wpcc_core::{WpccError, REPORTS_ENDPOINT};
use wpcc_parser::{HttpImageProbe, ImageProbe, KeyNormalizer, NoProbe, ResponseTransformer, TransformerOptions, ValueClassifier};
use wpcc_registry::RouteRegistry;
use wpcc_store::{FileStore, KeyValueStore, MemoryStore, ResponseCache};

/// Shared handler state
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<ApiConfig>,
    pub transformer: Arc<ResponseTransformer>,
    pub cache: ResponseCache,
    pub registry: Arc<RouteRegistry>,
    pub nonces: Arc<NonceAuthority>,
    pub metrics: Arc<Metrics>,
}

impl AppState {
    pub fn from_config(config: ApiConfig) -> Result<Self, WpccError> {
        let store: Arc<dyn KeyValueStore> = match &config.store_path {
            Some(path) => Arc::new(FileStore::open(path)?),
            None => Arc::new(MemoryStore::new()),
        };

        let registry = match &config.routes_path {
            Some(path) => RouteRegistry::from_json_file(path)?,
            None => RouteRegistry::new(),
        };

        let metrics = Metrics::new().map_err(|e| WpccError::Config(format!("metrics registry: {}", e)))?;

        let probe: Arc<dyn ImageProbe> = if config.probe_images {
            Arc::new(HttpImageProbe::new(config.probe_timeout, config.probe_allow_private))
        } else {
            Arc::new(NoProbe)
        };
        let probe = Arc::new(CountingProbe::new(probe, &metrics));

        let cache = ResponseCache::with_ttl(store, config.cache_ttl);
        let options = TransformerOptions {
            reports_endpoint: REPORTS_ENDPOINT.to_string(),
            max_depth: config.max_depth,
        };
        let transformer = ResponseTransformer::new(
            ValueClassifier::new(KeyNormalizer::new(), probe),
            Some(cache.clone()),
            options,
        );

        Ok(Self {
            nonces: Arc::new(NonceAuthority::new(config.nonce_key, config.nonce_lifetime)),
            registry: Arc::new(registry.with_report_aliases(REPORTS_ENDPOINT)),
            transformer: Arc::new(transformer),
            metrics: Arc::new(metrics),
            cache,
            config: Arc::new(config),
        })
    }

    /// Replace the route table, adding the report aliases
    pub fn with_registry(mut self, registry: RouteRegistry) -> Self {
        self.registry = Arc::new(registry.with_report_aliases(REPORTS_ENDPOINT));
        self
    }
}

pub fn create_app(state: AppState) -> Router {
    Router::new()
        .route("/wpcc/v1/routes", get(handlers::list_routes))
        .route("/wpcc/v1/routes/save", post(handlers::save_config))
        .route("/wpcc/v1/transform", post(handlers::transform))
        .route("/wpcc/v1/nonce", get(handlers::issue_nonce))
        .route("/wpcc/v1/health", get(handlers::health))
        .route("/metrics", get(handlers::metrics))
        .layer(axum::middleware::from_fn(middleware::access_log))
        .layer(middleware::cors())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

pub async fn run(config: ApiConfig) -> anyhow::Result<()> {
    let addr = config.addr.clone();
    let state = AppState::from_config(config)?;
    tracing::info!(
        routes = state.registry.len(),
        cache_ttl_secs = state.cache.ttl().as_secs(),
        "connector state ready"
    );

    let app = create_app(state);
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    tracing::info!("WPCC API listening on {}", addr);
    axum::serve(listener, app).await?;
    Ok(())
}
