//! API Handlers
use crate::AppState;
use axum::{
    extract::{Query, State},
    http::{header, HeaderMap, StatusCode},
    response::IntoResponse,
    Json,
};
use serde::Deserialize;
use serde_json::{json, Map, Value};
use wpcc_core::{RequestParams, RouteContext, NAMESPACE, NONCE_ACTION_GET, NONCE_ACTION_SAVE, WPCC_VERSION};
use wpcc_registry::AllowAll;

/// Header carrying the admin token for the nonce endpoint
pub const ADMIN_TOKEN_HEADER: &str = "x-wpcc-admin-token";

#[derive(Debug, Deserialize)]
pub struct NonceQuery {
    #[serde(rename = "_nonce", default)]
    pub nonce: String,
}

pub async fn list_routes(State(state): State<AppState>, Query(query): Query<NonceQuery>) -> Json<Value> {
    if let Err(e) = state.nonces.check(&query.nonce, NONCE_ACTION_GET) {
        tracing::warn!(error = %e, "route listing refused");
        return Json(json!([]));
    }

    let routes = state.registry.list_connectable(
        NAMESPACE,
        &state.transformer.options().reports_endpoint,
        &AllowAll,
    );
    Json(json!(routes))
}

#[derive(Debug, Deserialize)]
pub struct SaveRequest {
    #[serde(default)]
    pub data: Value,
    #[serde(default)]
    pub route: String,
    #[serde(rename = "_nonce", default)]
    pub nonce: String,
}

pub async fn save_config(State(state): State<AppState>, Json(req): Json<SaveRequest>) -> Json<Value> {
    if let Err(e) = state.nonces.check(&req.nonce, NONCE_ACTION_SAVE) {
        tracing::warn!(route = %req.route, error = %e, "config save refused");
        return Json(json!({}));
    }

    let cache = state.cache.clone();
    let route = req.route.clone();
    let saved = tokio::task::spawn_blocking(move || cache.save_config(&route, req.data)).await;

    match saved {
        Ok(Ok(saved)) => {
            tracing::info!(route = %saved.route, key = %saved.key, "route config saved");
            Json(json!(saved))
        }
        Ok(Err(e)) => {
            tracing::error!(route = %req.route, error = %e, "failed to save route config");
            Json(json!({}))
        }
        Err(e) => {
            tracing::error!(route = %req.route, error = %e, "config save task failed");
            Json(json!({}))
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct TransformRequest {
    pub route: String,
    #[serde(default)]
    pub payload: Value,
    #[serde(default)]
    pub params: RequestParams,
    #[serde(default)]
    pub is_admin: bool,
    #[serde(default)]
    pub is_error: bool,
}

/// Reshape a host response. Anything the gate rejects comes back as sent.
pub async fn transform(State(state): State<AppState>, Json(req): Json<TransformRequest>) -> Json<Value> {
    let ctx = RouteContext {
        route: req.route,
        params: req.params,
        is_admin: req.is_admin,
    };

    if !state.transformer.should_transform(&ctx, req.is_error) {
        state.metrics.record_skipped();
        return Json(req.payload);
    }

    let transformer = state.transformer.clone();
    let payload = req.payload;
    let result = tokio::task::spawn_blocking(move || transformer.transform_with_outcome(&payload, &ctx)).await;

    match result {
        Ok((out, outcome)) => {
            state.metrics.record_transform(outcome);
            Json(out)
        }
        Err(e) => {
            tracing::error!(error = %e, "transform task failed");
            Json(Value::Object(Map::new()))
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct IssueNonceQuery {
    pub action: String,
}

pub async fn issue_nonce(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(query): Query<IssueNonceQuery>,
) -> (StatusCode, Json<Value>) {
    let Some(expected) = state.config.admin_token.as_deref() else {
        return (StatusCode::NOT_FOUND, Json(json!({ "error": "nonce endpoint disabled" })));
    };
    let presented = headers
        .get(ADMIN_TOKEN_HEADER)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default();
    if !crate::nonce::constant_time_eq(presented, expected) {
        tracing::warn!(action = %query.action, "nonce request refused");
        return (StatusCode::FORBIDDEN, Json(json!({ "error": "forbidden" })));
    }

    let nonce = state.nonces.create(&query.action);
    (StatusCode::OK, Json(json!({ "action": query.action, "nonce": nonce })))
}

pub async fn health() -> (StatusCode, Json<Value>) {
    (StatusCode::OK, Json(json!({ "status": "ok", "version": WPCC_VERSION })))
}

pub async fn metrics(State(state): State<AppState>) -> impl IntoResponse {
    match state.metrics.encode() {
        Ok(body) => (
            StatusCode::OK,
            [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
            body,
        ),
        Err(e) => {
            tracing::error!(error = %e, "failed to encode metrics");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                [(header::CONTENT_TYPE, "text/plain")],
                String::new(),
            )
        }
    }
}
