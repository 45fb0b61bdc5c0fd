//! Response transformer: reshapes a REST payload for the connector.
//!
//! Per response:
//! 1. empty payload → `{}`; route outside the reports path → unchanged
//! 2. `skeleton_type` requested and a cache entry exists → cached entry
//! 3. a single object is wrapped into a one-element sequence
//! 4. `root_key` selects a sub-tree
//! 5. top-level leaves are coerced, containers flattened into `a_b_c` keys
//!    (described when `inline_edit` is set)
//! 6. `skeleton` returns the schema of the result instead
//! 7. a wrapped single object is unwrapped again
//!
//! Nothing here fails: every branch ends in a best-effort value.

use crate::classifier::ValueClassifier;
use crate::keys::normalize_token;
use crate::skeleton::{entries, is_container, SkeletonExtractor, SkeletonMode};
use serde_json::{Map, Value};
use wpcc_core::{RouteContext, REPORTS_ENDPOINT};
use wpcc_store::ResponseCache;

/// Request parameter names
pub mod params {
    pub const ROOT_KEY: &str = "root_key";
    pub const SKELETON: &str = "skeleton";
    pub const SKELETON_TYPE: &str = "skeleton_type";
    pub const INLINE_EDIT: &str = "inline_edit";
    pub const CONTEXT: &str = "context";
}

/// Default recursion bound for flatten and skeleton walks
pub const DEFAULT_MAX_DEPTH: usize = 64;

#[derive(Debug, Clone)]
pub struct TransformerOptions {
    /// Route segment that opts a response into reshaping
    pub reports_endpoint: String,
    pub max_depth: usize,
}

impl Default for TransformerOptions {
    fn default() -> Self {
        Self {
            reports_endpoint: REPORTS_ENDPOINT.to_string(),
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }
}

/// Which branch produced a transform result
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransformOutcome {
    Empty,
    PassThrough,
    CacheHit,
    Computed,
}

impl TransformOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Empty => "empty",
            Self::PassThrough => "passthrough",
            Self::CacheHit => "cache_hit",
            Self::Computed => "computed",
        }
    }
}

#[derive(Clone)]
pub struct ResponseTransformer {
    classifier: ValueClassifier,
    cache: Option<ResponseCache>,
    options: TransformerOptions,
}

impl ResponseTransformer {
    pub fn new(classifier: ValueClassifier, cache: Option<ResponseCache>, options: TransformerOptions) -> Self {
        Self {
            classifier,
            cache,
            options,
        }
    }

    pub fn options(&self) -> &TransformerOptions {
        &self.options
    }

    /// Inbound gate: reshape only report routes, only successful responses,
    /// never in admin or `context=edit` requests.
    pub fn should_transform(&self, ctx: &RouteContext, response_is_error: bool) -> bool {
        if !ctx.targets_reports(&self.options.reports_endpoint) || response_is_error {
            return false;
        }
        if ctx.is_admin {
            return false;
        }
        ctx.params
            .get(params::CONTEXT)
            .and_then(|v| v.as_text())
            .map(|c| c != "edit")
            .unwrap_or(true)
    }

    pub fn transform(&self, payload: &Value, ctx: &RouteContext) -> Value {
        self.transform_with_outcome(payload, ctx).0
    }

    pub fn transform_with_outcome(&self, payload: &Value, ctx: &RouteContext) -> (Value, TransformOutcome) {
        if is_empty_payload(payload) {
            return (Value::Object(Map::new()), TransformOutcome::Empty);
        }

        if !ctx.targets_reports(&self.options.reports_endpoint) {
            tracing::debug!(route = %ctx.route, "not a reports route, passing through");
            return (payload.clone(), TransformOutcome::PassThrough);
        }

        let describe_skeleton = ctx.params.flag(params::SKELETON_TYPE);
        if describe_skeleton {
            if let Some(cached) = self.cache.as_ref().and_then(|c| c.read(&ctx.route)) {
                tracing::debug!(route = %ctx.route, "serving cached skeleton");
                return (cached, TransformOutcome::CacheHit);
            }
        }

        let naturally_sequence = match payload {
            Value::Array(_) => true,
            Value::Object(_) => false,
            _ => {
                tracing::debug!(route = %ctx.route, "scalar payload, passing through");
                return (payload.clone(), TransformOutcome::PassThrough);
            }
        };

        let wrapped;
        let data = if naturally_sequence {
            payload
        } else {
            wrapped = Value::Array(vec![payload.clone()]);
            &wrapped
        };

        let root_key = ctx.params.text(params::ROOT_KEY);
        let selected = match root_key {
            Some(key) => select_root(payload, key),
            None => Some(data),
        };
        let Some(selected) = selected else {
            tracing::debug!(route = %ctx.route, root_key, "root key not found");
            return (Value::Object(Map::new()), TransformOutcome::Computed);
        };

        let inline_edit = ctx.params.flag(params::INLINE_EDIT);
        let mut draft = Map::new();
        for (key, value) in entries(selected) {
            if is_container(value) {
                let flat = self.flatten(value, "", &ctx.route, inline_edit, 1);
                draft.insert(key, Value::Object(flat));
            } else {
                draft.insert(normalize_token(&key), self.classifier.classify(value, &key, &ctx.route, false));
            }
        }

        if ctx.params.flag(params::SKELETON) {
            let mode = SkeletonMode::from_describe(describe_skeleton);
            let skeleton = SkeletonExtractor::new(&self.classifier, &ctx.route, self.options.max_depth)
                .extract(&Value::Object(draft), mode);
            if mode == SkeletonMode::Describe {
                self.remember(&ctx.route, &skeleton);
            }
            return (skeleton, TransformOutcome::Computed);
        }

        if !naturally_sequence && root_key.is_none() {
            let first = draft.into_iter().next().map(|(_, v)| v).unwrap_or(Value::Null);
            return (first, TransformOutcome::Computed);
        }

        (draft_to_value(draft), TransformOutcome::Computed)
    }

    /// Flatten nested containers into one level, joining the path with `.`
    /// before normalizing it, so `{"a": {"b": 1}}` yields `a_b`.
    fn flatten(&self, value: &Value, prefix: &str, route: &str, describe: bool, depth: usize) -> Map<String, Value> {
        let mut result = Map::new();
        if depth > self.options.max_depth {
            tracing::warn!(depth, route, prefix, "flatten hit depth limit, subtree dropped");
            return result;
        }

        for (key, child) in entries(value) {
            let path = if prefix.is_empty() {
                key
            } else {
                format!("{}.{}", prefix, key)
            };
            if is_container(child) {
                for (k, v) in self.flatten(child, &path, route, describe, depth + 1) {
                    result.insert(k, v);
                }
            } else {
                let classified = self.classifier.classify(child, &path, route, describe);
                result.insert(normalize_token(&path), classified);
            }
        }
        result
    }

    fn remember(&self, route: &str, skeleton: &Value) {
        let Some(cache) = &self.cache else { return };
        if is_empty_payload(skeleton) {
            return;
        }
        if let Err(err) = cache.remember(route, skeleton.clone()) {
            tracing::warn!(route, error = %err, "failed to cache skeleton");
        }
    }
}

/// Empty in the loose sense: null, false, 0, "", "0", [] and {}
pub fn is_empty_payload(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::Bool(b) => !b,
        Value::Number(n) => n.as_f64().map(|f| f == 0.0).unwrap_or(false),
        Value::String(s) => s.is_empty() || s == "0",
        Value::Array(a) => a.is_empty(),
        Value::Object(o) => o.is_empty(),
    }
}

fn select_root<'v>(payload: &'v Value, key: &str) -> Option<&'v Value> {
    match payload {
        Value::Object(map) => map.get(key),
        Value::Array(items) => key.parse::<usize>().ok().and_then(|i| items.get(i)),
        _ => None,
    }
}

/// A draft keyed `0..n` in order is a sequence; anything else a mapping
fn draft_to_value(draft: Map<String, Value>) -> Value {
    let is_sequence = draft
        .keys()
        .enumerate()
        .all(|(i, k)| k.parse::<usize>().map(|n| n == i && n.to_string() == *k).unwrap_or(false));

    if is_sequence {
        Value::Array(draft.into_iter().map(|(_, v)| v).collect())
    } else {
        Value::Object(draft)
    }
}
