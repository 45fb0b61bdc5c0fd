//! Leaf value classification.
//!
//! Two modes:
//! - plain: date-like strings are coerced to Unix seconds, everything else
//!   passes through. Lossy on purpose: the connector wants timestamps.
//! - describe: wraps the value in a [`ClassifiedValue`] whose type depends
//!   only on the value itself, checked in order DURATION, URL/IMAGE, then
//!   the primitive kind.

use crate::dates::parse_timestamp_now;
use crate::keys::KeyNormalizer;
use crate::probe::{ImageProbe, NoProbe};
use serde_json::Value;
use std::sync::Arc;
use url::Url;
use wpcc_core::{ClassifiedValue, ValueType};

/// Schemes accepted without a host component
const HOSTLESS_SCHEMES: [&str; 3] = ["mailto", "news", "file"];

#[derive(Clone)]
pub struct ValueClassifier {
    names: KeyNormalizer,
    probe: Arc<dyn ImageProbe>,
}

impl Default for ValueClassifier {
    fn default() -> Self {
        Self::new(KeyNormalizer::new(), Arc::new(NoProbe))
    }
}

impl ValueClassifier {
    pub fn new(names: KeyNormalizer, probe: Arc<dyn ImageProbe>) -> Self {
        Self { names, probe }
    }

    pub fn names(&self) -> &KeyNormalizer {
        &self.names
    }

    /// Classify a leaf. `route` is the raw route of the originating request
    /// and only feeds the display-name hook.
    pub fn classify(&self, value: &Value, key: &str, route: &str, describe: bool) -> Value {
        if describe {
            self.describe(value, key, route).to_value()
        } else {
            coerce_leaf(value)
        }
    }

    pub fn describe(&self, value: &Value, key: &str, route: &str) -> ClassifiedValue {
        let name = self.names.display_name(key, route);
        let base = ClassifiedValue::new(name.clone(), name, value.clone());

        if is_time(value) {
            return base.with_type(ValueType::Duration);
        }

        if let Some(url) = value.as_str().filter(|s| is_valid_url(s)) {
            return if self.probe.is_image(url) {
                base.with_type(ValueType::Image)
                    .with_formula(format!("IMAGE('{}', 'Alt Text')", url))
            } else {
                base.with_type(ValueType::Url)
                    .with_formula(format!("HYPERLINK('{}', 'Link Description')", url))
            };
        }

        let value_type = primitive_type(value);
        if value_type == ValueType::Unknown {
            tracing::debug!(key, "no type hint for value");
        }
        base.with_type(value_type)
    }
}

/// Plain-mode classification: date-like strings become Unix seconds
pub fn coerce_leaf(value: &Value) -> Value {
    match value {
        Value::String(s) => parse_timestamp_now(s)
            .map(Value::from)
            .unwrap_or_else(|| value.clone()),
        _ => value.clone(),
    }
}

/// A 10-digit non-negative integer (number or string) whose integer form
/// prints back identically, so leading zeros and fractions fail.
pub fn is_timestamp_like(value: &Value) -> bool {
    let text = match value {
        Value::Number(n) => match n.as_u64() {
            Some(u) => u.to_string(),
            None => return false,
        },
        Value::String(s) => s.clone(),
        _ => return false,
    };

    text.len() == 10
        && text
            .parse::<u64>()
            .map(|n| n.to_string() == text)
            .unwrap_or(false)
}

/// Timestamp-shaped, or a string that parses as a date expression
pub fn is_time(value: &Value) -> bool {
    is_timestamp_like(value)
        || value
            .as_str()
            .map(|s| parse_timestamp_now(s).is_some())
            .unwrap_or(false)
}

/// Absolute URL check: ASCII, no whitespace, a scheme, and a host unless
/// the scheme is hostless by nature.
pub fn is_valid_url(text: &str) -> bool {
    if text.is_empty() || !text.is_ascii() || text.chars().any(|c| c.is_ascii_whitespace()) {
        return false;
    }

    match Url::parse(text) {
        Ok(url) => {
            let has_host = url.host_str().map(|h| !h.is_empty()).unwrap_or(false);
            has_host || HOSTLESS_SCHEMES.contains(&url.scheme())
        }
        Err(_) => false,
    }
}

/// Map the primitive kind; only integers count as numbers.
pub fn primitive_type(value: &Value) -> ValueType {
    match value {
        Value::Number(n) if n.is_i64() || n.is_u64() => ValueType::Number,
        Value::String(_) => ValueType::Text,
        Value::Bool(_) => ValueType::Boolean,
        _ => ValueType::Unknown,
    }
}
