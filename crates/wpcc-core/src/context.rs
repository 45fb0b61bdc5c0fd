//! Route Context: the originating request as seen by the transformer
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// A query parameter value. Query strings only ever carry text; JSON
/// bodies may carry booleans.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ParamValue {
    Bool(bool),
    Text(String),
}

impl ParamValue {
    /// Loose truthiness: `false`, `""` and `"0"` are false, anything else
    /// is true (so `"false"` is true).
    pub fn is_truthy(&self) -> bool {
        match self {
            Self::Bool(b) => *b,
            Self::Text(s) => !(s.is_empty() || s == "0"),
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s),
            Self::Bool(_) => None,
        }
    }
}

impl From<&str> for ParamValue {
    fn from(s: &str) -> Self {
        Self::Text(s.to_string())
    }
}

impl From<bool> for ParamValue {
    fn from(b: bool) -> Self {
        Self::Bool(b)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RequestParams(HashMap<String, ParamValue>);

impl RequestParams {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, name: &str, value: impl Into<ParamValue>) -> Self {
        self.0.insert(name.to_string(), value.into());
        self
    }

    pub fn insert(&mut self, name: &str, value: impl Into<ParamValue>) {
        self.0.insert(name.to_string(), value.into());
    }

    pub fn get(&self, name: &str) -> Option<&ParamValue> {
        self.0.get(name)
    }

    /// True when the parameter is present and truthy
    pub fn flag(&self, name: &str) -> bool {
        self.0.get(name).map(ParamValue::is_truthy).unwrap_or(false)
    }

    /// Text value of a parameter, `None` when absent, boolean or empty
    pub fn text(&self, name: &str) -> Option<&str> {
        self.0.get(name).and_then(ParamValue::as_text).filter(|s| !s.is_empty())
    }
}

impl From<HashMap<String, String>> for RequestParams {
    fn from(map: HashMap<String, String>) -> Self {
        Self(map.into_iter().map(|(k, v)| (k, ParamValue::Text(v))).collect())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RouteContext {
    pub route: String,
    #[serde(default)]
    pub params: RequestParams,
    #[serde(default)]
    pub is_admin: bool,
}

impl RouteContext {
    pub fn new(route: &str) -> Self {
        Self {
            route: route.to_string(),
            params: RequestParams::new(),
            is_admin: false,
        }
    }

    pub fn with_param(mut self, name: &str, value: impl Into<ParamValue>) -> Self {
        self.params.insert(name, value);
        self
    }

    pub fn admin(mut self, is_admin: bool) -> Self {
        self.is_admin = is_admin;
        self
    }

    /// Whether the route addresses the given reports segment
    pub fn targets_reports(&self, reports_endpoint: &str) -> bool {
        self.route.contains(&format!("/{}", reports_endpoint))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_truthiness() {
        assert!(ParamValue::from("1").is_truthy());
        assert!(ParamValue::from("false").is_truthy());
        assert!(!ParamValue::from("0").is_truthy());
        assert!(!ParamValue::from("").is_truthy());
        assert!(!ParamValue::from(false).is_truthy());
    }

    #[test]
    fn test_params_deserialize_mixed() {
        let params: RequestParams =
            serde_json::from_value(json!({ "skeleton": true, "root_key": "items" })).unwrap();
        assert!(params.flag("skeleton"));
        assert_eq!(params.text("root_key"), Some("items"));
        assert!(!params.flag("inline_edit"));
    }

    #[test]
    fn test_targets_reports() {
        assert!(RouteContext::new("/wp/v2/posts/reports").targets_reports("reports"));
        assert!(!RouteContext::new("/wp/v2/posts").targets_reports("reports"));
    }
}
