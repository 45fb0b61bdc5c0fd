//! Skeleton extraction: the schema of a flattened payload.
//!
//! Walks containers recursively and emits leaves under associative keys
//! only. Leaves keyed by a sequence index (or any numeric key) are dropped,
//! so a bare list of scalars never shows up in a skeleton: the connector
//! expects one schema entry per object field, not per array element.

use crate::classifier::ValueClassifier;
use serde_json::{Map, Value};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkeletonMode {
    /// Flat list of leaf keys, in walk order, repeats included
    Keys,
    /// Mapping of leaf key to its classified descriptor
    Describe,
}

impl SkeletonMode {
    pub fn from_describe(describe: bool) -> Self {
        if describe {
            Self::Describe
        } else {
            Self::Keys
        }
    }
}

enum Collected {
    Keys(Vec<Value>),
    Described(Map<String, Value>),
}

pub struct SkeletonExtractor<'a> {
    classifier: &'a ValueClassifier,
    route: &'a str,
    max_depth: usize,
}

impl<'a> SkeletonExtractor<'a> {
    pub fn new(classifier: &'a ValueClassifier, route: &'a str, max_depth: usize) -> Self {
        Self {
            classifier,
            route,
            max_depth,
        }
    }

    pub fn extract(&self, data: &Value, mode: SkeletonMode) -> Value {
        let mut collected = match mode {
            SkeletonMode::Keys => Collected::Keys(Vec::new()),
            SkeletonMode::Describe => Collected::Described(Map::new()),
        };
        self.walk(data, 0, &mut collected);

        match collected {
            Collected::Keys(keys) => Value::Array(keys),
            Collected::Described(map) => Value::Object(map),
        }
    }

    fn walk(&self, data: &Value, depth: usize, out: &mut Collected) {
        if depth > self.max_depth {
            tracing::warn!(depth, route = self.route, "skeleton walk hit depth limit, subtree dropped");
            return;
        }

        for (key, value) in entries(data) {
            if is_container(value) {
                self.walk(value, depth + 1, out);
                continue;
            }
            if is_numeric_key(&key) {
                continue;
            }
            match out {
                Collected::Keys(keys) => keys.push(Value::String(key)),
                Collected::Described(map) => {
                    let described = self.classifier.classify(value, &key, self.route, true);
                    map.insert(key, described);
                }
            }
        }
    }
}

/// Iterate a container as `(key, value)`; sequences use their index
pub(crate) fn entries(value: &Value) -> Vec<(String, &Value)> {
    match value {
        Value::Object(map) => map.iter().map(|(k, v)| (k.clone(), v)).collect(),
        Value::Array(items) => items
            .iter()
            .enumerate()
            .map(|(i, v)| (i.to_string(), v))
            .collect(),
        _ => Vec::new(),
    }
}

pub(crate) fn is_container(value: &Value) -> bool {
    matches!(value, Value::Object(_) | Value::Array(_))
}

/// Numeric-string test: optional surrounding whitespace, optional sign, digits
/// with an optional fraction, optional exponent. `inf`/`nan` are not numeric.
pub fn is_numeric_key(key: &str) -> bool {
    let s = key.trim_matches(|c: char| matches!(c, ' ' | '\t' | '\n' | '\r' | '\x0b' | '\x0c'));
    let s = s.strip_prefix(is_sign).unwrap_or(s);
    if s.is_empty() {
        return false;
    }

    let (mantissa, exponent) = match s.find(|c: char| c == 'e' || c == 'E') {
        Some(pos) => (&s[..pos], Some(&s[pos + 1..])),
        None => (s, None),
    };

    let mut parts = mantissa.splitn(2, '.');
    let whole = parts.next().unwrap_or("");
    let fraction = parts.next().unwrap_or("");
    let digits_ok = whole.chars().all(|c| c.is_ascii_digit()) && fraction.chars().all(|c| c.is_ascii_digit());
    if !digits_ok || (whole.is_empty() && fraction.is_empty()) {
        return false;
    }

    match exponent {
        None => true,
        Some(exp) => {
            let exp = exp.strip_prefix(is_sign).unwrap_or(exp);
            !exp.is_empty() && exp.chars().all(|c| c.is_ascii_digit())
        }
    }
}

fn is_sign(c: char) -> bool {
    c == '+' || c == '-'
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn keys_of(data: &Value) -> Value {
        let classifier = ValueClassifier::default();
        SkeletonExtractor::new(&classifier, "/r", 64).extract(data, SkeletonMode::Keys)
    }

    #[test]
    fn test_numeric_keys_dropped() {
        let data = json!({ "a": { "0": "x", "1": "y" }, "b": "z" });
        assert_eq!(keys_of(&data), json!(["b"]));
    }

    #[test]
    fn test_sequence_elements_walked() {
        let data = json!([{ "id": 1, "title": "a" }, { "id": 2, "title": "b" }]);
        assert_eq!(keys_of(&data), json!(["id", "title", "id", "title"]));
    }

    #[test]
    fn test_bare_scalar_list_vanishes() {
        assert_eq!(keys_of(&json!({ "tags": ["a", "b"] })), json!([]));
        assert_eq!(keys_of(&json!("scalar")), json!([]));
    }

    #[test]
    fn test_describe_mode() {
        let classifier = ValueClassifier::default();
        let out = SkeletonExtractor::new(&classifier, "/r", 64)
            .extract(&json!([{ "post_title": "hi", "id": 3 }]), SkeletonMode::Describe);
        assert_eq!(out["post_title"]["type"], json!("TEXT"));
        assert_eq!(out["post_title"]["name"], json!("Post Title"));
        assert_eq!(out["id"]["type"], json!("NUMBER"));
        assert_eq!(out["id"]["value"], json!(3));
    }

    #[test]
    fn test_depth_limit() {
        let classifier = ValueClassifier::default();
        let deep = json!({ "a": { "b": { "c": "leaf" } }, "top": 1 });
        let out = SkeletonExtractor::new(&classifier, "/r", 1).extract(&deep, SkeletonMode::Keys);
        assert_eq!(out, json!(["top"]));
    }

    #[test]
    fn test_is_numeric_key() {
        for key in ["0", "12", "-3", "+4", "1.5", ".5", "5.", "1e3", " 7", "1 ", "2E-2"] {
            assert!(is_numeric_key(key), "{:?} should be numeric", key);
        }
        for key in ["", "a", "1a", "inf", "NaN", "1e", ".", "-", "1 2", "0x1A"] {
            assert!(!is_numeric_key(key), "{:?} should not be numeric", key);
        }
    }
}
