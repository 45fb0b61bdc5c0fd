//! Key normalization for connector field names.
//!
//! Turns arbitrary mapping keys (route segments, nested field paths) into:
//! - a token: separators ` . - : /` replaced with `_`
//! - a title: underscores as spaces, each word capitalized
//! - a display name: the title, passed through an overridable hook

use std::sync::Arc;

/// Characters replaced by `_` in a token
const SEPARATORS: [char; 5] = [' ', '.', '-', ':', '/'];

/// Normalize a key into a token.
///
/// Character-for-character replacement, no collapsing: `a..b` becomes
/// `a__b`. Idempotent and defined for every string.
pub fn normalize_token(key: &str) -> String {
    key.trim()
        .chars()
        .map(|c| if SEPARATORS.contains(&c) { '_' } else { c })
        .collect::<String>()
        .trim()
        .to_string()
}

/// Turn a token into a human title.
///
/// Any `:` or `.` still present after capitalization is turned back into
/// `_`, so `a.b` titles as `A_b`. Callers that start from a token never
/// see this.
pub fn to_title(token: &str) -> String {
    ucwords(&token.replace('_', " "))
        .replace(':', "_")
        .replace('.', "_")
        .trim()
        .to_string()
}

/// Uppercase the first ASCII letter of every whitespace-delimited word,
/// leaving the rest untouched.
fn ucwords(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut at_word_start = true;
    for c in text.chars() {
        if at_word_start {
            out.push(c.to_ascii_uppercase());
        } else {
            out.push(c);
        }
        at_word_start = matches!(c, ' ' | '\t' | '\r' | '\n' | '\x0c' | '\x0b');
    }
    out
}

/// Override point for display names.
///
/// Called with the normalized route, the normalized key, the computed
/// default and the key as it appeared in the payload.
pub trait DisplayNameHook: Send + Sync {
    fn display_name(&self, route: &str, transformed_key: &str, default: String, original_key: &str) -> String;
}

/// Default hook: keeps the computed name
#[derive(Debug, Clone, Copy, Default)]
pub struct IdentityHook;

impl DisplayNameHook for IdentityHook {
    fn display_name(&self, _route: &str, _transformed_key: &str, default: String, _original_key: &str) -> String {
        default
    }
}

impl<F> DisplayNameHook for F
where
    F: Fn(&str, &str, String, &str) -> String + Send + Sync,
{
    fn display_name(&self, route: &str, transformed_key: &str, default: String, original_key: &str) -> String {
        self(route, transformed_key, default, original_key)
    }
}

/// Key normalizer with a pluggable display-name hook
#[derive(Clone)]
pub struct KeyNormalizer {
    hook: Arc<dyn DisplayNameHook>,
}

impl Default for KeyNormalizer {
    fn default() -> Self {
        Self::new()
    }
}

impl KeyNormalizer {
    pub fn new() -> Self {
        Self { hook: Arc::new(IdentityHook) }
    }

    pub fn with_hook(hook: Arc<dyn DisplayNameHook>) -> Self {
        Self { hook }
    }

    /// Display name for `key` in the context of `route` (raw route path)
    pub fn display_name(&self, key: &str, route: &str) -> String {
        let transformed = normalize_token(key);
        let default = to_title(&transformed);
        self.hook
            .display_name(&normalize_token(route), &transformed, default, key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_replaces_separators() {
        assert_eq!(normalize_token("author.name"), "author_name");
        assert_eq!(normalize_token("/wp/v2/posts"), "_wp_v2_posts");
        assert_eq!(normalize_token("a-b:c d"), "a_b_c_d");
        assert_eq!(normalize_token("  padded  "), "padded");
    }

    #[test]
    fn test_normalize_no_collapse() {
        assert_eq!(normalize_token("a..b"), "a__b");
        assert_eq!(normalize_token("a - b"), "a___b");
    }

    #[test]
    fn test_normalize_idempotent() {
        for key in ["", "_", ".", "plain", " a.b-c ", "x:/y", "\tz\n", "__id__", "ünï côdé"] {
            let once = normalize_token(key);
            assert_eq!(normalize_token(&once), once, "not idempotent for {:?}", key);
        }
    }

    #[test]
    fn test_to_title() {
        assert_eq!(to_title("author_name"), "Author Name");
        assert_eq!(to_title("id"), "Id");
        assert_eq!(to_title(""), "");
        assert_eq!(to_title("alreadyCamel_case"), "AlreadyCamel Case");
    }

    #[test]
    fn test_to_title_residual_separators() {
        assert_eq!(to_title("a.b"), "A_b");
        assert_eq!(to_title("x:y_z"), "X_y Z");
    }

    #[test]
    fn test_display_name_default() {
        let names = KeyNormalizer::new();
        assert_eq!(names.display_name("title.rendered", "/wp/v2/posts/reports"), "Title Rendered");
    }

    #[test]
    fn test_display_name_hook_receives_context() {
        let names = KeyNormalizer::with_hook(Arc::new(
            |route: &str, key: &str, default: String, original: &str| {
                if key == "title_rendered" {
                    format!("{}|{}|{}", route, default, original)
                } else {
                    default
                }
            },
        ));
        assert_eq!(
            names.display_name("title.rendered", "/wp/v2/posts/reports"),
            "_wp_v2_posts_reports|Title Rendered|title.rendered"
        );
        assert_eq!(names.display_name("id", "/r"), "Id");
    }
}
