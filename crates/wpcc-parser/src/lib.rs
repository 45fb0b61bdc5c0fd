//! WPCC Parser: REST payloads to connector-ready rows
//!
//! This crate reshapes REST responses into the flat, type-annotated shape
//! the spreadsheet community connector consumes.
//!
//! # Example
//!
//! ```ignore
//! use wpcc_parser::{ResponseTransformer, TransformerOptions, ValueClassifier};
//! use wpcc_core::RouteContext;
//! use serde_json::json;
//!
//! let transformer = ResponseTransformer::new(
//!     ValueClassifier::default(),
//!     None,
//!     TransformerOptions::default(),
//! );
//!
//! let ctx = RouteContext::new("/wp/v2/posts/reports").with_param("skeleton", "1");
//! let schema = transformer.transform(&json!([{ "id": 1, "title": { "rendered": "Hi" } }]), &ctx);
//! assert_eq!(schema, json!(["id", "title_rendered"]));
//! ```

pub mod classifier;
pub mod dates;
pub mod keys;
pub mod probe;
pub mod skeleton;
pub mod transformer;

pub use classifier::ValueClassifier;
pub use keys::{normalize_token, to_title, DisplayNameHook, IdentityHook, KeyNormalizer};
pub use probe::{HttpImageProbe, ImageProbe, NoProbe, Resolver};
pub use skeleton::{SkeletonExtractor, SkeletonMode};
pub use transformer::{ResponseTransformer, TransformOutcome, TransformerOptions};
