//! Inheritance Resolver - fold documents along their inheritance chains
//!
//! Documents name the documents they inherit from. The resolver places one
//! node per document in a `pin_graph::Graph`, links each document to its
//! parents, and walks the resulting ordinals so parents are merged before
//! the documents that inherit from them.
//!
//! When the documents form several disjoint trees, or several documents
//! share the highest ordinal, an empty root node is spliced in so the walk
//! ends at a single node.
//!
//! # Example
//!
//! ```
//! use inheritance_resolver::{resolve_documents, JsonDocument};
//! use serde_json::json;
//!
//! let merged = resolve_documents(vec![
//!     JsonDocument::new("default").with_field("steps", json!(20)),
//!     JsonDocument::new("SDXL")
//!         .with_inherits(&["default"])
//!         .with_field("steps", json!(30)),
//! ])
//! .unwrap();
//!
//! assert_eq!(merged["steps"], json!(30));
//! ```

pub mod config;
pub mod error;
pub mod json;
pub mod resolver;

pub use config::ResolverConfig;
pub use error::{ResolveError, Result};
pub use json::{merge_json, merge_object, resolve_documents, JsonDocument};
pub use resolver::{InheritanceResolver, Inheritable};
