//! Request input types.
//!
//! Request parameters travel as JSON values so that nested form fields,
//! JSON bodies and user representations share one shape.

/// A name-to-value mapping of request parameters.
///
/// Insertion order is preserved, which keeps cache keys stable.
pub type Params = serde_json::Map<String, serde_json::Value>;

/// The value a cache key is derived from: a mapping or a single scalar.
pub type RequestInput = serde_json::Value;
