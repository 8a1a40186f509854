//! Cache key types and derivation.
//!
//! A [`CacheKey`] is the lowercase hex SHA-256 digest of
//! `{route}_{key body}`, where the key body is a flat string built from the
//! request input by [`KeyDeriver`].
//!
//! ## Key body
//!
//! - A **scalar** input is rendered as-is: strings verbatim, numbers in
//!   decimal, `true`/`false` as `1`/`0`, and `null` as the empty string.
//! - A **mapping** input is first restricted to the directive's allow-list
//!   (when the list is non-empty), then serialized query-string style in
//!   insertion order: `name=value` pairs joined with `&`, names and values
//!   form-urlencoded, nested mappings flattened as `outer[inner]`, arrays as
//!   `outer[0]`, and `null` values dropped. Finally every `=` becomes `_`
//!   so the field/value separator cannot collide with anything else in the
//!   hashed string.
//!
//! ```
//! use routecache_core::{AllowList, KeyDeriver};
//! use serde_json::json;
//!
//! let input = json!({"id": "7", "sort": "asc"});
//! assert_eq!(KeyDeriver::key_body(&input, &AllowList::new()), "id_7&sort_asc");
//!
//! let key = KeyDeriver::derive("task_show", &input, &AllowList::new());
//! assert_eq!(key.as_str().len(), 64);
//! ```
//!
//! An empty mapping (or one emptied by the allow-list) yields the empty key
//! body, which is still a valid key: every request to the route shares one
//! entry.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use sha2::{Digest, Sha256};
use smol_str::SmolStr;
use url::form_urlencoded::byte_serialize;

use crate::{AllowList, RequestInput};

/// A cache key identifying a cached response.
///
/// Always a 64-character lowercase hex SHA-256 digest. The only way to build
/// one is through [`KeyDeriver`], so every key in the system satisfies that
/// shape.
///
/// Cloning is cheap: the digest is stored in a [`SmolStr`], which shares
/// heap-allocated strings by reference count.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CacheKey(SmolStr);

impl CacheKey {
    /// Returns the hex digest.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl AsRef<str> for CacheKey {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Derives cache keys from a route identifier and a request input.
///
/// Derivation is a pure function: the same route, input and allow-list give
/// the same key in any process, because mappings are walked in insertion order
/// (`serde_json` is built with `preserve_order`).
#[derive(Debug, Clone, Copy, Default)]
pub struct KeyDeriver;

impl KeyDeriver {
    /// Derives the cache key for `input` on `route`.
    pub fn derive(route: &str, input: &RequestInput, allow_list: &AllowList) -> CacheKey {
        let body = Self::key_body(input, allow_list);
        let mut hasher = Sha256::new();
        hasher.update(route.as_bytes());
        hasher.update(b"_");
        hasher.update(body.as_bytes());
        CacheKey(SmolStr::new(hex::encode(hasher.finalize())))
    }

    /// Builds the string that is hashed (after the `{route}_` prefix).
    pub fn key_body(input: &RequestInput, allow_list: &AllowList) -> String {
        match input {
            Value::Object(map) => {
                let fields = map
                    .iter()
                    .filter(|(name, _)| allow_list.is_empty() || allow_list.contains(*name))
                    .map(|(name, value)| (name.clone(), value));
                build_query(fields).replace('=', "_")
            }
            Value::Array(items) => {
                let fields = items
                    .iter()
                    .enumerate()
                    .map(|(index, value)| (index.to_string(), value))
                    .filter(|(name, _)| allow_list.is_empty() || allow_list.contains(name));
                build_query(fields).replace('=', "_")
            }
            scalar => scalar_body(scalar),
        }
    }
}

fn scalar_body(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::Bool(true) => "1".to_owned(),
        Value::Bool(false) => "0".to_owned(),
        Value::Number(number) => number.to_string(),
        Value::String(text) => text.clone(),
        // Containers are handled by the caller.
        Value::Array(_) | Value::Object(_) => String::new(),
    }
}

fn encode(text: &str) -> String {
    byte_serialize(text.as_bytes()).collect()
}

fn build_query<'a>(fields: impl Iterator<Item = (String, &'a Value)>) -> String {
    let mut pairs = Vec::new();
    for (name, value) in fields {
        push_pairs(encode(&name), value, &mut pairs);
    }
    pairs.join("&")
}

fn push_pairs(name: String, value: &Value, pairs: &mut Vec<String>) {
    match value {
        Value::Null => {}
        Value::Object(map) => {
            for (inner, value) in map {
                push_pairs(format!("{name}%5B{}%5D", encode(inner)), value, pairs);
            }
        }
        Value::Array(items) => {
            for (index, value) in items.iter().enumerate() {
                push_pairs(format!("{name}%5B{index}%5D"), value, pairs);
            }
        }
        scalar => pairs.push(format!("{name}={}", encode(&scalar_body(scalar)))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn allow(names: &[&str]) -> AllowList {
        names.iter().map(|name| name.to_string()).collect()
    }

    #[test]
    fn test_flat_mapping_body() {
        let input = json!({"id": "7", "sort": "asc"});
        assert_eq!(KeyDeriver::key_body(&input, &AllowList::new()), "id_7&sort_asc");
    }

    #[test]
    fn test_key_is_sha256_of_route_and_body() {
        let input = json!({"id": "7", "sort": "asc"});
        let key = KeyDeriver::derive("task_show", &input, &AllowList::new());

        let expected = hex::encode(Sha256::digest(b"task_show_id_7&sort_asc"));
        assert_eq!(key.as_str(), expected);
    }

    #[test]
    fn test_same_input_same_key() {
        let first = KeyDeriver::derive("tasks", &json!({"page": 1}), &AllowList::new());
        let second = KeyDeriver::derive("tasks", &json!({"page": 1}), &AllowList::new());
        assert_eq!(first, second);
    }

    #[test]
    fn test_changed_value_changes_key() {
        let asc = KeyDeriver::derive("tasks", &json!({"sort": "asc"}), &AllowList::new());
        let desc = KeyDeriver::derive("tasks", &json!({"sort": "desc"}), &AllowList::new());
        assert_ne!(asc, desc);
    }

    #[test]
    fn test_route_participates_in_key() {
        let input = json!({"id": "1"});
        let show = KeyDeriver::derive("task_show", &input, &AllowList::new());
        let edit = KeyDeriver::derive("task_edit", &input, &AllowList::new());
        assert_ne!(show, edit);
    }

    #[test]
    fn test_allow_list_ignores_other_fields() {
        let allow_list = allow(&["id"]);
        let first = KeyDeriver::derive("t", &json!({"id": "1", "ts": "100"}), &allow_list);
        let second = KeyDeriver::derive("t", &json!({"id": "1", "ts": "200"}), &allow_list);
        let third = KeyDeriver::derive("t", &json!({"id": "2", "ts": "100"}), &allow_list);

        assert_eq!(first, second);
        assert_ne!(first, third);
    }

    #[test]
    fn test_allow_list_names_missing_from_input_are_ignored() {
        let body = KeyDeriver::key_body(&json!({"id": "1"}), &allow(&["id", "lang"]));
        assert_eq!(body, "id_1");
    }

    #[test]
    fn test_allow_list_preserves_input_order() {
        let body = KeyDeriver::key_body(&json!({"b": "2", "a": "1"}), &allow(&["a", "b"]));
        assert_eq!(body, "b_2&a_1");
    }

    #[test]
    fn test_empty_mapping_is_empty_body() {
        assert_eq!(KeyDeriver::key_body(&json!({}), &AllowList::new()), "");
        assert_eq!(KeyDeriver::key_body(&json!({"x": "1"}), &allow(&["y"])), "");
    }

    #[test]
    fn test_scalar_bodies() {
        let empty = AllowList::new();
        assert_eq!(KeyDeriver::key_body(&json!("plain text"), &empty), "plain text");
        assert_eq!(KeyDeriver::key_body(&json!(42), &empty), "42");
        assert_eq!(KeyDeriver::key_body(&json!(true), &empty), "1");
        assert_eq!(KeyDeriver::key_body(&json!(false), &empty), "0");
        assert_eq!(KeyDeriver::key_body(&Value::Null, &empty), "");
    }

    #[test]
    fn test_values_are_form_encoded() {
        let body = KeyDeriver::key_body(&json!({"q": "a b&c=d"}), &AllowList::new());
        assert_eq!(body, "q_a+b%26c%3Dd");
    }

    #[test]
    fn test_nested_mapping_is_flattened() {
        let input = json!({
            "GET": {"id": "7", "tags": ["x", "y"]},
            "POST": {"flag": true, "gone": null},
        });
        let body = KeyDeriver::key_body(&input, &AllowList::new());
        assert_eq!(
            body,
            "GET%5Bid%5D_7&GET%5Btags%5D%5B0%5D_x&GET%5Btags%5D%5B1%5D_y&POST%5Bflag%5D_1"
        );
    }

    #[test]
    fn test_allow_list_on_nested_mapping_filters_top_level_only() {
        let input = json!({"GET": {"id": "7"}, "POST": {"name": "n"}});
        let body = KeyDeriver::key_body(&input, &allow(&["GET"]));
        assert_eq!(body, "GET%5Bid%5D_7");
    }

    #[test]
    fn test_display_matches_digest() {
        let key = KeyDeriver::derive("r", &json!("v"), &AllowList::new());
        assert_eq!(key.to_string(), key.as_str());
        assert!(key.as_str().chars().all(|c| c.is_ascii_hexdigit()));
    }
}
