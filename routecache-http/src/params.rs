//! Query string and body parameter parsing.

use http::HeaderMap;
use http::header::CONTENT_TYPE;
use routecache_core::Params;
use serde_json::Value;
use url::form_urlencoded;

/// Parses a form-urlencoded string into parameters.
///
/// Names ending in `[]` collect their values into an array under the bare
/// name. Any other repeated name keeps its last value. Parameters keep the
/// order in which their names first appear.
pub fn parse_form(input: &str) -> Params {
    let mut params = Params::new();
    for (name, value) in form_urlencoded::parse(input.as_bytes()) {
        let value = Value::String(value.into_owned());
        match name.strip_suffix("[]") {
            Some(name) => match params.get_mut(name) {
                Some(Value::Array(items)) => items.push(value),
                _ => {
                    params.insert(name.to_owned(), Value::Array(vec![value]));
                }
            },
            None => {
                params.insert(name.into_owned(), value);
            }
        }
    }
    params
}

/// Parses body parameters according to the `Content-Type` header.
///
/// Form bodies and JSON object bodies are understood; anything else gives
/// an empty mapping.
pub fn parse_body(headers: &HeaderMap, body: &[u8]) -> Params {
    if body.is_empty() {
        return Params::new();
    }
    let mime = headers
        .get(CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.split(';').next())
        .map(|value| value.trim().to_ascii_lowercase());

    match mime.as_deref() {
        Some("application/x-www-form-urlencoded") => match std::str::from_utf8(body) {
            Ok(text) => parse_form(text),
            Err(error) => {
                tracing::warn!(%error, "form body is not valid UTF-8, ignored");
                Params::new()
            }
        },
        Some(mime) if mime == "application/json" || mime.ends_with("+json") => {
            match serde_json::from_slice::<Value>(body) {
                Ok(Value::Object(map)) => map,
                Ok(_) => {
                    tracing::debug!("JSON body is not an object, ignored");
                    Params::new()
                }
                Err(error) => {
                    tracing::warn!(%error, "malformed JSON body, ignored");
                    Params::new()
                }
            }
        }
        other => {
            tracing::trace!(content_type = ?other, "body not parsed");
            Params::new()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use http::HeaderValue;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn headers(content_type: &'static str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static(content_type));
        headers
    }

    #[test]
    fn test_parse_form_single() {
        let params = parse_form("key=value");
        assert_eq!(Value::Object(params), json!({"key": "value"}));
    }

    #[test]
    fn test_parse_form_keeps_order() {
        let params = parse_form("sort=asc&id=7&page=2");
        let names: Vec<_> = params.keys().cloned().collect();
        assert_eq!(names, vec!["sort", "id", "page"]);
    }

    #[test]
    fn test_parse_form_decodes() {
        let params = parse_form("q=a+b%26c");
        assert_eq!(Value::Object(params), json!({"q": "a b&c"}));
    }

    #[test]
    fn test_parse_form_array_bracket_syntax() {
        let params = parse_form("color[]=red&color[]=blue&color[]=green");
        assert_eq!(Value::Object(params), json!({"color": ["red", "blue", "green"]}));
    }

    #[test]
    fn test_parse_form_last_plain_value_wins() {
        let params = parse_form("color=red&color=blue");
        assert_eq!(Value::Object(params), json!({"color": "blue"}));
    }

    #[test]
    fn test_parse_form_empty() {
        assert!(parse_form("").is_empty());
    }

    #[test]
    fn test_parse_body_form() {
        let params = parse_body(
            &headers("application/x-www-form-urlencoded; charset=UTF-8"),
            b"name=task&done=1",
        );
        assert_eq!(Value::Object(params), json!({"name": "task", "done": "1"}));
    }

    #[test]
    fn test_parse_body_json_object() {
        let params = parse_body(&headers("application/json"), br#"{"id": 7, "tags": ["a"]}"#);
        assert_eq!(Value::Object(params), json!({"id": 7, "tags": ["a"]}));
    }

    #[test]
    fn test_parse_body_json_suffix() {
        let params = parse_body(&headers("application/vnd.api+json"), br#"{"id": 1}"#);
        assert_eq!(Value::Object(params), json!({"id": 1}));
    }

    #[test]
    fn test_parse_body_json_non_object_is_empty() {
        assert!(parse_body(&headers("application/json"), b"[1, 2]").is_empty());
    }

    #[test]
    fn test_parse_body_malformed_json_is_empty() {
        assert!(parse_body(&headers("application/json"), b"{oops").is_empty());
    }

    #[test]
    fn test_parse_body_other_content_type_is_empty() {
        assert!(parse_body(&headers("text/plain"), b"id=1").is_empty());
        assert!(parse_body(&HeaderMap::new(), b"id=1").is_empty());
    }
}
