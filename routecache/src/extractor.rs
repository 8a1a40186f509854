//! Builds the key input for a request.
//!
//! | Strategy | Input |
//! |----------|-------|
//! | `GET`    | route parameters, then query parameters |
//! | `POST`   | body parameters |
//! | `USER`   | the current user, or an empty mapping when anonymous |
//! | `ALL`    | route, query, body and user parameters in that order |
//! | `MIXED`  | `{GET: .., POST: .., USER: ..}`, `USER` only when a user is present |
//!
//! Merges keep the first value seen for a name, so route parameters win over
//! query parameters of the same name, and so on down the list.
//!
//! For `MIXED` the allow-list applies to the top-level names `GET`, `POST`
//! and `USER`; nested field names are never filtered.

use routecache_core::{
    CacheDirective, Params, RequestContext, RequestInput, Strategy, UserProvider,
};
use serde_json::Value;

/// Builds the strategy-specific input of a request.
#[derive(Debug, Clone, Copy, Default)]
pub struct AttributeExtractor;

impl AttributeExtractor {
    /// Extracts the key input for `directive` from `request`.
    pub fn extract<Q>(
        directive: &CacheDirective,
        request: &Q,
        users: Option<&dyn UserProvider<Q>>,
    ) -> RequestInput
    where
        Q: RequestContext + ?Sized,
    {
        let user = || users.and_then(|provider| provider.current_user(request));
        let input = match directive.strategy() {
            Strategy::Get => Self::get_params(request),
            Strategy::Post => request.body_params().clone(),
            Strategy::User => user().unwrap_or_default(),
            Strategy::All => {
                let mut params = Self::get_params(request);
                merge(&mut params, request.body_params());
                if let Some(user) = user() {
                    merge(&mut params, &user);
                }
                params
            }
            Strategy::Mixed => {
                let mut params = Params::new();
                params.insert("GET".into(), Value::Object(Self::get_params(request)));
                params.insert("POST".into(), Value::Object(request.body_params().clone()));
                if let Some(user) = user() {
                    params.insert("USER".into(), Value::Object(user));
                }
                params
            }
        };
        Value::Object(input)
    }

    fn get_params<Q: RequestContext + ?Sized>(request: &Q) -> Params {
        let mut params = request.route_params().clone();
        merge(&mut params, request.query_params());
        params
    }
}

fn merge(into: &mut Params, from: &Params) {
    for (name, value) in from {
        if !into.contains_key(name) {
            into.insert(name.clone(), value.clone());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[derive(Default)]
    struct Request {
        route: Params,
        query: Params,
        body: Params,
    }

    impl RequestContext for Request {
        fn route(&self) -> Option<&str> {
            Some("task_show")
        }
        fn handler(&self) -> Option<&str> {
            Some("TaskController::show")
        }
        fn route_params(&self) -> &Params {
            &self.route
        }
        fn query_params(&self) -> &Params {
            &self.query
        }
        fn body_params(&self) -> &Params {
            &self.body
        }
        fn header(&self, _name: &str) -> Option<&str> {
            None
        }
    }

    fn params(value: Value) -> Params {
        match value {
            Value::Object(map) => map,
            _ => Params::new(),
        }
    }

    fn request() -> Request {
        Request {
            route: params(json!({"id": "7"})),
            query: params(json!({"sort": "asc", "id": "99"})),
            body: params(json!({"title": "new", "sort": "desc"})),
        }
    }

    fn user(_: &Request) -> Option<Params> {
        Some(params(json!({"id": 1, "name": "ana"})))
    }

    fn anonymous(_: &Request) -> Option<Params> {
        None
    }

    fn extract(strategy: Strategy, users: Option<&dyn UserProvider<Request>>) -> Value {
        AttributeExtractor::extract(&CacheDirective::new(strategy), &request(), users)
    }

    #[test]
    fn test_get_merges_route_then_query() {
        assert_eq!(extract(Strategy::Get, None), json!({"id": "7", "sort": "asc"}));
    }

    #[test]
    fn test_post_uses_body_only() {
        assert_eq!(
            extract(Strategy::Post, Some(&user)),
            json!({"title": "new", "sort": "desc"})
        );
    }

    #[test]
    fn test_user_strategy() {
        assert_eq!(extract(Strategy::User, Some(&user)), json!({"id": 1, "name": "ana"}));
        assert_eq!(extract(Strategy::User, Some(&anonymous)), json!({}));
        assert_eq!(extract(Strategy::User, None), json!({}));
    }

    #[test]
    fn test_all_keeps_first_seen() {
        assert_eq!(
            extract(Strategy::All, Some(&user)),
            json!({"id": "7", "sort": "asc", "title": "new", "name": "ana"})
        );
    }

    #[test]
    fn test_mixed_without_user() {
        assert_eq!(
            extract(Strategy::Mixed, Some(&anonymous)),
            json!({
                "GET": {"id": "7", "sort": "asc"},
                "POST": {"title": "new", "sort": "desc"},
            })
        );
    }

    #[test]
    fn test_mixed_with_user() {
        let input = extract(Strategy::Mixed, Some(&user));
        assert_eq!(input["USER"], json!({"id": 1, "name": "ana"}));
        assert_eq!(input.as_object().map(|map| map.len()), Some(3));
    }

    #[test]
    fn test_get_scenario_key_body() {
        let request = Request {
            route: params(json!({"id": "7"})),
            query: params(json!({"sort": "asc"})),
            ..Default::default()
        };
        let directive = CacheDirective::new(Strategy::Get);
        let input = AttributeExtractor::extract(&directive, &request, None);

        assert_eq!(input, json!({"id": "7", "sort": "asc"}));
        assert_eq!(
            routecache_core::KeyDeriver::key_body(&input, directive.attributes()),
            "id_7&sort_asc"
        );
    }
}
