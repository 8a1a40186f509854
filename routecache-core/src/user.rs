//! Current-user lookup.

use serde::Serialize;

use crate::Params;

/// Supplies a representation of the user behind a request.
///
/// Returns `None` for anonymous requests; the pipeline then omits the user
/// from cache keys.
pub trait UserProvider<R: ?Sized>: Send + Sync {
    /// Returns the current user's representation.
    fn current_user(&self, request: &R) -> Option<Params>;
}

impl<R: ?Sized, F> UserProvider<R> for F
where
    F: Fn(&R) -> Option<Params> + Send + Sync,
{
    fn current_user(&self, request: &R) -> Option<Params> {
        self(request)
    }
}

/// Turns a user value into the mapping used in cache keys.
///
/// Values that do not serialize to a JSON object yield `None`.
pub fn represent<T: Serialize>(user: &T) -> Option<Params> {
    match serde_json::to_value(user) {
        Ok(serde_json::Value::Object(map)) => Some(map),
        _ => None,
    }
}
