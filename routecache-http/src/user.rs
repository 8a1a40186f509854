use std::fmt;
use std::marker::PhantomData;

use routecache_core::{Params, UserProvider, represent};
use serde::Serialize;

use crate::HttpRequestContext;

/// Reads the current user from the request extensions.
///
/// Authentication middleware running before the cache layer stores the
/// authenticated user as a request extension of type `T`; this provider
/// picks it up and serializes it into the mapping used for cache keys.
/// Requests without the extension are anonymous.
pub struct ExtensionUser<T> {
    _user: PhantomData<fn() -> T>,
}

impl<T> ExtensionUser<T> {
    /// Creates the provider.
    pub fn new() -> Self {
        ExtensionUser { _user: PhantomData }
    }
}

impl<T> Default for ExtensionUser<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Clone for ExtensionUser<T> {
    fn clone(&self) -> Self {
        Self::new()
    }
}

impl<T> fmt::Debug for ExtensionUser<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExtensionUser")
            .field("type", &std::any::type_name::<T>())
            .finish()
    }
}

impl<T> UserProvider<HttpRequestContext> for ExtensionUser<T>
where
    T: Serialize + Send + Sync + 'static,
{
    fn current_user(&self, request: &HttpRequestContext) -> Option<Params> {
        let user = request.parts().extensions.get::<T>()?;
        let represented = represent(user);
        if represented.is_none() {
            tracing::debug!(
                user_type = std::any::type_name::<T>(),
                "user does not serialize to a mapping, treated as anonymous"
            );
        }
        represented
    }
}
