//! Per-route cache directives.
//!
//! A [`CacheDirective`] says which parts of a request feed the cache key
//! ([`Strategy`]), how long the stored response lives, and which top-level
//! input fields participate in the key (the allow-list).

use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{CacheKey, KeyDeriver, RequestInput};

/// Longest lifetime a directive keeps; longer ones are clamped to it.
pub const MAX_EXPIRY: Duration = Duration::from_secs(100 * 365 * 24 * 60 * 60);

/// Field names allowed to participate in a cache key.
///
/// Empty means every field participates.
pub type AllowList = BTreeSet<String>;

/// Which parts of the request feed the cache key.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Strategy {
    /// Route path parameters and query parameters.
    Get,
    /// Body parameters only.
    Post,
    /// The current user's representation.
    User,
    /// `{GET: .., POST: .., USER: ..}` kept apart under their own names.
    #[default]
    Mixed,
    /// Route, query, body and user parameters merged into one mapping.
    All,
}

impl Strategy {
    /// The strategy's canonical upper-case name.
    pub const fn as_str(&self) -> &'static str {
        match self {
            Strategy::Get => "GET",
            Strategy::Post => "POST",
            Strategy::User => "USER",
            Strategy::Mixed => "MIXED",
            Strategy::All => "ALL",
        }
    }

    /// Returns `true` if the strategy reads body parameters.
    pub const fn reads_body(&self) -> bool {
        match self {
            Strategy::Post | Strategy::Mixed | Strategy::All => true,
            Strategy::Get | Strategy::User => false,
        }
    }
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A strategy name that is not one of `GET`, `POST`, `USER`, `MIXED`, `ALL`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown cache strategy `{0}`")]
pub struct UnknownStrategy(pub String);

impl FromStr for Strategy {
    type Err = UnknownStrategy;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "GET" => Ok(Strategy::Get),
            "POST" => Ok(Strategy::Post),
            "USER" => Ok(Strategy::User),
            "MIXED" => Ok(Strategy::Mixed),
            "ALL" => Ok(Strategy::All),
            other => Err(UnknownStrategy(other.to_owned())),
        }
    }
}

/// Caching configuration for one handler.
///
/// ```
/// use routecache_core::{CacheDirective, Strategy};
/// use std::time::Duration;
///
/// let directive = CacheDirective::new(Strategy::Get)
///     .expires(Duration::from_secs(60))
///     .attribute("id");
///
/// assert_eq!(directive.ttl(), Some(Duration::from_secs(60)));
/// assert!(directive.attributes().contains("id"));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CacheDirective {
    strategy: Strategy,
    expires: Option<Duration>,
    attributes: AllowList,
}

impl CacheDirective {
    /// Creates a directive without expiry and with an empty allow-list.
    pub fn new(strategy: Strategy) -> Self {
        CacheDirective {
            strategy,
            expires: None,
            attributes: AllowList::new(),
        }
    }

    /// Sets the lifetime of stored responses.
    ///
    /// The lifetime is kept in whole seconds, rounded up, and at most
    /// [`MAX_EXPIRY`].
    pub fn expires(mut self, expires: Duration) -> Self {
        self.expires = Some(whole_seconds(expires));
        self
    }

    /// Sets or clears the lifetime of stored responses.
    pub fn expires_opt(mut self, expires: Option<Duration>) -> Self {
        self.expires = expires.map(whole_seconds);
        self
    }

    /// Adds one name to the allow-list.
    pub fn attribute(mut self, name: impl Into<String>) -> Self {
        self.attributes.insert(name.into());
        self
    }

    /// Replaces the allow-list.
    pub fn with_attributes<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.attributes = names.into_iter().map(Into::into).collect();
        self
    }

    /// The key strategy.
    pub fn strategy(&self) -> Strategy {
        self.strategy
    }

    /// The configured lifetime, as given.
    pub fn expiry(&self) -> Option<Duration> {
        self.expires
    }

    /// Lifetime to store responses with. A zero lifetime means none.
    pub fn ttl(&self) -> Option<Duration> {
        self.expires.filter(|expires| !expires.is_zero())
    }

    /// The allow-list.
    pub fn attributes(&self) -> &AllowList {
        &self.attributes
    }

    /// Derives the key for `input` on `route` using this directive's
    /// allow-list.
    pub fn key(&self, route: &str, input: &RequestInput) -> CacheKey {
        KeyDeriver::derive(route, input, &self.attributes)
    }
}

fn whole_seconds(expires: Duration) -> Duration {
    Duration::from_secs(crate::value::ttl_secs(expires)).min(MAX_EXPIRY)
}
