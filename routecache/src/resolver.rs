//! Lookup of cache directives by handler.
//!
//! Directives are attached to handlers once at startup and looked up per
//! request through [`DirectiveResolver`]. [`DirectiveRegistry`] is the static
//! implementation used by the configuration and tower crates.

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use routecache_core::CacheDirective;
use smol_str::SmolStr;

use crate::{ConfigurationError, ResolutionError};

/// A `Type::method` reference to a request handler.
///
/// The type part may carry a module path; the method is whatever follows the
/// last `::`.
///
/// ```
/// use routecache::HandlerRef;
///
/// let handler: HandlerRef = "app::TaskController::show".parse().unwrap();
/// assert_eq!(handler.type_name(), "app::TaskController");
/// assert_eq!(handler.method(), "show");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct HandlerRef {
    type_name: SmolStr,
    method: SmolStr,
}

impl HandlerRef {
    /// Creates a reference from its two parts.
    pub fn new(type_name: impl Into<SmolStr>, method: impl Into<SmolStr>) -> Self {
        HandlerRef {
            type_name: type_name.into(),
            method: method.into(),
        }
    }

    /// The handler type, including any module path.
    pub fn type_name(&self) -> &str {
        &self.type_name
    }

    /// The handler method.
    pub fn method(&self) -> &str {
        &self.method
    }
}

impl fmt::Display for HandlerRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}::{}", self.type_name, self.method)
    }
}

impl FromStr for HandlerRef {
    type Err = ResolutionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().rsplit_once("::") {
            Some((type_name, method))
                if !type_name.is_empty()
                    && !method.is_empty()
                    && !type_name.ends_with(':')
                    && method.chars().all(|c| c.is_alphanumeric() || c == '_') =>
            {
                Ok(HandlerRef::new(type_name, method))
            }
            _ => Err(ResolutionError::MalformedHandler(s.to_owned())),
        }
    }
}

/// Returns the cache directive of a handler.
pub trait DirectiveResolver: Send + Sync {
    /// `Ok(None)` for a known handler without a directive. An error means the
    /// handler itself cannot be resolved.
    fn resolve(&self, handler: &HandlerRef) -> Result<Option<CacheDirective>, ResolutionError>;
}

/// Directives computed once at startup, keyed by handler.
///
/// ```
/// use routecache::{DirectiveRegistry, DirectiveResolver, HandlerRef};
/// use routecache_core::{CacheDirective, Strategy};
///
/// let registry = DirectiveRegistry::new()
///     .cached("TaskController::show", CacheDirective::new(Strategy::Get))
///     .unwrap()
///     .uncached("TaskController::update")
///     .unwrap();
///
/// let show = HandlerRef::new("TaskController", "show");
/// assert!(registry.resolve(&show).unwrap().is_some());
/// let missing = HandlerRef::new("Other", "index");
/// assert!(registry.resolve(&missing).is_err());
/// ```
#[derive(Debug, Clone, Default)]
pub struct DirectiveRegistry {
    handlers: HashMap<HandlerRef, Option<CacheDirective>>,
}

impl DirectiveRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `handler`, with or without a directive.
    pub fn insert(
        &mut self,
        handler: &str,
        directive: Option<CacheDirective>,
    ) -> Result<(), ConfigurationError> {
        let handler = handler
            .parse::<HandlerRef>()
            .map_err(|_| ConfigurationError::InvalidHandler(handler.to_owned()))?;
        self.handlers.insert(handler, directive);
        Ok(())
    }

    /// Registers a cached handler.
    pub fn cached(
        mut self,
        handler: &str,
        directive: CacheDirective,
    ) -> Result<Self, ConfigurationError> {
        self.insert(handler, Some(directive))?;
        Ok(self)
    }

    /// Registers a handler that is never cached.
    pub fn uncached(mut self, handler: &str) -> Result<Self, ConfigurationError> {
        self.insert(handler, None)?;
        Ok(self)
    }

    /// Number of registered handlers.
    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    /// Returns `true` if no handler is registered.
    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }
}

impl DirectiveResolver for DirectiveRegistry {
    fn resolve(&self, handler: &HandlerRef) -> Result<Option<CacheDirective>, ResolutionError> {
        self.handlers
            .get(handler)
            .cloned()
            .ok_or_else(|| ResolutionError::UnknownHandler(handler.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use routecache_core::Strategy;

    #[test]
    fn test_malformed_handlers() {
        for raw in ["", "show", "::show", "TaskController::", "Task:::show", "Task::sh ow"] {
            assert_eq!(
                raw.parse::<HandlerRef>(),
                Err(ResolutionError::MalformedHandler(raw.to_owned())),
                "{raw}"
            );
        }
    }

    #[test]
    fn test_display_round_trips() {
        let handler: HandlerRef = "TaskController::show".parse().unwrap();
        assert_eq!(handler.to_string(), "TaskController::show");
    }

    #[test]
    fn test_uncached_handler_resolves_to_none() {
        let registry = DirectiveRegistry::new().uncached("Home::index").unwrap();
        let handler = HandlerRef::new("Home", "index");
        assert_eq!(registry.resolve(&handler), Ok(None));
    }

    #[test]
    fn test_invalid_handler_rejected_at_registration() {
        let err = DirectiveRegistry::new()
            .cached("nonsense", CacheDirective::new(Strategy::Get))
            .unwrap_err();
        assert!(matches!(err, ConfigurationError::InvalidHandler(name) if name == "nonsense"));
    }
}
