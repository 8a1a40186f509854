//! Names for cache pools.

use std::fmt;

use smol_str::SmolStr;

/// Identifies one pool in a chain.
///
/// Shows up in logs and in the result of a chain read so callers can tell
/// which pool answered.
///
/// ```
/// use routecache_core::BackendLabel;
///
/// assert_eq!(BackendLabel::new_static("moka").as_str(), "moka");
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct BackendLabel(SmolStr);

impl BackendLabel {
    /// Creates a label.
    #[inline]
    pub fn new(name: impl Into<SmolStr>) -> Self {
        Self(name.into())
    }

    /// Creates a label from a static string without allocating.
    #[inline]
    pub const fn new_static(name: &'static str) -> Self {
        Self(SmolStr::new_static(name))
    }

    /// Returns the label text.
    #[inline]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for BackendLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl From<&str> for BackendLabel {
    fn from(name: &str) -> Self {
        Self(SmolStr::new(name))
    }
}

impl From<String> for BackendLabel {
    fn from(name: String) -> Self {
        Self(SmolStr::from(name))
    }
}
