//! Pipeline settings.

use routecache_backend::Format;
use serde::Deserialize;

/// Default name of the request header that controls caching.
pub const DEFAULT_CONTROL_HEADER: &str = "N-CACHE";

/// Default cap on request and response bodies read by the cache: 8 MiB.
pub const DEFAULT_MAX_BODY_SIZE: usize = 8 * 1024 * 1024;

/// Settings shared by every request the pipeline sees.
///
/// ```
/// use routecache::PipelineConfig;
///
/// let config = PipelineConfig::default();
/// assert!(config.enabled);
/// assert_eq!(config.control_header, "N-CACHE");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// When `false` every request passes through untouched.
    pub enabled: bool,
    /// Request header read by the invalidation controller.
    pub control_header: String,
    /// Encoding of stored responses.
    pub value_format: Format,
    /// Largest body read into memory. Larger request bodies are served
    /// uncached and larger responses are not stored. `None` means no cap.
    pub max_body_size: Option<usize>,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        PipelineConfig {
            enabled: true,
            control_header: DEFAULT_CONTROL_HEADER.to_owned(),
            value_format: Format::default(),
            max_body_size: Some(DEFAULT_MAX_BODY_SIZE),
        }
    }
}

impl PipelineConfig {
    /// Disables caching.
    pub fn disabled() -> Self {
        PipelineConfig {
            enabled: false,
            ..Default::default()
        }
    }

    /// Sets the control header name.
    pub fn control_header(mut self, name: impl Into<String>) -> Self {
        self.control_header = name.into();
        self
    }

    /// Sets the body size cap; `None` removes it.
    pub fn max_body_size(mut self, limit: Option<usize>) -> Self {
        self.max_body_size = limit;
        self
    }

    /// Sets the value encoding.
    pub fn value_format(mut self, format: Format) -> Self {
        self.value_format = format;
        self
    }
}
