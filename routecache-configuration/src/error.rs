use routecache::ConfigurationError;

/// Errors raised while loading or applying a configuration document.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// The document is not valid YAML or does not match the schema.
    #[error("invalid cache configuration: {0}")]
    Yaml(#[from] serde_saphyr::Error),

    /// The document is well-formed but describes an unusable setup.
    #[error(transparent)]
    Configuration(#[from] ConfigurationError),
}
