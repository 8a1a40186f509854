//! Encodings for cached values.

use bincode::config;
use routecache_core::Raw;
use serde::{Deserialize, Serialize, de::DeserializeOwned};

use crate::FormatError;

/// How a response is turned into the bytes a pool stores.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Format {
    /// `serde_json`.
    #[default]
    Json,
    /// bincode with the standard configuration.
    Bincode,
}

impl Format {
    /// Encodes `value`.
    pub fn encode<T: Serialize + ?Sized>(&self, value: &T) -> Result<Raw, FormatError> {
        match self {
            Format::Json => serde_json::to_vec(value)
                .map(Raw::from)
                .map_err(|err| FormatError::Serialize(Box::new(err))),
            Format::Bincode => bincode::serde::encode_to_vec(value, config::standard())
                .map(Raw::from)
                .map_err(|err| FormatError::Serialize(Box::new(err))),
        }
    }

    /// Decodes bytes produced by [`Format::encode`].
    pub fn decode<T: DeserializeOwned>(&self, data: &[u8]) -> Result<T, FormatError> {
        match self {
            Format::Json => {
                serde_json::from_slice(data).map_err(|err| FormatError::Deserialize(Box::new(err)))
            }
            Format::Bincode => bincode::serde::decode_from_slice(data, config::standard())
                .map(|(value, _)| value)
                .map_err(|err| FormatError::Deserialize(Box::new(err))),
        }
    }
}
