//! Value encoding between typed values and stored bytes.

use crate::CacheError;
use serde::Serialize;
use serde::de::DeserializeOwned;

/// Byte encoding for cached values.
///
/// The caller picks the target type at decode time; the stored bytes carry
/// no type information.
pub trait Codec: Send + Sync {
    fn encode<T: Serialize + ?Sized>(&self, value: &T) -> Result<Vec<u8>, CacheError>;

    fn decode<T: DeserializeOwned>(&self, bytes: &[u8]) -> Result<T, CacheError>;

    /// Decodes bytes fetched from a store. Missing bytes are an explicit
    /// `None`, undecodable bytes are an error.
    fn decode_opt<T: DeserializeOwned>(
        &self,
        bytes: Option<&[u8]>,
    ) -> Result<Option<T>, CacheError> {
        bytes.map(|bytes| self.decode(bytes)).transpose()
    }
}

/// JSON encoding via `serde_json`.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonCodec;

impl Codec for JsonCodec {
    fn encode<T: Serialize + ?Sized>(&self, value: &T) -> Result<Vec<u8>, CacheError> {
        Ok(serde_json::to_vec(value)?)
    }

    fn decode<T: DeserializeOwned>(&self, bytes: &[u8]) -> Result<T, CacheError> {
        Ok(serde_json::from_slice(bytes)?)
    }
}
