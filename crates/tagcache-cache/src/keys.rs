//! Cache key derivation.
//!
//! Entry keys are the lowercase hex SHA-256 of the tag name followed by the
//! canonical JSON form of the parameters. Index keys are human-readable:
//! [`INDEX_KEY_PREFIX`] followed by the tag name.

use crate::CacheError;
use crate::tag::CacheTag;
use serde::Serialize;
use sha2::{Digest, Sha256};

/// Prefix of every tag index key.
pub const INDEX_KEY_PREFIX: &str = "master";

/// Derives the entry key for a tag and optional parameters.
///
/// Parameters are converted to a [`serde_json::Value`] before rendering, so
/// object keys come out sorted and struct field order does not leak into the
/// key. `None` and JSON `null` both contribute nothing to the hashed text.
///
/// # Example
///
/// ```ignore
/// let key = derive_key(&Tag::Values, Some(&json!({ "id": 5 })))?;
/// // sha256("Values{\"id\":5}")
/// ```
pub fn derive_key<T, P>(tag: &T, parameters: Option<&P>) -> Result<String, CacheError>
where
    T: CacheTag + ?Sized,
    P: Serialize + ?Sized,
{
    let serialized = match parameters {
        Some(parameters) => canonical_json(parameters)?,
        None => String::new(),
    };

    Ok(sha256_hex(&format!("{}{}", tag.name(), serialized)))
}

/// Key under which the member list of `tag` is stored.
pub fn index_key<T: CacheTag + ?Sized>(tag: &T) -> String {
    format!("{}{}", INDEX_KEY_PREFIX, tag.name())
}

/// Compact JSON with object keys in sorted order.
fn canonical_json<P: Serialize + ?Sized>(parameters: &P) -> Result<String, CacheError> {
    let value = serde_json::to_value(parameters)?;
    if value.is_null() {
        return Ok(String::new());
    }
    Ok(serde_json::to_string(&value)?)
}

fn sha256_hex(text: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(text.as_bytes());
    hex::encode(hasher.finalize())
}
