//! Tag identifiers.
//!
//! A tag is a namespace discriminator: every cached entry is written under
//! exactly one tag, and a whole tag can be invalidated at once.

use std::fmt;
use std::str::FromStr;

/// Anything with a stable textual name that can group cache entries.
///
/// The name takes part in key derivation and in the index key, so it must
/// never change between releases or across instances sharing a store.
pub trait CacheTag: Send + Sync {
    fn name(&self) -> &str;
}

impl<T: CacheTag + ?Sized> CacheTag for &T {
    fn name(&self) -> &str {
        (**self).name()
    }
}

/// The closed set of tags known to this crate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Tag {
    Values,
}

impl Tag {
    /// All known tags.
    pub const ALL: &'static [Tag] = &[Tag::Values];

    pub fn as_str(&self) -> &'static str {
        match self {
            Tag::Values => "Values",
        }
    }
}

impl CacheTag for Tag {
    fn name(&self) -> &str {
        self.as_str()
    }
}

impl fmt::Display for Tag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, thiserror::Error)]
#[error("Unknown tag: {0}")]
pub struct UnknownTag(pub String);

impl FromStr for Tag {
    type Err = UnknownTag;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Tag::ALL
            .iter()
            .copied()
            .find(|tag| tag.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| UnknownTag(s.to_string()))
    }
}
