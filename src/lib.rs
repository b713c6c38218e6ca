//! # Tagcache
//!
//! Operator tooling for the tag-indexed cache in [`tagcache_cache`].

pub mod cli;
pub mod config;

pub use tagcache_cache as cache;
