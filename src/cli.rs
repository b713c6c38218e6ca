//! Operator commands against a tagged cache.
//!
//! Each handler returns the lines to print so the commands can be exercised
//! against any store, including the in-memory one.

use anyhow::Context;
use clap::{Parser, Subcommand};
use serde_json::Value;
use std::time::Duration;
use tagcache_cache::{DistributedCache, EntryOptions, Tag, TaggedCache, index_key};

#[derive(Debug, Parser)]
#[command(name = "tagcache")]
#[command(about = "Inspect and invalidate tagged cache entries", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Print the entry key for a tag and parameters
    Key {
        tag: Tag,

        /// Parameters as JSON, e.g. '{"id":5}'
        #[arg(short, long, value_parser = parse_json)]
        params: Option<Value>,
    },
    /// List the keys recorded under a tag
    Members { tag: Tag },
    /// Print a cached value
    Get {
        tag: Tag,

        #[arg(short, long, value_parser = parse_json)]
        params: Option<Value>,
    },
    /// Store a value and record it under the tag
    Set {
        tag: Tag,

        /// Value as JSON
        #[arg(value_parser = parse_json)]
        value: Value,

        #[arg(short, long, value_parser = parse_json)]
        params: Option<Value>,

        /// Expire this many seconds after the write (default: CACHE_TTL_SECONDS)
        #[arg(long)]
        ttl: Option<u64>,

        /// Expire after this many seconds without reads
        #[arg(long)]
        sliding: Option<u64>,
    },
    /// Remove one entry
    Remove {
        tag: Tag,

        #[arg(short, long, value_parser = parse_json)]
        params: Option<Value>,
    },
    /// Remove every entry under the given tags
    Invalidate {
        #[arg(required = true)]
        tags: Vec<Tag>,
    },
    /// Check the store connection
    Ping,
}

fn parse_json(raw: &str) -> Result<Value, String> {
    serde_json::from_str(raw).map_err(|e| format!("invalid JSON: {e}"))
}

/// Entry options from explicit `set` flags.
///
/// Only used when `--ttl` or `--sliding` is given. With neither flag, `set`
/// falls back to the cache's configured default options instead.
pub fn entry_options(ttl: Option<u64>, sliding: Option<u64>) -> EntryOptions {
    let mut options = match ttl {
        Some(secs) => EntryOptions::expires_in(Duration::from_secs(secs)),
        None => EntryOptions::none(),
    };
    if let Some(secs) = sliding {
        options = options.with_sliding(Duration::from_secs(secs));
    }
    options
}

/// Runs every command except `ping`, which needs the concrete store.
pub async fn run<S: DistributedCache>(
    cache: &TaggedCache<S>,
    command: Command,
) -> anyhow::Result<Vec<String>> {
    match command {
        Command::Key { tag, params } => {
            let key = cache.key_for(&tag, params.as_ref())?;
            Ok(vec![key])
        }
        Command::Members { tag } => {
            let members = cache
                .members(&tag)
                .await
                .with_context(|| format!("reading index for {tag}"))?;
            let mut lines = vec![format!("{} ({} keys)", index_key(&tag), members.len())];
            lines.extend(members.into_iter().map(|key| format!("  {key}")));
            Ok(lines)
        }
        Command::Get { tag, params } => {
            let value: Option<Value> = cache
                .get(&tag, params.as_ref())
                .await
                .with_context(|| format!("reading {tag} entry"))?;
            Ok(vec![match value {
                Some(value) => serde_json::to_string_pretty(&value)?,
                None => "(miss)".to_string(),
            }])
        }
        Command::Set {
            tag,
            value,
            params,
            ttl,
            sliding,
        } => {
            let options = if ttl.is_none() && sliding.is_none() {
                cache.default_options().clone()
            } else {
                entry_options(ttl, sliding)
            };
            cache
                .set(&tag, params.as_ref(), &value, &options)
                .await
                .with_context(|| format!("writing {tag} entry"))?;
            Ok(vec![format!(
                "✅ Stored {}",
                cache.key_for(&tag, params.as_ref())?
            )])
        }
        Command::Remove { tag, params } => {
            cache
                .remove(&tag, params.as_ref())
                .await
                .with_context(|| format!("removing {tag} entry"))?;
            Ok(vec![format!(
                "✅ Removed {}",
                cache.key_for(&tag, params.as_ref())?
            )])
        }
        Command::Invalidate { tags } => {
            let mut lines = Vec::with_capacity(tags.len());
            for tag in tags {
                let removed = cache
                    .remove_tag(&tag)
                    .await
                    .with_context(|| format!("invalidating {tag}"))?;
                lines.push(format!("✅ {tag}: removed {removed} entries"));
            }
            Ok(lines)
        }
        Command::Ping => anyhow::bail!("ping needs a Redis connection"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;
    use tagcache_cache::MemoryCache;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_set_command() {
        let cli = Cli::try_parse_from([
            "tagcache", "set", "values", "\"value\"", "--params", r#"{"id":5}"#, "--ttl", "300",
        ])
        .unwrap();

        match cli.command {
            Command::Set {
                tag, params, ttl, ..
            } => {
                assert_eq!(tag, Tag::Values);
                assert_eq!(params, Some(serde_json::json!({ "id": 5 })));
                assert_eq!(ttl, Some(300));
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_unknown_tag_is_rejected() {
        assert!(Cli::try_parse_from(["tagcache", "members", "nope"]).is_err());
    }

    #[test]
    fn test_entry_options_from_flags() {
        assert!(!entry_options(None, None).has_expiration());
        let options = entry_options(Some(60), Some(10));
        assert_eq!(
            options.absolute_expiration_relative_to_now,
            Some(Duration::from_secs(60))
        );
        assert_eq!(options.sliding_expiration, Some(Duration::from_secs(10)));
    }

    #[tokio::test]
    async fn test_set_members_invalidate() {
        let cache = TaggedCache::new(MemoryCache::new());
        let params = Some(serde_json::json!({ "id": 5 }));

        run(
            &cache,
            Command::Set {
                tag: Tag::Values,
                value: serde_json::json!("value"),
                params: params.clone(),
                ttl: Some(300),
                sliding: None,
            },
        )
        .await
        .unwrap();

        let members = run(&cache, Command::Members { tag: Tag::Values })
            .await
            .unwrap();
        assert_eq!(members[0], "masterValues (1 keys)");

        let lines = run(
            &cache,
            Command::Invalidate {
                tags: vec![Tag::Values],
            },
        )
        .await
        .unwrap();
        assert_eq!(lines, vec!["✅ Values: removed 1 entries"]);

        let got = run(
            &cache,
            Command::Get {
                tag: Tag::Values,
                params,
            },
        )
        .await
        .unwrap();
        assert_eq!(got, vec!["(miss)"]);
    }
}
