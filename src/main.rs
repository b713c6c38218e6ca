use clap::Parser;
use dotenvy::dotenv;
use tagcache::cli::{self, Cli, Command};
use tagcache::config::AppConfig;
use tagcache_cache::{RedisCache, TagIndex, TaggedCache, derive_key};
use tagcache_observability::init_logging;
use tracing::info;

#[tokio::main]
async fn main() {
    dotenv().ok();

    let config = AppConfig::from_env();
    let _log_guard = match init_logging(&config.logging) {
        Ok(guard) => guard,
        Err(e) => {
            eprintln!("⚠️  Failed to initialise logging: {e}");
            None
        }
    };

    let cli = Cli::parse();

    if let Err(e) = run(config, cli.command).await {
        eprintln!("❌ {e:#}");
        std::process::exit(1);
    }
}

async fn run(config: AppConfig, command: Command) -> anyhow::Result<()> {
    // Key derivation is pure; no connection needed
    if let Command::Key { tag, params } = &command {
        println!("{}", derive_key(tag, params.as_ref())?);
        return Ok(());
    }

    let store = RedisCache::new(&config.cache.redis_url).await?;
    info!(redis_url = %config.cache.redis_url, "Connected to Redis");

    if let Command::Ping = command {
        store.ping().await?;
        println!("✅ PONG from {}", config.cache.redis_url);
        return Ok(());
    }

    let mut index = TagIndex::new(store);
    if config.cache.local_tag_locks {
        index = index.with_local_locks();
    }
    let cache =
        TaggedCache::from_index(index).with_default_options(config.cache.default_entry_options());

    for line in cli::run(&cache, command).await? {
        println!("{line}");
    }

    Ok(())
}
