use tagcache_cache::CacheConfig;
use tagcache_observability::LogConfig;

/// Everything the `tagcache` binary reads from the environment.
#[derive(Clone, Debug, Default)]
pub struct AppConfig {
    pub cache: CacheConfig,
    pub logging: LogConfig,
}

impl AppConfig {
    pub fn from_env() -> Self {
        Self {
            cache: CacheConfig::from_env(),
            logging: LogConfig::from_env(),
        }
    }
}
