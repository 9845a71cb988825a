//! Connection-pool configuration loaded from the environment. The layered
//! per-key precedence resolution (`<db>_pool_size` etc.) lives in
//! `wq-config`; this is the narrower, eager-loaded shape
//! `DatabaseManager::new` actually needs.

use std::env;
use std::time::Duration;

use dotenvy::dotenv;
use once_cell::sync::Lazy;
use wq_core::WqError;

static DOTENV_LOADED: Lazy<()> = Lazy::new(|| {
    let _ = dotenv();
});

pub fn init_dotenv() {
    Lazy::force(&DOTENV_LOADED);
}

#[derive(Debug, Clone)]
pub struct DbConfig {
    pub url: String,
    pub pool_size: u32,
    pub max_overflow: u32,
    pub connect_timeout: Duration,
    pub health_warn_threshold_ms: u64,
}

impl DbConfig {
    /// Loads `<PREFIX>_DATABASE_URL` etc. `prefix` is the logical db name
    /// (e.g. `"primary"`, `"source_db"`), uppercased.
    pub fn from_env(prefix: &str) -> Result<Self, WqError> {
        Lazy::force(&DOTENV_LOADED);
        let up = prefix.to_uppercase();
        let url = env::var(format!("{up}_DATABASE_URL"))
            .or_else(|_| env::var("DATABASE_URL"))
            .map_err(|_| WqError::ConfigMissing(format!("{up}_DATABASE_URL")))?;
        let pool_size = env_u32(&format!("{up}_POOL_SIZE"), 10);
        let max_overflow = env_u32(&format!("{up}_MAX_OVERFLOW"), 5);
        let timeout_secs = env_u32(&format!("{up}_TIMEOUT_SECONDS"), 30);
        let warn_ms = env_u32(&format!("{up}_HEALTH_WARN_MS"), 200);
        Ok(Self { url, pool_size, max_overflow, connect_timeout: Duration::from_secs(timeout_secs as u64), health_warn_threshold_ms: warn_ms as u64 })
    }
}

fn env_u32(key: &str, default: u32) -> u32 {
    env::var(key).ok().and_then(|v| v.parse().ok()).unwrap_or(default)
}
