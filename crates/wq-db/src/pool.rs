use diesel::pg::PgConnection;
use diesel::r2d2::{self, ConnectionManager};
use wq_core::WqError;

use crate::config::DbConfig;

pub type PgPool = r2d2::Pool<ConnectionManager<PgConnection>>;

/// Builds an r2d2 pool from a validated config. Does not run migrations —
/// callers that need a migrated pool use `DatabaseManager::new`.
pub fn build_pool(cfg: &DbConfig) -> Result<PgPool, WqError> {
    let manager = ConnectionManager::<PgConnection>::new(&cfg.url);
    r2d2::Pool::builder()
        .max_size(cfg.pool_size + cfg.max_overflow)
        .connection_timeout(cfg.connect_timeout)
        .build(manager)
        .map_err(|e| WqError::TransientStorage(format!("pool build: {e}")))
}
