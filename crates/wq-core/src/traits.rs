//! Explicit interfaces in place of duck-typed "config manager" and
//! "database manager" objects.

use crate::errors::WqError;
use crate::health::HealthReport;

/// A layer of configuration lookup (environment, secret store, static
/// file...). `ConfigResolver` (in `wq-config`) composes several of these
/// per its own precedence rules; an individual `ConfigSource` only needs
/// to answer one already-scoped key.
pub trait ConfigSource: Send + Sync {
    /// `scoped_key` is already assembled by the resolver, e.g.
    /// `"prod_rpa_db_pool_size"`.
    fn lookup(&self, scoped_key: &str) -> Option<String>;
}

/// A value-granting connection provider: hands a live connection to a
/// closure and classifies whatever it gets back. Generic over the
/// connection type so `wq-core` does not need to depend on `diesel`.
pub trait QueryExecutor: Send + Sync {
    type Conn;

    fn with_connection<T>(&self, f: impl FnOnce(&mut Self::Conn) -> Result<T, WqError>) -> Result<T, WqError>;
}

/// Inspects the shape of whatever pool backs a `QueryExecutor`, for
/// `get_pool_status`.
pub trait PoolInspector: Send + Sync {
    fn pool_status(&self) -> crate::health::PoolStatus;
}

/// Anything that can report its own health on demand.
pub trait HealthCheckable: Send + Sync {
    fn health_check(&self) -> HealthReport;
}
