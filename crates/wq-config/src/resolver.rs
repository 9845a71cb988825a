//! The Config Resolver: layered env×flow×key precedence
//! lookup over one or more `ConfigSource`s, plus the recognized options
//! table baked into typed getters.

use std::collections::HashMap;

use log::debug;
use wq_core::{ConfigSource, WqError};

/// `get_distributed_config()` — batch/retry/health tuning shared by the
/// processor and flow template.
#[derive(Debug, Clone)]
pub struct DistributedConfig {
    pub default_batch_size: i64,
    pub cleanup_timeout_hours: i64,
    pub max_retries: i32,
    pub health_check_interval_seconds: u64,
}

/// `get_database_config(logical_db_name)` — pool shape and dialect for one
/// named database.
#[derive(Debug, Clone)]
pub struct DatabaseConnectionConfig {
    pub db_type: String,
    pub connection_string: String,
    pub pool_size: u32,
    pub max_overflow: u32,
    pub timeout_seconds: u64,
}

/// Resolves a key for a given environment and optional flow scope.
///
/// Precedence, per key: (1) `<env>_<flow>_<key>` when a flow is
/// given, (2) `<env>_<key>`, (3) the static defaults table. Each layer is
/// tried against every configured source in order before falling through
/// to the next layer.
pub struct ConfigResolver {
    environment: String,
    sources: Vec<Box<dyn ConfigSource>>,
    defaults: HashMap<String, String>,
}

impl ConfigResolver {
    pub fn new(environment: impl Into<String>, sources: Vec<Box<dyn ConfigSource>>) -> Self {
        let defaults = [("default_batch_size", "100"),
                         ("cleanup_timeout_hours", "2"),
                         ("max_retries", "3"),
                         ("health_check_interval", "30")].into_iter()
                                                          .map(|(k, v)| (k.to_string(), v.to_string()))
                                                          .collect();
        Self { environment: environment.into(), sources, defaults }
    }

    /// Adds or overrides a static default, for recognized options the
    /// built-in table doesn't cover (e.g. per-db pool sizing).
    pub fn with_default(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.defaults.insert(key.into(), value.into());
        self
    }

    fn lookup_any(&self, scoped_key: &str) -> Option<String> {
        self.sources.iter().find_map(|s| s.lookup(scoped_key))
    }

    /// `get_variable(key, default?)`. `flow` scopes the lookup to a single
    /// flow's override when given.
    pub fn get_variable(&self, key: &str, flow: Option<&str>, fallback: Option<&str>) -> Option<String> {
        if let Some(flow) = flow {
            let scoped = format!("{}_{flow}_{key}", self.environment);
            if let Some(v) = self.lookup_any(&scoped) {
                debug!("config {key}: resolved from env×flow override {scoped}");
                return Some(v);
            }
        }
        let global = format!("{}_{key}", self.environment);
        if let Some(v) = self.lookup_any(&global) {
            debug!("config {key}: resolved from env global {global}");
            return Some(v);
        }
        if let Some(v) = self.defaults.get(key) {
            debug!("config {key}: resolved from static default");
            return Some(v.clone());
        }
        fallback.map(str::to_string)
    }

    pub fn get_secret(&self, key: &str) -> Result<String, WqError> {
        self.get_variable(key, None, None)
            .ok_or_else(|| WqError::ConfigMissing(key.to_string()))
    }

    fn require(&self, key: &str, flow: Option<&str>) -> Result<String, WqError> {
        self.get_variable(key, flow, None)
            .ok_or_else(|| WqError::ConfigMissing(key.to_string()))
    }

    fn parse<T: std::str::FromStr>(&self, key: &str, value: &str) -> Result<T, WqError> {
        value.parse()
             .map_err(|_| WqError::ConfigMissing(format!("{key} has an invalid value: {value}")))
    }

    pub fn get_distributed_config(&self, flow: Option<&str>) -> Result<DistributedConfig, WqError> {
        let batch_size_raw = self.require("default_batch_size", flow)?;
        let cleanup_raw = self.require("cleanup_timeout_hours", flow)?;
        let max_retries_raw = self.require("max_retries", flow)?;
        let interval_raw = self.require("health_check_interval", flow)?;
        Ok(DistributedConfig { default_batch_size: self.parse("default_batch_size", &batch_size_raw)?,
                                cleanup_timeout_hours: self.parse("cleanup_timeout_hours", &cleanup_raw)?,
                                max_retries: self.parse("max_retries", &max_retries_raw)?,
                                health_check_interval_seconds: self.parse("health_check_interval", &interval_raw)? })
    }

    pub fn get_database_config(&self, logical_db_name: &str) -> Result<DatabaseConnectionConfig, WqError> {
        let type_key = format!("{logical_db_name}_type");
        let conn_key = format!("{logical_db_name}_connection_string");
        let pool_key = format!("{logical_db_name}_pool_size");
        let overflow_key = format!("{logical_db_name}_max_overflow");
        let timeout_key = format!("{logical_db_name}_timeout");

        let db_type = self.get_variable(&type_key, None, Some("postgres")).unwrap();
        let connection_string = self.require(&conn_key, None)?;
        let pool_size_raw = self.get_variable(&pool_key, None, Some("10")).unwrap();
        let overflow_raw = self.get_variable(&overflow_key, None, Some("5")).unwrap();
        let timeout_raw = self.get_variable(&timeout_key, None, Some("30")).unwrap();

        Ok(DatabaseConnectionConfig { db_type,
                                       connection_string,
                                       pool_size: self.parse(&pool_key, &pool_size_raw)?,
                                       max_overflow: self.parse(&overflow_key, &overflow_raw)?,
                                       timeout_seconds: self.parse(&timeout_key, &timeout_raw)? })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sources::StaticConfigSource;

    fn resolver_with(values: &[(&str, &str)]) -> ConfigResolver {
        let table = values.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
        ConfigResolver::new("prod", vec![Box::new(StaticConfigSource::new(table))])
    }

    #[test]
    fn env_flow_override_wins_over_env_global_and_default() {
        let resolver = resolver_with(&[("prod_ingest_default_batch_size", "250"), ("prod_default_batch_size", "50")]);
        assert_eq!(resolver.get_variable("default_batch_size", Some("ingest"), None), Some("250".into()));
    }

    #[test]
    fn env_global_wins_over_static_default_when_no_flow_override() {
        let resolver = resolver_with(&[("prod_default_batch_size", "50")]);
        assert_eq!(resolver.get_variable("default_batch_size", Some("ingest"), None), Some("50".into()));
    }

    #[test]
    fn falls_back_to_static_default_table() {
        let resolver = resolver_with(&[]);
        assert_eq!(resolver.get_variable("default_batch_size", None, None), Some("100".into()));
    }

    #[test]
    fn missing_required_key_is_config_missing() {
        let resolver = resolver_with(&[]);
        assert!(matches!(resolver.get_secret("api_token"), Err(WqError::ConfigMissing(_))));
    }

    #[test]
    fn database_config_requires_connection_string_explicitly() {
        let resolver = resolver_with(&[("prod_rpa_connection_string", "postgres://localhost/rpa")]);
        let cfg = resolver.get_database_config("rpa").unwrap();
        assert_eq!(cfg.connection_string, "postgres://localhost/rpa");
        assert_eq!(cfg.db_type, "postgres");
        assert_eq!(cfg.pool_size, 10);
    }
}
