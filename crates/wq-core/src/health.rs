use serde::{Deserialize, Serialize};

/// Tri-state health reported by every `HealthCheckable`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HealthState {
    Healthy,
    Degraded,
    Unhealthy,
}

/// Pool occupancy at the moment of a health check.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct PoolStatus {
    pub size: u32,
    pub checked_out: u32,
    pub overflow: u32,
    pub invalid: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthReport {
    pub status: HealthState,
    pub response_time_ms: u64,
    pub pool: PoolStatus,
    pub error: Option<String>,
}

impl HealthReport {
    pub fn healthy(response_time_ms: u64, pool: PoolStatus) -> Self {
        Self { status: HealthState::Healthy, response_time_ms, pool, error: None }
    }

    pub fn degraded(response_time_ms: u64, pool: PoolStatus) -> Self {
        Self { status: HealthState::Degraded, response_time_ms, pool, error: None }
    }

    pub fn unhealthy(error: impl Into<String>) -> Self {
        Self { status: HealthState::Unhealthy, response_time_ms: 0, pool: PoolStatus::default(), error: Some(error.into()) }
    }
}
