use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Lifecycle state of a single deployment attempt. Deployments are
/// append-only: once recorded, a `Deployment` value is never mutated, a new
/// one is pushed to history instead.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeploymentStatus {
    Pending,
    InProgress,
    Completed,
    Failed,
    RolledBack,
}

/// Rolling-update parameters controlling how many tasks roll at once and
/// what happens when one fails to converge.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RollingUpdateConfig {
    pub parallelism: u32,
    pub delay_seconds: u64,
    pub failure_action: FailureAction,
}

impl Default for RollingUpdateConfig {
    fn default() -> Self {
        Self { parallelism: 1, delay_seconds: 10, failure_action: FailureAction::Pause }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureAction {
    Pause,
    Continue,
    Rollback,
}

/// Health checks the deployment must pass before being considered
/// `Completed`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct HealthCheckConfig {
    pub endpoint: Option<String>,
    pub expected_status: Option<u16>,
    pub timeout_seconds: u64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ResourceLimits {
    pub cpu_limit: Option<f64>,
    pub memory_limit_mb: Option<u64>,
}

/// Input to `OperationalManager::deploy`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeploymentConfig {
    pub service_name: String,
    pub image_tag: String,
    pub replicas: u32,
    pub rolling_update_config: RollingUpdateConfig,
    pub health_check_config: HealthCheckConfig,
    pub environment_variables: HashMap<String, String>,
    pub resource_limits: ResourceLimits,
    pub rollback_enabled: bool,
    pub max_rollback_attempts: u32,
}

/// One append-only history entry produced by a deployment attempt.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Deployment {
    pub deployment_id: Uuid,
    pub service_name: String,
    pub status: DeploymentStatus,
    pub start_time: DateTime<Utc>,
    pub end_time: Option<DateTime<Utc>>,
    pub rollback_performed: bool,
    pub error_message: Option<String>,
}

impl Deployment {
    pub fn started(service_name: impl Into<String>) -> Self {
        Self { deployment_id: Uuid::new_v4(),
               service_name: service_name.into(),
               status: DeploymentStatus::Pending,
               start_time: Utc::now(),
               end_time: None,
               rollback_performed: false,
               error_message: None }
    }
}

/// Prior service state captured before a deployment mutates it, used to
/// drive rollback.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceSnapshot {
    pub service_name: String,
    pub image_tag: String,
    pub environment_variables: HashMap<String, String>,
    pub replicas: u32,
}
