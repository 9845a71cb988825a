use serde::{Deserialize, Serialize};

/// Policy a service is scaled against.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScalingPolicy {
    pub service_name: String,
    pub min_replicas: u32,
    pub max_replicas: u32,
    pub target_cpu: f64,
    pub target_mem: f64,
    pub scale_up_threshold: f64,
    pub scale_down_threshold: f64,
    pub cooldown_seconds: u64,
    pub step_up: u32,
    pub step_down: u32,
}

/// Point-in-time metrics fed into a scaling decision.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct ServiceMetrics {
    pub cpu: f64,
    pub mem: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScalingDirection {
    Up,
    Down,
    Stable,
}

/// Result of one scaling evaluation, regardless of whether an action was
/// actually taken (cooldown may suppress it — that decision is the
/// caller's, see `wq-ops::scaling`).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScalingResult {
    pub service_name: String,
    pub direction: ScalingDirection,
    pub previous_replicas: u32,
    pub new_replicas: u32,
    pub reason: String,
}
