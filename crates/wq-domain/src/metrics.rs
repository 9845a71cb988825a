use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Point-in-time fleet snapshot returned by
/// `OperationalManager::monitor_operations`. Never persisted long-term.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OperationalMetrics {
    pub service_count: usize,
    pub healthy_services: usize,
    pub total_replicas: u32,
    pub resource_utilization: HashMap<String, f64>,
    pub uptime_percentage: f64,
    pub timestamp: DateTime<Utc>,
}
