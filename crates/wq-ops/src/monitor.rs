//! `monitor_operations`: a point-in-time fleet snapshot. Never persisted —
//! the caller decides whether to log, export, or discard it.

use chrono::Utc;
use log::warn;
use wq_core::{TaskState, WqError};
use wq_domain::OperationalMetrics;

use crate::manager::OperationalManager;

impl OperationalManager {
    pub async fn monitor_operations(&self) -> Result<OperationalMetrics, WqError> {
        let services = self.orchestrator.list_services().await?;
        let service_count = services.len();
        let mut healthy_services = 0usize;
        let mut total_replicas = 0u32;
        let mut resource_utilization = std::collections::HashMap::new();

        for service in &services {
            total_replicas += service.replicas;
            let tasks = self.orchestrator.get_tasks(&service.service_name).await.unwrap_or_default();
            let running = tasks.iter().filter(|t| t.state == TaskState::Running).count() as u32;
            if running >= service.replicas && service.replicas > 0 {
                healthy_services += 1;
            }
            match self.orchestrator.get_metrics(&service.service_name).await {
                Ok(metrics) => {
                    resource_utilization.insert(format!("{}_cpu", service.service_name), metrics.cpu);
                    resource_utilization.insert(format!("{}_mem", service.service_name), metrics.mem);
                }
                Err(e) => warn!("monitor_operations: no metrics for {}: {e}", service.service_name),
            }
        }

        let uptime_percentage =
            if service_count == 0 { 100.0 } else { (healthy_services as f64 / service_count as f64) * 100.0 };

        Ok(OperationalMetrics { service_count, healthy_services, total_replicas, resource_utilization, uptime_percentage, timestamp: Utc::now() })
    }
}
