//! In-memory `ServiceOrchestrator`, for tests and local runs without a
//! real container platform. Task state is simulated, not observed: a
//! `create_service`/`update_service` call immediately produces `running`
//! tasks for the requested replica count, rather than modeling a
//! convergence delay.

use async_trait::async_trait;
use dashmap::DashMap;
use wq_core::{ServiceInfo, ServiceOrchestrator, ServiceUpdate, TaskInfo, TaskState, WqError};
use wq_domain::ServiceMetrics;

#[derive(Default)]
pub struct MockOrchestrator {
    services: DashMap<String, ServiceInfo>,
    tasks: DashMap<String, Vec<TaskInfo>>,
    metrics: DashMap<String, ServiceMetrics>,
}

impl MockOrchestrator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seeds `get_metrics` for a service. Without a call to this, metrics
    /// are reported as an error — this orchestrator never invents numbers.
    pub fn set_metrics(&self, service_name: &str, metrics: ServiceMetrics) {
        self.metrics.insert(service_name.to_string(), metrics);
    }

    fn running_tasks(service_name: &str, image_tag: &str, replicas: u32) -> Vec<TaskInfo> {
        (0..replicas).map(|i| TaskInfo { task_id: format!("{service_name}-task-{i}"),
                                          service_name: service_name.to_string(),
                                          state: TaskState::Running,
                                          image_tag: image_tag.to_string() })
                      .collect()
    }
}

#[async_trait]
impl ServiceOrchestrator for MockOrchestrator {
    async fn get_service(&self, service_name: &str) -> Result<Option<ServiceInfo>, WqError> {
        Ok(self.services.get(service_name).map(|e| e.value().clone()))
    }

    async fn create_service(&self, info: &ServiceInfo) -> Result<(), WqError> {
        let tasks = Self::running_tasks(&info.service_name, &info.image_tag, info.replicas);
        self.tasks.insert(info.service_name.clone(), tasks);
        self.services.insert(info.service_name.clone(), info.clone());
        Ok(())
    }

    async fn update_service(&self, service_name: &str, update: &ServiceUpdate) -> Result<(), WqError> {
        let mut entry = self.services
                             .get_mut(service_name)
                             .ok_or_else(|| WqError::BusinessLogic(format!("service {service_name} does not exist")))?;
        if let Some(image_tag) = &update.image_tag {
            entry.image_tag = image_tag.clone();
        }
        if let Some(env) = &update.environment_variables {
            entry.environment_variables = env.clone();
        }
        if let Some(replicas) = update.replicas {
            entry.replicas = replicas;
        }
        let tasks = Self::running_tasks(&entry.service_name, &entry.image_tag, entry.replicas);
        self.tasks.insert(service_name.to_string(), tasks);
        Ok(())
    }

    async fn list_services(&self) -> Result<Vec<ServiceInfo>, WqError> {
        Ok(self.services.iter().map(|e| e.value().clone()).collect())
    }

    async fn get_tasks(&self, service_name: &str) -> Result<Vec<TaskInfo>, WqError> {
        Ok(self.tasks.get(service_name).map(|e| e.value().clone()).unwrap_or_default())
    }

    async fn get_metrics(&self, service_name: &str) -> Result<ServiceMetrics, WqError> {
        self.metrics
            .get(service_name)
            .map(|e| *e.value())
            .ok_or_else(|| WqError::BusinessLogic(format!("no metrics seeded for {service_name}")))
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn service(name: &str) -> ServiceInfo {
        ServiceInfo { service_name: name.to_string(),
                      image_tag: "v1".to_string(),
                      environment_variables: HashMap::new(),
                      replicas: 2 }
    }

    #[tokio::test]
    async fn create_then_get_round_trips() {
        let orch = MockOrchestrator::new();
        orch.create_service(&service("worker")).await.unwrap();
        let fetched = orch.get_service("worker").await.unwrap().unwrap();
        assert_eq!(fetched.image_tag, "v1");
        assert_eq!(orch.get_tasks("worker").await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn update_service_replaces_image_and_regenerates_tasks() {
        let orch = MockOrchestrator::new();
        orch.create_service(&service("worker")).await.unwrap();
        let update = ServiceUpdate { image_tag: Some("v2".to_string()), replicas: Some(3), ..Default::default() };
        orch.update_service("worker", &update).await.unwrap();
        let tasks = orch.get_tasks("worker").await.unwrap();
        assert_eq!(tasks.len(), 3);
        assert!(tasks.iter().all(|t| t.image_tag == "v2"));
    }

    #[tokio::test]
    async fn metrics_are_an_error_until_seeded() {
        let orch = MockOrchestrator::new();
        orch.create_service(&service("worker")).await.unwrap();
        assert!(orch.get_metrics("worker").await.is_err());
        orch.set_metrics("worker", ServiceMetrics { cpu: 42.0, mem: 10.0 });
        assert_eq!(orch.get_metrics("worker").await.unwrap().cpu, 42.0);
    }

    #[tokio::test]
    async fn update_on_unknown_service_is_an_error() {
        let orch = MockOrchestrator::new();
        assert!(orch.update_service("ghost", &ServiceUpdate::default()).await.is_err());
    }
}
