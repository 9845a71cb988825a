//! `ServiceOrchestrator`: the interface the Operational Manager consumes.
//! Implementations wrap Docker Swarm, Kubernetes, or a local in-memory
//! mock — see `wq-orchestrator`.

use std::collections::HashMap;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use wq_domain::ServiceMetrics;

use crate::errors::WqError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskState {
    Pending,
    Starting,
    Running,
    Failed,
    Shutdown,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskInfo {
    pub task_id: String,
    pub service_name: String,
    pub state: TaskState,
    pub image_tag: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceInfo {
    pub service_name: String,
    pub image_tag: String,
    pub environment_variables: HashMap<String, String>,
    pub replicas: u32,
}

/// Parameters accepted by `update_service`; every field is optional because
/// a rolling update may touch only a subset (image, env, replica count, or
/// just force a redeploy of the current image).
#[derive(Debug, Clone, Default)]
pub struct ServiceUpdate {
    pub image_tag: Option<String>,
    pub environment_variables: Option<HashMap<String, String>>,
    pub replicas: Option<u32>,
    pub force: bool,
}

#[async_trait]
pub trait ServiceOrchestrator: Send + Sync {
    async fn get_service(&self, service_name: &str) -> Result<Option<ServiceInfo>, WqError>;
    async fn create_service(&self, info: &ServiceInfo) -> Result<(), WqError>;
    async fn update_service(&self, service_name: &str, update: &ServiceUpdate) -> Result<(), WqError>;
    async fn list_services(&self) -> Result<Vec<ServiceInfo>, WqError>;
    async fn get_tasks(&self, service_name: &str) -> Result<Vec<TaskInfo>, WqError>;
    async fn get_metrics(&self, service_name: &str) -> Result<ServiceMetrics, WqError>;
}
