//! `OperationalManager`: coordinates the worker fleet through a
//! `ServiceOrchestrator`. Stateless across restarts
//! except for its in-memory histories — deployment history, scaling
//! cooldowns, and the incident registry all live only as long as the
//! process does.

use std::sync::Arc;
use std::time::Instant;

use dashmap::DashMap;
use indexmap::IndexMap;
use tokio::sync::Mutex as AsyncMutex;
use uuid::Uuid;
use wq_core::{ServiceInfo, ServiceOrchestrator, WqError};
use wq_domain::{Deployment, Incident};

pub(crate) const ROLLING_UPDATE_TIMEOUT_SECS: u64 = 600;
pub(crate) const ROLLBACK_TIMEOUT_SECS: u64 = 300;

pub struct OperationalManager {
    pub(crate) orchestrator: Arc<dyn ServiceOrchestrator>,
    pub(crate) deployment_history: DashMap<String, Vec<Deployment>>,
    pub(crate) scaling_cooldowns: DashMap<String, Instant>,
    pub(crate) active_incidents: DashMap<Uuid, Incident>,
    pub(crate) resolved_incidents: std::sync::Mutex<IndexMap<Uuid, Incident>>,
    service_locks: DashMap<String, Arc<AsyncMutex<()>>>,
}

impl OperationalManager {
    pub fn new(orchestrator: Arc<dyn ServiceOrchestrator>) -> Self {
        Self { orchestrator,
               deployment_history: DashMap::new(),
               scaling_cooldowns: DashMap::new(),
               active_incidents: DashMap::new(),
               resolved_incidents: std::sync::Mutex::new(IndexMap::new()),
               service_locks: DashMap::new() }
    }

    /// Each service's deploy/scale/incident loops take this mutex before
    /// mutating shared state for that service, so concurrent operations on
    /// different services never block each other.
    pub(crate) fn service_lock(&self, service_name: &str) -> Arc<AsyncMutex<()>> {
        self.service_locks
            .entry(service_name.to_string())
            .or_insert_with(|| Arc::new(AsyncMutex::new(())))
            .clone()
    }

    pub fn deployment_history(&self, service_name: &str) -> Vec<Deployment> {
        self.deployment_history.get(service_name).map(|e| e.value().clone()).unwrap_or_default()
    }

    pub fn active_incidents(&self) -> Vec<Incident> {
        self.active_incidents.iter().map(|e| e.value().clone()).collect()
    }

    pub fn resolved_incidents(&self) -> Vec<Incident> {
        self.resolved_incidents.lock().expect("resolved incident history lock poisoned").values().cloned().collect()
    }

    /// Passthrough to the orchestrator, for callers (e.g. `wq-cli`'s
    /// `rollback` verb) that need a service's current state without
    /// running a full deploy.
    pub async fn service_info(&self, service_name: &str) -> Result<Option<ServiceInfo>, WqError> {
        self.orchestrator.get_service(service_name).await
    }
}
