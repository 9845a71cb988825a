//! Rolling deployment with automatic rollback.

use std::time::Duration;

use chrono::Utc;
use log::{info, warn};
use wq_core::{ServiceInfo, ServiceUpdate, TaskState, WqError};
use wq_domain::{Deployment, DeploymentConfig, DeploymentStatus, ServiceSnapshot};

use crate::manager::{OperationalManager, ROLLBACK_TIMEOUT_SECS, ROLLING_UPDATE_TIMEOUT_SECS};

impl OperationalManager {
    /// Runs the five-step rolling-update algorithm. Returns the
    /// recorded `Deployment` on `completed` or `rolled_back`; returns
    /// `Err(DeploymentFailed)` when neither applies (no rollback configured,
    /// or rollback itself failed).
    pub async fn deploy(&self, config: &DeploymentConfig) -> Result<Deployment, WqError> {
        let guard = self.service_lock(&config.service_name);
        let _lock = guard.lock().await;

        let mut deployment = Deployment::started(&config.service_name);
        let prev = self.orchestrator.get_service(&config.service_name).await?;
        let snapshot = prev.as_ref().map(Self::snapshot_of);

        deployment.status = DeploymentStatus::InProgress;

        if let Err(e) = self.apply_update(config, prev.is_none()).await {
            return self.finish_failed(deployment, e);
        }

        let convergence = self.wait_for_tasks_running(&config.service_name, config.replicas,
                                                        Duration::from_secs(ROLLING_UPDATE_TIMEOUT_SECS))
                               .await;
        let health: Result<(), WqError> = match convergence {
            Ok(()) => self.validate_health(config).await,
            Err(e) => Err(e),
        };

        match health {
            Ok(()) => {
                deployment.status = DeploymentStatus::Completed;
                deployment.end_time = Some(Utc::now());
                self.record_deployment(deployment.clone());
                Ok(deployment)
            }
            Err(e) => {
                if config.rollback_enabled {
                    if let Some(snapshot) = snapshot {
                        match self.rollback_to(&snapshot).await {
                            Ok(()) => {
                                deployment.status = DeploymentStatus::RolledBack;
                                deployment.rollback_performed = true;
                                deployment.error_message = Some(e.to_string());
                                deployment.end_time = Some(Utc::now());
                                self.record_deployment(deployment.clone());
                                return Ok(deployment);
                            }
                            Err(rollback_err) => {
                                warn!("rollback of {} failed: {rollback_err}", config.service_name);
                                return self.finish_failed(deployment,
                                                           WqError::DeploymentFailed(format!("deploy failed ({e}); rollback also failed: {rollback_err}")));
                            }
                        }
                    }
                }
                self.finish_failed(deployment, e)
            }
        }
    }

    /// Re-applies a captured pre-deploy snapshot and waits for convergence,
    /// bounded by `ROLLBACK_TIMEOUT_SECS`.
    async fn rollback_to(&self, snapshot: &ServiceSnapshot) -> Result<(), WqError> {
        let update = ServiceUpdate { image_tag: Some(snapshot.image_tag.clone()),
                                      environment_variables: Some(snapshot.environment_variables.clone()),
                                      replicas: Some(snapshot.replicas),
                                      force: true };
        self.orchestrator.update_service(&snapshot.service_name, &update).await?;
        self.wait_for_tasks_running(&snapshot.service_name, snapshot.replicas, Duration::from_secs(ROLLBACK_TIMEOUT_SECS))
            .await
    }

    async fn apply_update(&self, config: &DeploymentConfig, create: bool) -> Result<(), WqError> {
        if create {
            let info = ServiceInfo { service_name: config.service_name.clone(),
                                      image_tag: config.image_tag.clone(),
                                      environment_variables: config.environment_variables.clone(),
                                      replicas: config.replicas };
            self.orchestrator.create_service(&info).await
        } else {
            let update = ServiceUpdate { image_tag: Some(config.image_tag.clone()),
                                          environment_variables: Some(config.environment_variables.clone()),
                                          replicas: Some(config.replicas),
                                          force: false };
            self.orchestrator.update_service(&config.service_name, &update).await
        }
    }

    /// Polls `get_tasks` until every task has converged to `running` and
    /// the count meets the target, or `timeout` elapses.
    async fn wait_for_tasks_running(&self, service_name: &str, target_replicas: u32, timeout: Duration) -> Result<(), WqError> {
        let poll = async {
            loop {
                let tasks = self.orchestrator.get_tasks(service_name).await?;
                let running = tasks.iter().filter(|t| t.state == TaskState::Running).count() as u32;
                if running >= target_replicas {
                    return Ok::<(), WqError>(());
                }
                if tasks.iter().any(|t| t.state == TaskState::Failed) {
                    return Err(WqError::DeploymentFailed(format!("task failure observed while waiting for {service_name} to converge")));
                }
                tokio::time::sleep(Duration::from_millis(500)).await;
            }
        };
        tokio::time::timeout(timeout, poll).await
                                            .map_err(|_| WqError::RolloutTimeout(format!("{service_name} did not converge to {target_replicas} running tasks within {timeout:?}")))?
    }

    /// Required running tasks ≥ replicas, plus the optional custom HTTP
    /// health check.
    async fn validate_health(&self, config: &DeploymentConfig) -> Result<(), WqError> {
        let tasks = self.orchestrator.get_tasks(&config.service_name).await?;
        let running = tasks.iter().filter(|t| t.state == TaskState::Running).count() as u32;
        if running < config.replicas {
            return Err(WqError::DeploymentFailed(format!("only {running}/{} tasks running", config.replicas)));
        }

        let Some(endpoint) = &config.health_check_config.endpoint else { return Ok(()) };
        let expected = config.health_check_config.expected_status.unwrap_or(200);
        let client = reqwest::Client::builder().timeout(Duration::from_secs(config.health_check_config.timeout_seconds.max(1)))
                                                .build()
                                                .map_err(|e| WqError::DeploymentFailed(format!("failed to build health check client: {e}")))?;
        let response = client.get(endpoint)
                              .send()
                              .await
                              .map_err(|e| WqError::DeploymentFailed(format!("health check request to {endpoint} failed: {e}")))?;
        if response.status().as_u16() != expected {
            return Err(WqError::DeploymentFailed(format!("health check at {endpoint} returned {}, expected {expected}", response.status())));
        }
        Ok(())
    }

    fn snapshot_of(info: &ServiceInfo) -> ServiceSnapshot {
        ServiceSnapshot { service_name: info.service_name.clone(),
                           image_tag: info.image_tag.clone(),
                           environment_variables: info.environment_variables.clone(),
                           replicas: info.replicas }
    }

    fn finish_failed(&self, mut deployment: Deployment, error: WqError) -> Result<Deployment, WqError> {
        deployment.status = DeploymentStatus::Failed;
        deployment.error_message = Some(error.to_string());
        deployment.end_time = Some(Utc::now());
        self.record_deployment(deployment);
        Err(error)
    }

    pub(crate) fn record_deployment(&self, deployment: Deployment) {
        info!("deployment {} for {} recorded as {:?}", deployment.deployment_id, deployment.service_name, deployment.status);
        self.deployment_history.entry(deployment.service_name.clone()).or_default().push(deployment);
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::sync::Arc;

    use wq_domain::{HealthCheckConfig, ResourceLimits, RollingUpdateConfig};
    use wq_orchestrator::MockOrchestrator;

    use super::*;

    fn config(service_name: &str, image_tag: &str) -> DeploymentConfig {
        DeploymentConfig { service_name: service_name.to_string(),
                            image_tag: image_tag.to_string(),
                            replicas: 2,
                            rolling_update_config: RollingUpdateConfig::default(),
                            health_check_config: HealthCheckConfig::default(),
                            environment_variables: HashMap::new(),
                            resource_limits: ResourceLimits::default(),
                            rollback_enabled: true,
                            max_rollback_attempts: 1 }
    }

    #[tokio::test]
    async fn first_deploy_creates_the_service_and_completes() {
        let manager = OperationalManager::new(Arc::new(MockOrchestrator::new()));
        let deployment = manager.deploy(&config("worker", "v1")).await.unwrap();
        assert_eq!(deployment.status, DeploymentStatus::Completed);
        assert_eq!(manager.deployment_history("worker").len(), 1);
    }

    #[tokio::test]
    async fn failed_health_check_with_rollback_enabled_restores_previous_image() {
        let orchestrator = Arc::new(MockOrchestrator::new());
        let manager = OperationalManager::new(orchestrator.clone());
        manager.deploy(&config("worker", "v1")).await.unwrap();

        let mut bad = config("worker", "v2");
        bad.health_check_config.endpoint = Some("http://127.0.0.1:0/healthz".to_string());
        bad.health_check_config.timeout_seconds = 1;
        let deployment = manager.deploy(&bad).await.unwrap();

        assert_eq!(deployment.status, DeploymentStatus::RolledBack);
        assert!(deployment.rollback_performed);
        let current = orchestrator.get_service("worker").await.unwrap().unwrap();
        assert_eq!(current.image_tag, "v1");
    }
}
