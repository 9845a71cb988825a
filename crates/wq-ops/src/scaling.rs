//! Reactive autoscaling with cooldown enforcement. The
//! scaling *decision* is pure (`wq_policies::decide_scaling`); this module
//! owns the only piece of state the decision itself doesn't need: when a
//! service last scaled.

use std::time::{Duration, Instant};

use log::info;
use wq_core::{ServiceUpdate, WqError};
use wq_domain::{ScalingDirection, ScalingPolicy, ScalingResult};

use crate::manager::OperationalManager;

impl OperationalManager {
    /// Fetches live metrics and current replica count, applies the scaling
    /// policy, and — unless the service is still in cooldown — issues the
    /// `update_service` call. Returns the decision either way so the
    /// caller can tell a suppressed action from a `Stable` one.
    pub async fn evaluate_scaling(&self, policy: &ScalingPolicy) -> Result<ScalingResult, WqError> {
        let guard = self.service_lock(&policy.service_name);
        let _lock = guard.lock().await;

        let metrics = self.orchestrator.get_metrics(&policy.service_name).await?;
        let current = self.orchestrator
                           .get_service(&policy.service_name)
                           .await?
                           .ok_or_else(|| WqError::ScalingFailed(format!("service {} does not exist", policy.service_name)))?
                           .replicas;

        let decision = wq_policies::decide_scaling(policy, metrics, current);
        if decision.direction == ScalingDirection::Stable {
            return Ok(decision);
        }

        if self.in_cooldown(&policy.service_name, policy.cooldown_seconds) {
            info!("{} scaling suppressed by cooldown: {:?}", policy.service_name, decision.direction);
            return Ok(ScalingResult { direction: ScalingDirection::Stable,
                                       new_replicas: decision.previous_replicas,
                                       reason: format!("cooldown active, suppressed {:?} to {}", decision.direction, decision.new_replicas),
                                       ..decision });
        }

        let update = ServiceUpdate { replicas: Some(decision.new_replicas), ..Default::default() };
        self.orchestrator
            .update_service(&policy.service_name, &update)
            .await
            .map_err(|e| WqError::ScalingFailed(format!("failed to apply {:?} scaling for {}: {e}", decision.direction, policy.service_name)))?;

        self.scaling_cooldowns.insert(policy.service_name.clone(), Instant::now());
        info!("{} scaled {:?}: {} -> {}", policy.service_name, decision.direction, decision.previous_replicas, decision.new_replicas);
        Ok(decision)
    }

    fn in_cooldown(&self, service_name: &str, cooldown_seconds: u64) -> bool {
        self.scaling_cooldowns
            .get(service_name)
            .map(|last| last.elapsed() < Duration::from_secs(cooldown_seconds))
            .unwrap_or(false)
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::sync::Arc;

    use wq_core::ServiceInfo;
    use wq_orchestrator::MockOrchestrator;

    use super::*;

    fn policy() -> ScalingPolicy {
        ScalingPolicy { service_name: "worker".into(),
                        min_replicas: 1,
                        max_replicas: 10,
                        target_cpu: 60.0,
                        target_mem: 60.0,
                        scale_up_threshold: 80.0,
                        scale_down_threshold: 20.0,
                        cooldown_seconds: 120,
                        step_up: 2,
                        step_down: 1 }
    }

    async fn manager_with_service(replicas: u32) -> (OperationalManager, Arc<MockOrchestrator>) {
        let orchestrator = Arc::new(MockOrchestrator::new());
        orchestrator.create_service(&ServiceInfo { service_name: "worker".into(),
                                                    image_tag: "v1".into(),
                                                    environment_variables: HashMap::new(),
                                                    replicas })
                    .await
                    .unwrap();
        let manager = OperationalManager::new(orchestrator.clone());
        (manager, orchestrator)
    }

    #[tokio::test]
    async fn scales_up_and_applies_the_update() {
        let (manager, orchestrator) = manager_with_service(3).await;
        orchestrator.set_metrics("worker", wq_domain::ServiceMetrics { cpu: 95.0, mem: 40.0 });
        let result = manager.evaluate_scaling(&policy()).await.unwrap();
        assert_eq!(result.direction, ScalingDirection::Up);
        let current = orchestrator.get_service("worker").await.unwrap().unwrap();
        assert_eq!(current.replicas, 5);
    }

    #[tokio::test]
    async fn second_scale_attempt_is_suppressed_by_cooldown() {
        let (manager, orchestrator) = manager_with_service(3).await;
        orchestrator.set_metrics("worker", wq_domain::ServiceMetrics { cpu: 95.0, mem: 40.0 });
        manager.evaluate_scaling(&policy()).await.unwrap();
        let second = manager.evaluate_scaling(&policy()).await.unwrap();
        assert_eq!(second.direction, ScalingDirection::Stable);
        let current = orchestrator.get_service("worker").await.unwrap().unwrap();
        assert_eq!(current.replicas, 5, "cooldown must suppress a second scale-up");
    }
}
