//! Pure scaling-decision function. Takes no clock, no
//! orchestrator, no cooldown state — cooldown enforcement is the caller's
//! job (`wq-ops::scaling`), since it needs wall-clock history this
//! function has no business holding.

use wq_domain::{ScalingDirection, ScalingPolicy, ScalingResult, ServiceMetrics};

pub fn decide_scaling(policy: &ScalingPolicy, metrics: ServiceMetrics, current_replicas: u32) -> ScalingResult {
    let over_threshold = metrics.cpu > policy.scale_up_threshold || metrics.mem > policy.scale_up_threshold;
    let under_threshold = metrics.cpu < policy.scale_down_threshold && metrics.mem < policy.scale_down_threshold;

    if over_threshold && current_replicas < policy.max_replicas {
        let new_replicas = (current_replicas + policy.step_up).min(policy.max_replicas);
        return ScalingResult { service_name: policy.service_name.clone(),
                                direction: ScalingDirection::Up,
                                previous_replicas: current_replicas,
                                new_replicas,
                                reason: format!("cpu={:.1} mem={:.1} over threshold {:.1}",
                                                 metrics.cpu, metrics.mem, policy.scale_up_threshold) };
    }

    if under_threshold && current_replicas > policy.min_replicas {
        let new_replicas = current_replicas.saturating_sub(policy.step_down).max(policy.min_replicas);
        return ScalingResult { service_name: policy.service_name.clone(),
                                direction: ScalingDirection::Down,
                                previous_replicas: current_replicas,
                                new_replicas,
                                reason: format!("cpu={:.1} mem={:.1} under threshold {:.1}",
                                                 metrics.cpu, metrics.mem, policy.scale_down_threshold) };
    }

    ScalingResult { service_name: policy.service_name.clone(),
                    direction: ScalingDirection::Stable,
                    previous_replicas: current_replicas,
                    new_replicas: current_replicas,
                    reason: "within thresholds".to_string() }
}

#[cfg(test)]
mod tests {
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

    #[test]
    fn scales_up_when_cpu_exceeds_threshold() {
        let result = decide_scaling(&policy(), ServiceMetrics { cpu: 90.0, mem: 40.0 }, 3);
        assert_eq!(result.direction, ScalingDirection::Up);
        assert_eq!(result.new_replicas, 5);
    }

    #[test]
    fn scale_up_is_capped_at_max_replicas() {
        let result = decide_scaling(&policy(), ServiceMetrics { cpu: 90.0, mem: 40.0 }, 9);
        assert_eq!(result.new_replicas, 10);
    }

    #[test]
    fn scales_down_when_both_metrics_are_low() {
        let result = decide_scaling(&policy(), ServiceMetrics { cpu: 5.0, mem: 5.0 }, 4);
        assert_eq!(result.direction, ScalingDirection::Down);
        assert_eq!(result.new_replicas, 3);
    }

    #[test]
    fn does_not_scale_up_past_max_replicas() {
        let result = decide_scaling(&policy(), ServiceMetrics { cpu: 95.0, mem: 95.0 }, 10);
        assert_eq!(result.direction, ScalingDirection::Stable);
    }

    #[test]
    fn does_not_scale_down_past_min_replicas() {
        let result = decide_scaling(&policy(), ServiceMetrics { cpu: 5.0, mem: 5.0 }, 1);
        assert_eq!(result.direction, ScalingDirection::Stable);
    }

    #[test]
    fn stays_stable_between_thresholds() {
        let result = decide_scaling(&policy(), ServiceMetrics { cpu: 50.0, mem: 50.0 }, 4);
        assert_eq!(result.direction, ScalingDirection::Stable);
        assert_eq!(result.new_replicas, 4);
    }
}
