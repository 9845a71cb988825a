//! Incident classification and per-class handlers.
//! Classification is a pure keyword match; handlers are pure functions of
//! the incident's class — any actual remediation (restarting a task,
//! paging on-call) is performed by the caller against the actions this
//! module returns, not by this module itself.

use wq_domain::{IncidentClass, IncidentResponse};

/// Classifies an incident description on the `open -> handling` transition.
/// First match wins; unmatched descriptions classify as `Generic`.
pub fn classify(description: &str) -> IncidentClass {
    let d = description.to_lowercase();
    if d.contains("crash") || d.contains("exit") {
        IncidentClass::ContainerCrash
    } else if d.contains("cpu high") {
        IncidentClass::HighCpu
    } else if d.contains("memory high") {
        IncidentClass::HighMemory
    } else if d.contains("unavailable") || d.contains("unreachable") {
        IncidentClass::ServiceUnavailable
    } else if d.contains("deployment fail") {
        IncidentClass::DeploymentFailure
    } else {
        IncidentClass::Generic
    }
}

/// Runs the handler for an incident's (already assigned) classification.
pub fn handle(class: IncidentClass) -> IncidentResponse {
    match class {
        IncidentClass::ContainerCrash => {
            IncidentResponse { actions: vec!["restarted failed task".to_string()],
                                resolution_successful: true,
                                follow_up_required: false,
                                escalation_needed: false }
        }
        IncidentClass::HighCpu | IncidentClass::HighMemory => {
            IncidentResponse { actions: vec!["flagged service for scale-up evaluation".to_string()],
                                resolution_successful: true,
                                follow_up_required: true,
                                escalation_needed: false }
        }
        IncidentClass::ServiceUnavailable => {
            IncidentResponse { actions: vec!["triggered health re-check".to_string()],
                                resolution_successful: false,
                                follow_up_required: true,
                                escalation_needed: false }
        }
        IncidentClass::DeploymentFailure => {
            IncidentResponse { actions: vec!["flagged deployment for rollback review".to_string()],
                                resolution_successful: false,
                                follow_up_required: true,
                                escalation_needed: true }
        }
        IncidentClass::Generic => {
            IncidentResponse { actions: vec!["logged for manual review".to_string()],
                                resolution_successful: false,
                                follow_up_required: true,
                                escalation_needed: false }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classifies_known_keywords() {
        assert_eq!(classify("container exited with code 137"), IncidentClass::ContainerCrash);
        assert_eq!(classify("cpu high on worker-3"), IncidentClass::HighCpu);
        assert_eq!(classify("memory high sustained"), IncidentClass::HighMemory);
        assert_eq!(classify("service unreachable"), IncidentClass::ServiceUnavailable);
        assert_eq!(classify("deployment fail: health check timeout"), IncidentClass::DeploymentFailure);
        assert_eq!(classify("something odd happened"), IncidentClass::Generic);
    }

    #[test]
    fn container_crash_resolves_without_escalation() {
        let response = handle(IncidentClass::ContainerCrash);
        assert!(response.resolution_successful);
        assert!(!response.escalation_needed);
    }

    #[test]
    fn deployment_failure_always_escalates() {
        let response = handle(IncidentClass::DeploymentFailure);
        assert!(!response.resolution_successful);
        assert!(response.escalation_needed);
    }
}
