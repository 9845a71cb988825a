//! Incident-response state machine: `open -> handling ->
//! {resolved, escalated, follow_up}`. Classification and per-class
//! handling are pure (`wq_policies`); this module owns the registry and
//! the idempotent-on-duplicate-id overwrite rule.

use chrono::Utc;
use wq_domain::{Incident, IncidentResponse, IncidentSeverity};

use crate::manager::OperationalManager;

impl OperationalManager {
    /// Opens an incident, classifies it, and runs its handler. The manager
    /// is idempotent on duplicate `incident_id`s: a duplicate overwrites
    /// the active entry rather than erroring.
    pub fn open_incident(&self, service_name: &str, severity: IncidentSeverity, description: &str) -> IncidentResponse {
        let incident = Incident::open(service_name, severity, description);
        self.handle_incident(incident)
    }

    /// Re-runs an already-open incident through classification and
    /// handling — the duplicate-id overwrite path.
    pub fn reopen_incident(&self, incident: Incident) -> IncidentResponse {
        self.handle_incident(incident)
    }

    fn handle_incident(&self, mut incident: Incident) -> IncidentResponse {
        let class = wq_policies::classify(&incident.description);
        let response = wq_policies::handle(class);
        incident.actions_taken.extend(response.actions.clone());

        if response.resolution_successful {
            incident.resolved = true;
            incident.resolution_time = Some(Utc::now());
            self.active_incidents.remove(&incident.incident_id);
            self.resolved_incidents
                .lock()
                .expect("resolved incident history lock poisoned")
                .insert(incident.incident_id, incident);
        } else {
            // Idempotent overwrite: insert() replaces any prior entry with
            // the same incident_id.
            self.active_incidents.insert(incident.incident_id, incident);
        }

        response
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use wq_orchestrator::MockOrchestrator;

    use super::*;

    #[test]
    fn duplicate_incident_id_overwrites_active_entry() {
        let manager = OperationalManager::new(Arc::new(MockOrchestrator::new()));
        let response = manager.open_incident("worker", IncidentSeverity::Low, "container crash");
        assert!(response.resolution_successful);
        assert!(manager.active_incidents().is_empty());
        assert_eq!(manager.resolved_incidents().len(), 1);
    }

    #[test]
    fn unresolved_incident_stays_in_active_registry() {
        let manager = OperationalManager::new(Arc::new(MockOrchestrator::new()));
        let response = manager.open_incident("worker", IncidentSeverity::Medium, "deployment fail: timeout");
        assert!(!response.resolution_successful);
        assert_eq!(manager.active_incidents().len(), 1);
    }
}
