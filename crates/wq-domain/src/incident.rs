use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IncidentSeverity {
    Low,
    Medium,
    High,
    Critical,
}

/// Classification assigned on the `open -> handling` transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IncidentClass {
    ContainerCrash,
    HighCpu,
    HighMemory,
    ServiceUnavailable,
    DeploymentFailure,
    Generic,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Incident {
    pub incident_id: Uuid,
    pub service_name: String,
    pub severity: IncidentSeverity,
    pub description: String,
    pub timestamp: DateTime<Utc>,
    pub resolved: bool,
    pub resolution_time: Option<DateTime<Utc>>,
    pub actions_taken: Vec<String>,
}

impl Incident {
    pub fn open(service_name: impl Into<String>, severity: IncidentSeverity, description: impl Into<String>) -> Self {
        Self { incident_id: Uuid::new_v4(),
               service_name: service_name.into(),
               severity,
               description: description.into(),
               timestamp: Utc::now(),
               resolved: false,
               resolution_time: None,
               actions_taken: Vec::new() }
    }
}

/// Outcome of running an incident's class-specific handler.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IncidentResponse {
    pub actions: Vec<String>,
    pub resolution_successful: bool,
    pub follow_up_required: bool,
    pub escalation_needed: bool,
}
