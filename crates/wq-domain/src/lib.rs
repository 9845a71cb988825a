//! wq-domain
//!
//! Plain data types shared by every other crate in the workspace: the
//! `processing_queue` record shape, and the deployment/scaling/incident
//! types the operational side works with. No I/O, no traits with behavior —
//! those live in `wq-core`.

pub mod deployment;
pub mod error;
pub mod incident;
pub mod metrics;
pub mod record;
pub mod scaling;

pub use deployment::{
    Deployment, DeploymentConfig, DeploymentStatus, FailureAction, HealthCheckConfig, ResourceLimits,
    RollingUpdateConfig, ServiceSnapshot,
};
pub use error::DomainError;
pub use incident::{Incident, IncidentClass, IncidentResponse, IncidentSeverity};
pub use metrics::OperationalMetrics;
pub use record::{ClaimedRecord, QueueStatus, Record, RecordStatus, StatusCounts};
pub use scaling::{ScalingDirection, ScalingPolicy, ScalingResult, ServiceMetrics};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn record_status_roundtrips_through_db_str() {
        for s in [RecordStatus::Pending, RecordStatus::Processing, RecordStatus::Completed, RecordStatus::Failed] {
            let round = RecordStatus::from_db_str(s.as_db_str()).unwrap();
            assert_eq!(round, s);
        }
    }

    #[test]
    fn status_counts_total_sums_all_buckets() {
        let c = StatusCounts { pending: 3, processing: 1, completed: 5, failed: 2 };
        assert_eq!(c.total(), 11);
    }
}
