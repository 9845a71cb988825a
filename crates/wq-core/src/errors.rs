//! Shared error taxonomy.
//!
//! Every fallible operation in the workspace that crosses a crate boundary
//! returns (or wraps) `WqError`. A claim returning zero rows, and an
//! update predicate mismatch on complete/fail, are deliberately *not*
//! variants here: both are treated as non-errors, so `wq-processor`
//! represents them as ordinary `Ok` values (an empty `Vec`, or a boolean)
//! rather than as error cases a caller would have to match on.

use thiserror::Error;

/// Coarse category used by CLI exit-code mapping and by callers deciding
/// whether to retry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    ConfigMissing,
    TransientStorage,
    FatalStorage,
    LogicalStorage,
    HealthDegraded,
    HealthUnhealthy,
    BusinessLogic,
    InvalidInput,
    DeploymentFailed,
    RolloutTimeout,
    ScalingFailed,
    IncidentHandlerFailed,
}

#[derive(Debug, Error)]
pub enum WqError {
    #[error("required configuration value is missing: {0}")]
    ConfigMissing(String),

    #[error("transient storage error: {0}")]
    TransientStorage(String),

    #[error("fatal storage error: {0}")]
    FatalStorage(String),

    #[error("logical storage error: {0}")]
    LogicalStorage(String),

    #[error("health check reports degraded status: {0}")]
    HealthDegraded(String),

    #[error("health check reports unhealthy status: {0}")]
    HealthUnhealthy(String),

    #[error("business logic error: {0}")]
    BusinessLogic(String),

    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("deployment failed: {0}")]
    DeploymentFailed(String),

    #[error("rollout timed out: {0}")]
    RolloutTimeout(String),

    #[error("scaling failed: {0}")]
    ScalingFailed(String),

    #[error("incident handler failed: {0}")]
    IncidentHandlerFailed(String),
}

impl WqError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            WqError::ConfigMissing(_) => ErrorKind::ConfigMissing,
            WqError::TransientStorage(_) => ErrorKind::TransientStorage,
            WqError::FatalStorage(_) => ErrorKind::FatalStorage,
            WqError::LogicalStorage(_) => ErrorKind::LogicalStorage,
            WqError::HealthDegraded(_) => ErrorKind::HealthDegraded,
            WqError::HealthUnhealthy(_) => ErrorKind::HealthUnhealthy,
            WqError::BusinessLogic(_) => ErrorKind::BusinessLogic,
            WqError::InvalidInput(_) => ErrorKind::InvalidInput,
            WqError::DeploymentFailed(_) => ErrorKind::DeploymentFailed,
            WqError::RolloutTimeout(_) => ErrorKind::RolloutTimeout,
            WqError::ScalingFailed(_) => ErrorKind::ScalingFailed,
            WqError::IncidentHandlerFailed(_) => ErrorKind::IncidentHandlerFailed,
        }
    }

    /// Only `TransientStorage` is ever worth retrying: fatal/logical
    /// storage errors, and everything operational, bubble immediately.
    pub fn is_retryable(&self) -> bool {
        matches!(self, WqError::TransientStorage(_))
    }

    /// A structured `{kind, message, remediation}` view, for CLI
    /// diagnostics and API responses.
    pub fn remediation(&self) -> Option<&'static str> {
        match self {
            WqError::ConfigMissing(_) => Some("set the missing environment variable or secret and retry"),
            WqError::TransientStorage(_) => Some("retried automatically; if this persists, check database connectivity"),
            WqError::HealthUnhealthy(_) => Some("primary database is unreachable; fix connectivity before retrying the batch"),
            _ => None,
        }
    }
}
