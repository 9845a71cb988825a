//! wq-flow — the Flow Template.
//!
//! A single invocation processes at most one batch and returns: validate →
//! health-gate → claim → process concurrently → summarize. The business
//! logic itself is an injected function — this crate only knows how to
//! run it over a claimed batch and account for the outcome.

use log::{info, warn};
use serde::Serialize;
use serde_json::Value;
use wq_core::exec::{CancelToken, TaskPool};
use wq_core::{HealthState, WqError};
use wq_processor::DistributedProcessor;

/// Outcome of a single `mark_record_completed`/`mark_record_failed` call,
/// computed inside the worker pool so the main thread never touches the DB
/// while siblings are still running.
enum RecordOutcome {
    Completed,
    Failed(String),
}

/// `{flow_name, batch_size, records_claimed, records_processed,
/// records_completed, records_failed, success_rate_percent,
/// processor_instance, errors[]}`, plus `error_count` carrying the
/// untruncated total.
#[derive(Debug, Clone, Serialize)]
pub struct BatchSummary {
    pub flow_name: String,
    pub batch_size: i64,
    pub records_claimed: usize,
    pub records_processed: usize,
    pub records_completed: usize,
    pub records_failed: usize,
    pub success_rate_percent: f64,
    pub processor_instance: String,
    pub errors: Vec<String>,
    pub error_count: usize,
    pub message: Option<String>,
}

impl BatchSummary {
    fn empty(flow_name: &str, batch_size: i64, processor_instance: &str, message: impl Into<String>) -> Self {
        Self { flow_name: flow_name.to_string(),
               batch_size,
               records_claimed: 0,
               records_processed: 0,
               records_completed: 0,
               records_failed: 0,
               success_rate_percent: 0.0,
               processor_instance: processor_instance.to_string(),
               errors: Vec::new(),
               error_count: 0,
               message: Some(message.into()) }
    }
}

const MAX_REPORTED_ERRORS: usize = 10;

/// Runs one batch. `business_fn` is invoked once per claimed record's
/// payload; its `Ok` becomes the `result` passed to `mark_record_completed`,
/// its `Err` message is passed to `mark_record_failed`. A per-record
/// failure never aborts sibling records.
///
/// The only errors this function returns are health-check failure, claim
/// failure after exhausted retries, and invalid input — per-record errors
/// are absorbed into the summary.
pub fn run_batch<F>(processor: &DistributedProcessor, pool: &TaskPool, flow_name: &str, batch_size: i64,
                     business_fn: F)
                     -> Result<BatchSummary, WqError>
    where F: Fn(&Value) -> Result<Value, String> + Sync
{
    if flow_name.trim().is_empty() {
        return Err(WqError::InvalidInput("flow_name must not be empty".into()));
    }
    if batch_size <= 0 {
        return Err(WqError::InvalidInput("batch_size must be a positive integer".into()));
    }

    let health = processor.health_check();
    match health.status {
        HealthState::Unhealthy => {
            return Err(WqError::HealthUnhealthy(format!("processor {} is unhealthy, refusing to claim", processor.instance_id)));
        }
        HealthState::Degraded => {
            warn!("processor {} reports degraded health, proceeding with batch for {flow_name}", processor.instance_id);
        }
        HealthState::Healthy => {}
    }

    let claimed = processor.claim_records_batch(flow_name, batch_size)?;
    if claimed.is_empty() {
        return Ok(BatchSummary::empty(flow_name, batch_size, &processor.instance_id, "no pending records to claim"));
    }
    let records_claimed = claimed.len();

    let cancel = CancelToken::new();
    let outcomes = pool.map_collect(claimed, &cancel, |record| match business_fn(&record.payload) {
                            Ok(result) => (record.id, RecordOutcome::Completed, Some(result)),
                            Err(message) => (record.id, RecordOutcome::Failed(message), None),
                        });

    let mut records_completed = 0usize;
    let mut records_failed = 0usize;
    let mut errors = Vec::new();
    let mut error_count = 0usize;
    let mut records_processed = 0usize;

    for outcome in outcomes.into_iter().flatten() {
        records_processed += 1;
        let (id, outcome, result) = outcome;
        match outcome {
            RecordOutcome::Completed => {
                let result = result.unwrap_or(Value::Null);
                match processor.mark_record_completed(id, result) {
                    Ok(_) => records_completed += 1,
                    Err(e) => {
                        error_count += 1;
                        if errors.len() < MAX_REPORTED_ERRORS {
                            errors.push(format!("record {id}: failed to mark completed: {e}"));
                        }
                    }
                }
            }
            RecordOutcome::Failed(message) => {
                records_failed += 1;
                error_count += 1;
                if errors.len() < MAX_REPORTED_ERRORS {
                    errors.push(format!("record {id}: {message}"));
                }
                if let Err(e) = processor.mark_record_failed(id, &message) {
                    warn!("record {id}: failed to mark failed: {e}");
                }
            }
        }
    }

    let success_rate_percent =
        if records_processed == 0 { 0.0 } else { (records_completed as f64 / records_processed as f64) * 100.0 };

    info!("batch {flow_name}: claimed={records_claimed} processed={records_processed} completed={records_completed} failed={records_failed}");

    Ok(BatchSummary { flow_name: flow_name.to_string(),
                       batch_size,
                       records_claimed,
                       records_processed,
                       records_completed,
                       records_failed,
                       success_rate_percent,
                       processor_instance: processor.instance_id.clone(),
                       errors,
                       error_count,
                       message: None })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_summary_has_zero_counts_and_a_message() {
        let summary = BatchSummary::empty("demo", 10, "worker-abc", "no pending records to claim");
        assert_eq!(summary.records_claimed, 0);
        assert_eq!(summary.success_rate_percent, 0.0);
        assert!(summary.message.is_some());
    }
}
