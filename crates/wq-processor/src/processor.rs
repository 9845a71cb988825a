//! The Distributed Processor: atomic, non-overlapping record claiming
//! across N worker instances using row-level skip-lock semantics,
//! idempotent status transitions, bounded retries, and orphan recovery.

use std::collections::{BTreeMap, HashMap};

use chrono::{Duration as ChronoDuration, Utc};
use diesel::dsl::count_star;
use diesel::prelude::*;
use log::{debug, warn};
use serde_json::Value;
use wq_core::{HealthCheckable, HealthReport, HealthState, WqError};
use wq_db::schema::processing_queue::dsl as pq;
use wq_db::DatabaseManager;
use wq_domain::{ClaimedRecord, QueueStatus, StatusCounts};

use crate::instance::new_instance_id;
use crate::rows::{NewQueueRow, QueueRow};

/// Aggregate health view returned by `health_check`.
#[derive(Debug, Clone, serde::Serialize)]
pub struct ProcessorHealth {
    pub status: HealthState,
    pub databases: BTreeMap<String, HealthReport>,
    pub queue_status: Option<QueueStatus>,
    pub instance_id: String,
}

/// One processor per worker process. Owns the primary (queue) database and,
/// optionally, a read-only source database it never writes to. Construct
/// once at startup; never rebuild per batch.
pub struct DistributedProcessor {
    pub instance_id: String,
    primary: DatabaseManager,
    source: Option<DatabaseManager>,
}

impl DistributedProcessor {
    pub fn new(role: &str, primary: DatabaseManager) -> Self {
        Self { instance_id: new_instance_id(role), primary, source: None }
    }

    pub fn with_source(mut self, source: DatabaseManager) -> Self {
        self.source = Some(source);
        self
    }

    /// Atomically claims up to `batch_size` pending rows for `flow_name`,
    /// FIFO by `created_at`, using `FOR UPDATE SKIP LOCKED` so concurrent
    /// claimants never see overlapping rows.
    pub fn claim_records_batch(&self, flow_name: &str, batch_size: i64) -> Result<Vec<ClaimedRecord>, WqError> {
        let instance_id = self.instance_id.clone();
        let flow = flow_name.to_string();
        self.primary.with_retry("claim_records_batch", move |conn| {
            conn.transaction(|tx| {
                let locked_ids: Vec<i64> = pq::processing_queue.filter(pq::flow_name.eq(&flow))
                                                                .filter(pq::status.eq("pending"))
                                                                .order(pq::created_at.asc())
                                                                .limit(batch_size)
                                                                .select(pq::id)
                                                                .for_update()
                                                                .skip_locked()
                                                                .load(tx)?;
                if locked_ids.is_empty() {
                    return Ok(Vec::new());
                }
                let now = Utc::now();
                let updated: Vec<QueueRow> = diesel::update(pq::processing_queue.filter(pq::id.eq_any(&locked_ids)))
                    .set((pq::status.eq("processing"), pq::flow_instance_id.eq(&instance_id), pq::claimed_at.eq(now), pq::updated_at.eq(now)))
                    .get_results(tx)?;

                // `RETURNING` does not promise the `ANY(ids)` input order;
                // re-sort to the lock-acquisition (created_at) order so the
                // FIFO-within-batch invariant holds for the caller too.
                let mut by_id: HashMap<i64, QueueRow> = updated.into_iter().map(|r| (r.id, r)).collect();
                let ordered: Vec<ClaimedRecord> =
                    locked_ids.into_iter()
                              .filter_map(|id| by_id.remove(&id))
                              .map(|row| wq_domain::Record::from(row).claimed_view())
                              .collect();
                Ok(ordered)
            })
            .map_err(wq_db::error::classify_diesel_error)
        })
    }

    /// Marks a record completed. The `flow_instance_id = self AND status =
    /// 'processing'` predicate makes this a silent no-op when orphan
    /// recovery already reclaimed the row out from under a late worker —
    /// not an error, just an ownership check that failed.
    pub fn mark_record_completed(&self, id: i64, result: Value) -> Result<bool, WqError> {
        let instance_id = self.instance_id.clone();
        self.primary.with_retry("mark_record_completed", move |conn| {
            let now = Utc::now();
            let affected = diesel::update(pq::processing_queue.filter(pq::id.eq(id))
                                                               .filter(pq::flow_instance_id.eq(&instance_id))
                                                               .filter(pq::status.eq("processing")))
                .set((pq::status.eq("completed"), pq::result.eq(&result), pq::completed_at.eq(now), pq::updated_at.eq(now)))
                .execute(conn)
                .map_err(wq_db::error::classify_diesel_error)?;
            if affected == 0 {
                debug!("mark_record_completed({id}): record not owned by {instance_id}, treated as no-op");
            }
            Ok(affected > 0)
        })
    }

    /// Marks a record failed and bumps `retry_count`. Same ownership
    /// predicate and no-op semantics as `mark_record_completed`.
    pub fn mark_record_failed(&self, id: i64, error: &str) -> Result<bool, WqError> {
        let instance_id = self.instance_id.clone();
        let error_message = error.to_string();
        self.primary.with_retry("mark_record_failed", move |conn| {
            let now = Utc::now();
            let affected = diesel::update(pq::processing_queue.filter(pq::id.eq(id))
                                                               .filter(pq::flow_instance_id.eq(&instance_id))
                                                               .filter(pq::status.eq("processing")))
                .set((pq::status.eq("failed"),
                      pq::retry_count.eq(pq::retry_count + 1),
                      pq::error_message.eq(&error_message),
                      pq::updated_at.eq(now)))
                .execute(conn)
                .map_err(wq_db::error::classify_diesel_error)?;
            if affected == 0 {
                debug!("mark_record_failed({id}): record not owned by {instance_id}, treated as no-op");
            }
            Ok(affected > 0)
        })
    }

    /// Batch inserts new `pending` records; `created_at`/`updated_at` are
    /// server-assigned defaults. Order within the batch carries no meaning.
    pub fn add_records_to_queue(&self, flow_name: &str, payloads: Vec<Value>) -> Result<usize, WqError> {
        let flow = flow_name.to_string();
        self.primary.with_retry("add_records_to_queue", move |conn| {
            let new_rows: Vec<NewQueueRow> =
                payloads.iter().map(|p| NewQueueRow { flow_name: flow.clone(), payload: p.clone() }).collect();
            diesel::insert_into(pq::processing_queue).values(&new_rows)
                                                       .execute(conn)
                                                       .map_err(wq_db::error::classify_diesel_error)
        })
    }

    /// Read-only status aggregation; no locks taken.
    pub fn get_queue_status(&self, flow_name: Option<&str>) -> Result<QueueStatus, WqError> {
        let flow = flow_name.map(|s| s.to_string());
        self.primary.with_retry("get_queue_status", move |conn| {
            let counts = Self::status_counts(conn, flow.as_deref())?;
            let by_flow = if flow.is_none() { Some(Self::status_counts_by_flow(conn)?) } else { None };
            Ok(QueueStatus { counts, by_flow })
        })
    }

    fn status_counts(conn: &mut PgConnection, flow_name: Option<&str>) -> Result<StatusCounts, WqError> {
        let mut query = pq::processing_queue.into_boxed();
        if let Some(flow) = flow_name {
            query = query.filter(pq::flow_name.eq(flow.to_string()));
        }
        let rows: Vec<(String, i64)> = query.group_by(pq::status)
                                             .select((pq::status, count_star()))
                                             .load(conn)
                                             .map_err(wq_db::error::classify_diesel_error)?;
        Ok(Self::counts_from_rows(rows))
    }

    fn status_counts_by_flow(conn: &mut PgConnection) -> Result<BTreeMap<String, StatusCounts>, WqError> {
        let rows: Vec<(String, String, i64)> = pq::processing_queue.group_by((pq::flow_name, pq::status))
                                                                     .select((pq::flow_name, pq::status, count_star()))
                                                                     .load(conn)
                                                                     .map_err(wq_db::error::classify_diesel_error)?;
        let mut by_flow: BTreeMap<String, Vec<(String, i64)>> = BTreeMap::new();
        for (flow, status, n) in rows {
            by_flow.entry(flow).or_default().push((status, n));
        }
        Ok(by_flow.into_iter().map(|(flow, rows)| (flow, Self::counts_from_rows(rows))).collect())
    }

    fn counts_from_rows(rows: Vec<(String, i64)>) -> StatusCounts {
        let mut counts = StatusCounts::default();
        for (status, n) in rows {
            match status.as_str() {
                "pending" => counts.pending = n,
                "processing" => counts.processing = n,
                "completed" => counts.completed = n,
                "failed" => counts.failed = n,
                other => warn!("unrecognized status {other} in processing_queue, ignored in counts"),
            }
        }
        counts
    }

    /// Reclaims rows stuck in `processing` past `timeout_hours`. Callers
    /// must pick a timeout that strictly exceeds the longest expected
    /// per-record processing time — too short reclaims live work.
    pub fn cleanup_orphaned_records(&self, timeout_hours: i64) -> Result<usize, WqError> {
        self.primary.with_retry("cleanup_orphaned_records", move |conn| {
            let cutoff = Utc::now() - ChronoDuration::hours(timeout_hours);
            diesel::update(pq::processing_queue.filter(pq::status.eq("processing")).filter(pq::claimed_at.lt(cutoff)))
                .set((pq::status.eq("pending"), pq::flow_instance_id.eq(None::<String>), pq::claimed_at.eq(None::<chrono::DateTime<Utc>>), pq::updated_at.eq(Utc::now())))
                .execute(conn)
                .map_err(wq_db::error::classify_diesel_error)
        })
    }

    /// Moves `failed` rows with `retry_count < max_retries` back to
    /// `pending`; rows at or above the cap are left `failed`.
    pub fn reset_failed_records(&self, flow_name: Option<&str>, max_retries: i32) -> Result<usize, WqError> {
        let flow = flow_name.map(|s| s.to_string());
        self.primary.with_retry("reset_failed_records", move |conn| {
            let mut query = diesel::update(pq::processing_queue).into_boxed();
            query = query.filter(pq::status.eq("failed")).filter(pq::retry_count.lt(max_retries));
            if let Some(flow) = &flow {
                query = query.filter(pq::flow_name.eq(flow.clone()));
            }
            query.set((pq::status.eq("pending"), pq::flow_instance_id.eq(None::<String>), pq::claimed_at.eq(None::<chrono::DateTime<Utc>>), pq::error_message.eq(None::<String>), pq::updated_at.eq(Utc::now())))
                 .execute(conn)
                 .map_err(wq_db::error::classify_diesel_error)
        })
    }

    /// `healthy` iff every database is healthy; `degraded` iff only a
    /// non-primary (source) db is degraded; `unhealthy` iff the primary is
    /// unhealthy. The flow template gates claiming on this.
    pub fn health_check(&self) -> ProcessorHealth {
        let mut databases = BTreeMap::new();
        let primary_report = self.primary.health_check();
        databases.insert(self.primary.name.clone(), primary_report.clone());
        if let Some(source) = &self.source {
            databases.insert(source.name.clone(), source.health_check());
        }

        let status = match primary_report.status {
            HealthState::Unhealthy => HealthState::Unhealthy,
            HealthState::Healthy | HealthState::Degraded => {
                let source_unhealthy =
                    self.source.as_ref().map(|s| databases[&s.name].status == HealthState::Unhealthy).unwrap_or(false);
                let source_degraded =
                    self.source.as_ref().map(|s| databases[&s.name].status == HealthState::Degraded).unwrap_or(false);
                if source_unhealthy || primary_report.status == HealthState::Degraded || source_degraded {
                    HealthState::Degraded
                } else {
                    HealthState::Healthy
                }
            }
        };

        let queue_status = self.get_queue_status(None).ok();
        ProcessorHealth { status, databases, queue_status, instance_id: self.instance_id.clone() }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counts_from_rows_buckets_known_statuses() {
        let counts = DistributedProcessor::counts_from_rows(vec![("pending".into(), 3),
                                                                   ("processing".into(), 1),
                                                                   ("completed".into(), 5),
                                                                   ("failed".into(), 2)]);
        assert_eq!(counts.pending, 3);
        assert_eq!(counts.processing, 1);
        assert_eq!(counts.completed, 5);
        assert_eq!(counts.failed, 2);
        assert_eq!(counts.total(), 11);
    }

    #[test]
    fn counts_from_rows_ignores_unrecognized_status() {
        let counts = DistributedProcessor::counts_from_rows(vec![("pending".into(), 2), ("quarantined".into(), 99)]);
        assert_eq!(counts.total(), 2);
    }

    #[test]
    fn instance_id_carries_the_requested_role_prefix() {
        let id = new_instance_id("worker");
        assert!(id.starts_with("worker-"));
        assert_eq!(id.len(), "worker-".len() + 12);
    }
}
