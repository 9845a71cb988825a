use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Status of a `processing_queue` row. Mirrors the Postgres `status`
/// check constraint 1:1 — see `wq-db::schema`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecordStatus {
    Pending,
    Processing,
    Completed,
    Failed,
}

impl RecordStatus {
    /// Text form stored in the DB column.
    pub fn as_db_str(self) -> &'static str {
        match self {
            RecordStatus::Pending => "pending",
            RecordStatus::Processing => "processing",
            RecordStatus::Completed => "completed",
            RecordStatus::Failed => "failed",
        }
    }

    pub fn from_db_str(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(RecordStatus::Pending),
            "processing" => Some(RecordStatus::Processing),
            "completed" => Some(RecordStatus::Completed),
            "failed" => Some(RecordStatus::Failed),
            _ => None,
        }
    }
}

/// A single row of the logical work queue.
///
/// Invariants (enforced jointly by `wq-processor` and the DB schema):
/// 1. `status = Pending` implies `flow_instance_id` and `claimed_at` are both `None`.
/// 2. `status = Processing` implies both are `Some`.
/// 3. a terminal transition into `Completed`/`Failed` sets `completed_at`.
/// 4. `retry_count` only advances on a `Processing -> Failed` transition.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Record {
    pub id: i64,
    pub flow_name: String,
    pub payload: Value,
    pub status: RecordStatus,
    pub retry_count: i32,
    pub flow_instance_id: Option<String>,
    pub claimed_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
    pub error_message: Option<String>,
    pub result: Option<Value>,
}

impl Record {
    /// A freshly claimed record carries what the caller needs to run the
    /// business function: nothing more. Used as the return shape of
    /// `claim_records_batch`.
    pub fn claimed_view(&self) -> ClaimedRecord {
        ClaimedRecord { id: self.id,
                        flow_name: self.flow_name.clone(),
                        payload: self.payload.clone(),
                        retry_count: self.retry_count,
                        created_at: self.created_at }
    }
}

/// What `claim_records_batch` hands back to the caller — the prior payload
/// plus enough identity to report back completion/failure.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClaimedRecord {
    pub id: i64,
    pub flow_name: String,
    pub payload: Value,
    pub retry_count: i32,
    pub created_at: DateTime<Utc>,
}

/// Per-status counts used by `get_queue_status`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StatusCounts {
    pub pending: i64,
    pub processing: i64,
    pub completed: i64,
    pub failed: i64,
}

impl StatusCounts {
    pub fn total(&self) -> i64 {
        self.pending + self.processing + self.completed + self.failed
    }
}

/// Aggregate snapshot returned by `get_queue_status`. `by_flow` is only
/// populated when the caller asked for a global (unfiltered) view.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct QueueStatus {
    pub counts: StatusCounts,
    pub by_flow: Option<std::collections::BTreeMap<String, StatusCounts>>,
}
