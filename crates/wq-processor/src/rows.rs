use chrono::{DateTime, Utc};
use diesel::prelude::*;
use serde_json::Value;
use wq_db::schema::processing_queue;
use wq_domain::{Record, RecordStatus};

#[derive(Debug, Clone, Queryable)]
#[diesel(table_name = processing_queue)]
pub struct QueueRow {
    pub id: i64,
    pub flow_name: String,
    pub payload: Value,
    pub status: String,
    pub retry_count: i32,
    pub flow_instance_id: Option<String>,
    pub claimed_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
    pub error_message: Option<String>,
    pub result: Option<Value>,
}

impl From<QueueRow> for Record {
    fn from(r: QueueRow) -> Self {
        Record { id: r.id,
                 flow_name: r.flow_name,
                 payload: r.payload,
                 status: RecordStatus::from_db_str(&r.status).unwrap_or(RecordStatus::Pending),
                 retry_count: r.retry_count,
                 flow_instance_id: r.flow_instance_id,
                 claimed_at: r.claimed_at,
                 created_at: r.created_at,
                 updated_at: r.updated_at,
                 completed_at: r.completed_at,
                 error_message: r.error_message,
                 result: r.result }
    }
}

#[derive(Debug, Insertable)]
#[diesel(table_name = processing_queue)]
pub struct NewQueueRow {
    pub flow_name: String,
    pub payload: Value,
}
