//! wq-processor — the Distributed Processor.
//!
//! Atomic, non-overlapping record claiming across N worker instances via
//! `FOR UPDATE SKIP LOCKED`, idempotent completion/failure, orphan
//! recovery, and queue introspection. Built on `wq-db::DatabaseManager`.

pub mod instance;
pub mod processor;
pub mod rows;

pub use instance::new_instance_id;
pub use processor::{DistributedProcessor, ProcessorHealth};
