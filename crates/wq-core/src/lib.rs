//! wq-core
//!
//! The seam layer: the shared error taxonomy, the abstract interfaces that
//! replace the source's duck-typed managers (`ConfigSource`,
//! `QueryExecutor`, `PoolInspector`, `HealthCheckable`,
//! `ServiceOrchestrator`), and a small task-parallel executor used by
//! `wq-flow` to run a claimed batch concurrently.

pub mod errors;
pub mod exec;
pub mod health;
pub mod orchestrator;
pub mod traits;

pub use errors::{ErrorKind, WqError};
pub use exec::{CancelToken, TaskPool};
pub use health::{HealthReport, HealthState, PoolStatus};
pub use orchestrator::{ServiceInfo, ServiceOrchestrator, ServiceUpdate, TaskInfo, TaskState};
pub use traits::{ConfigSource, HealthCheckable, PoolInspector, QueryExecutor};
