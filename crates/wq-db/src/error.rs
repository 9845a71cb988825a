//! Maps Diesel / connection-pool errors onto the shared `wq_core::WqError`
//! taxonomy, classifying each into `transient` / `fatal` / `logical`.

use diesel::result::{DatabaseErrorKind, Error as DieselError};
use wq_core::WqError;

pub fn classify_diesel_error(err: DieselError) -> WqError {
    match err {
        DieselError::NotFound => WqError::LogicalStorage("not found".into()),
        DieselError::DatabaseError(kind, info) => match kind {
            DatabaseErrorKind::UniqueViolation => WqError::LogicalStorage(format!("unique violation: {}", info.message())),
            DatabaseErrorKind::CheckViolation => WqError::LogicalStorage(format!("check violation: {}", info.message())),
            DatabaseErrorKind::ForeignKeyViolation => {
                WqError::LogicalStorage(format!("foreign key violation: {}", info.message()))
            }
            DatabaseErrorKind::SerializationFailure => WqError::TransientStorage("serialization conflict".into()),
            DatabaseErrorKind::ClosedConnection => WqError::TransientStorage("connection closed".into()),
            // Postgres has no dedicated DatabaseErrorKind for a deadlock
            // (sqlstate 40P01); it surfaces as Unknown, so it has to be
            // picked out of the message text instead.
            other if info.message().to_lowercase().contains("deadlock") => {
                WqError::TransientStorage(format!("deadlock detected: {}", info.message()))
            }
            other => WqError::FatalStorage(format!("database error ({other:?}): {}", info.message())),
        },
        DieselError::BrokenTransactionManager => WqError::TransientStorage("broken transaction manager".into()),
        DieselError::DeserializationError(e) => WqError::FatalStorage(format!("deserialization: {e}")),
        DieselError::SerializationError(e) => WqError::FatalStorage(format!("serialization: {e}")),
        DieselError::QueryBuilderError(e) => WqError::FatalStorage(format!("query builder: {e}")),
        DieselError::InvalidCString(e) => WqError::FatalStorage(format!("invalid cstring: {e}")),
        other => WqError::FatalStorage(format!("unhandled diesel error: {other}")),
    }
}
