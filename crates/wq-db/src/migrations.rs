//! Versioned migration runner. Files are embedded at
//! compile time (`include_str!`) in ascending `V<NNN>` order, each applied
//! in its own transaction, with a `schema_migrations` tracking row keyed by
//! a sha256 checksum of the file contents. Re-running a migration whose
//! recorded checksum no longer matches its source is a fatal error — it
//! means the file was edited after being applied, which this workspace
//! never allows.

use diesel::connection::SimpleConnection;
use diesel::pg::PgConnection;
use diesel::prelude::*;
use sha2::{Digest, Sha256};
use wq_core::WqError;

use crate::schema::schema_migrations;

struct Migration {
    version: i32,
    description: &'static str,
    sql: &'static str,
}

const MIGRATIONS: &[Migration] = &[
    Migration { version: 1, description: "create_processing_queue", sql: include_str!("../migrations/V001__create_processing_queue.sql") },
    Migration { version: 2, description: "processing_queue_indexes", sql: include_str!("../migrations/V002__processing_queue_indexes.sql") },
];

#[derive(Queryable)]
struct MigrationRow {
    #[allow(dead_code)]
    version: i32,
    #[allow(dead_code)]
    description: String,
    checksum: String,
    #[allow(dead_code)]
    applied_at: chrono::DateTime<chrono::Utc>,
}

fn checksum(sql: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(sql.as_bytes());
    format!("{:x}", hasher.finalize())
}

fn ensure_tracking_table(conn: &mut PgConnection) -> Result<(), WqError> {
    conn.batch_execute(
        "CREATE TABLE IF NOT EXISTS schema_migrations (
            version INTEGER PRIMARY KEY,
            description TEXT NOT NULL,
            checksum TEXT NOT NULL,
            applied_at TIMESTAMPTZ NOT NULL DEFAULT now()
        )",
    )
    .map_err(|e| WqError::FatalStorage(format!("creating schema_migrations: {e}")))
}

/// Applies every migration in `MIGRATIONS` not yet recorded, in ascending
/// version order, each inside its own transaction.
pub fn run_pending_migrations(conn: &mut PgConnection) -> Result<(), WqError> {
    ensure_tracking_table(conn)?;

    for m in MIGRATIONS {
        let existing: Option<MigrationRow> = schema_migrations::table
            .filter(schema_migrations::version.eq(m.version))
            .first(conn)
            .optional()
            .map_err(crate::error::classify_diesel_error)?;

        let sum = checksum(m.sql);
        match existing {
            Some(row) if row.checksum == sum => {
                log::debug!("migration V{:03} already applied, checksum matches", m.version);
                continue;
            }
            Some(row) => {
                return Err(WqError::FatalStorage(format!(
                    "migration V{:03} checksum mismatch: recorded {} but source is {}",
                    m.version, row.checksum, sum
                )));
            }
            None => {
                log::info!("applying migration V{:03}__{}", m.version, m.description);
                conn.transaction(|tx| {
                         tx.batch_execute(m.sql)?;
                         diesel::insert_into(schema_migrations::table)
                             .values((schema_migrations::version.eq(m.version),
                                      schema_migrations::description.eq(m.description),
                                      schema_migrations::checksum.eq(&sum)))
                             .execute(tx)?;
                         Ok::<(), diesel::result::Error>(())
                     })
                     .map_err(crate::error::classify_diesel_error)?;
            }
        }
    }
    Ok(())
}
