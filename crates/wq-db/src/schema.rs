//! Diesel schema (hand-written — no `diesel print-schema` step in this
//! workspace). Tables:
//! - `processing_queue`: the logical work queue rows claimed/processed by
//!   `wq-processor`.
//! - `schema_migrations`: version/checksum tracking for `crate::migrations`.

diesel::table! {
    processing_queue (id) {
        id -> BigInt,
        flow_name -> Text,
        payload -> Jsonb,
        status -> Text,
        retry_count -> Integer,
        flow_instance_id -> Nullable<Text>,
        claimed_at -> Nullable<Timestamptz>,
        created_at -> Timestamptz,
        updated_at -> Timestamptz,
        completed_at -> Nullable<Timestamptz>,
        error_message -> Nullable<Text>,
        result -> Nullable<Jsonb>,
    }
}

diesel::table! {
    schema_migrations (version) {
        version -> Integer,
        description -> Text,
        checksum -> Text,
        applied_at -> Timestamptz,
    }
}
