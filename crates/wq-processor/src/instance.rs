//! Stable per-process instance identity (GLOSSARY: "Instance id").

use uuid::Uuid;

/// Generates a short, readable instance id: a hostname-ish prefix plus a
/// random suffix, stable for the process's lifetime. The suffix alone is
/// enough to disambiguate concurrent instances on the same host; the
/// prefix just makes `flow_instance_id` values legible in `psql`.
pub fn new_instance_id(role: &str) -> String {
    let suffix = Uuid::new_v4().simple().to_string();
    format!("{role}-{}", &suffix[..12])
}
