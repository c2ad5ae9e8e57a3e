//! SQL schema for the Canopy SQLite object store.
//!
//! Executed once at connection startup. Future migrations will be gated on
//! `PRAGMA user_version`.

/// Full schema DDL; idempotent thanks to `CREATE TABLE IF NOT EXISTS`.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;

-- One row per object key. Writes replace the whole row.
CREATE TABLE IF NOT EXISTS objects (
    object_key   TEXT PRIMARY KEY,
    body         BLOB NOT NULL,
    content_hash TEXT NOT NULL,    -- hex SHA-256 of body
    updated_at   TEXT NOT NULL     -- ISO 8601 UTC; server-assigned
);

PRAGMA user_version = 1;
";
