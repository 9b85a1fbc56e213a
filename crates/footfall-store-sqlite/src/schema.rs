//! SQL schema for the Footfall SQLite store.
//!
//! Executed once at connection startup. Future migrations will be gated on
//! `PRAGMA user_version`.

/// Full schema DDL; idempotent thanks to `CREATE TABLE IF NOT EXISTS`.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;

CREATE TABLE IF NOT EXISTS interactions (
    interaction_id TEXT PRIMARY KEY,
    contact_id     TEXT NOT NULL,
    start_at       INTEGER NOT NULL,  -- microseconds since the Unix epoch, UTC
    visit_index    INTEGER NOT NULL,
    discriminator  TEXT NOT NULL,     -- subtype tag, e.g. 'Visit'
    channel_id     TEXT,
    payload        TEXT NOT NULL DEFAULT '{}'
);

-- Partition metadata. Empty for an unsharded collection.
CREATE TABLE IF NOT EXISTS chunks (
    chunk_id   INTEGER PRIMARY KEY,
    collection TEXT NOT NULL,
    shard      TEXT NOT NULL,
    min_key    TEXT NOT NULL,
    max_key    TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS interactions_history_idx
    ON interactions(contact_id, start_at, interaction_id);
CREATE INDEX IF NOT EXISTS chunks_collection_idx ON chunks(collection);

PRAGMA user_version = 1;
";

/// The collection name chunk metadata is recorded under.
pub const COLLECTION: &str = "interactions";
