//! Persistent vector collection on SQLite + sqlite-vec.
//!
//! One id-keyed record table plus a vec0 virtual table for similarity
//! search. The embedding model name and dimensionality are recorded in
//! `index_meta` on first open; reopening with a different fingerprint is a
//! fatal configuration error, because vectors from different models are not
//! comparable and the only valid migration is a full rebuild.

use std::path::Path;
use std::sync::Once;

use anyhow::{Context, Result};
use rusqlite::Connection;
use sqlite_vec::sqlite3_vec_init;
use tracing::info;

pub mod records;
pub mod search;

fn schema_sql(dimensions: usize) -> String {
    format!(
        r#"
CREATE TABLE IF NOT EXISTS records (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    chunk_id TEXT NOT NULL UNIQUE,
    source_file TEXT NOT NULL DEFAULT '',
    category TEXT NOT NULL DEFAULT '',
    doc_type TEXT NOT NULL DEFAULT '',
    url TEXT NOT NULL DEFAULT '',
    content TEXT NOT NULL,
    indexed_at DATETIME DEFAULT CURRENT_TIMESTAMP
);

CREATE INDEX IF NOT EXISTS idx_records_chunk_id ON records(chunk_id);
CREATE INDEX IF NOT EXISTS idx_records_source_file ON records(source_file);

CREATE TABLE IF NOT EXISTS index_meta (
    key TEXT PRIMARY KEY,
    value TEXT NOT NULL
);

CREATE VIRTUAL TABLE IF NOT EXISTS vec_records USING vec0(
    embedding FLOAT[{dimensions}]
);
"#
    )
}

static INIT_VEC: Once = Once::new();

/// Register the sqlite-vec extension. Safe to call multiple times.
fn init_sqlite_vec() {
    INIT_VEC.call_once(|| unsafe {
        rusqlite::ffi::sqlite3_auto_extension(Some(std::mem::transmute(
            sqlite3_vec_init as *const (),
        )));
    });
}

/// A persistent vector collection bound to one embedding model.
#[derive(Debug)]
pub struct VectorIndex {
    pub(crate) conn: Connection,
    pub(crate) dimensions: usize,
}

impl VectorIndex {
    /// Open (creating if absent) the collection at `path`. Idempotent.
    ///
    /// Fails if the file is not a valid collection or was built with a
    /// different embedding model or dimensionality.
    pub fn open<P: AsRef<Path>>(path: P, model_name: &str, dimensions: usize) -> Result<Self> {
        let path = path.as_ref();
        info!("Opening vector index: {}", path.display());

        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).with_context(|| {
                    format!("failed to create index directory: {}", parent.display())
                })?;
            }
        }

        init_sqlite_vec();
        let conn = Connection::open(path)
            .with_context(|| format!("failed to open index at {}", path.display()))?;

        Self::initialize(conn, model_name, dimensions)
            .with_context(|| format!("incompatible or corrupt index at {}", path.display()))
    }

    /// Open an in-memory collection (used in tests).
    pub fn open_in_memory(dimensions: usize) -> Result<Self> {
        init_sqlite_vec();
        let conn = Connection::open_in_memory()?;
        Self::initialize(conn, "mock", dimensions)
    }

    fn initialize(conn: Connection, model_name: &str, dimensions: usize) -> Result<Self> {
        let vec_version: String = conn
            .query_row("SELECT vec_version()", [], |row| row.get(0))
            .context("sqlite-vec extension unavailable")?;
        info!("sqlite-vec version: {vec_version}");

        conn.execute_batch(&schema_sql(dimensions))
            .context("failed to initialize index schema")?;

        let index = Self { conn, dimensions };
        index.check_meta("model", model_name)?;
        index.check_meta("dimensions", &dimensions.to_string())?;
        Ok(index)
    }

    /// Record a meta value on first open; fail on mismatch afterwards.
    fn check_meta(&self, key: &str, expected: &str) -> Result<()> {
        self.conn.execute(
            "INSERT INTO index_meta (key, value) VALUES (?, ?) ON CONFLICT(key) DO NOTHING",
            rusqlite::params![key, expected],
        )?;
        let stored: String = self.conn.query_row(
            "SELECT value FROM index_meta WHERE key = ?",
            rusqlite::params![key],
            |row| row.get(0),
        )?;
        anyhow::ensure!(
            stored == expected,
            "index was built with {key}={stored}, but the configuration requests {key}={expected}; \
             delete the index file and rebuild",
        );
        Ok(())
    }
}

/// Serialize a float32 vector into the little-endian blob layout expected by
/// the vec0 virtual table.
pub fn serialize_vector(vec: &[f32]) -> Vec<u8> {
    let mut bytes = Vec::with_capacity(vec.len() * 4);
    for v in vec {
        bytes.extend_from_slice(&v.to_le_bytes());
    }
    bytes
}
