use rusqlite::{Result, params};

use super::{VectorIndex, serialize_vector};

/// Provenance metadata stored with each record.
///
/// Unmatched reference files carry only `source_file`; the remaining fields
/// stay empty strings.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RecordMetadata {
    pub source_file: String,
    pub category: String,
    pub doc_type: String,
    pub url: String,
}

impl VectorIndex {
    /// Write or overwrite records by chunk id.
    ///
    /// The four slices must have equal length and every vector must match
    /// the index dimensionality. Each record commits in its own transaction,
    /// so a crash mid-batch never corrupts records already written; the
    /// batch as a whole is not atomic.
    pub fn upsert(
        &mut self,
        ids: &[String],
        texts: &[String],
        vectors: &[Vec<f32>],
        metadatas: &[RecordMetadata],
    ) -> Result<()> {
        assert_eq!(ids.len(), texts.len(), "ids and texts length mismatch");
        assert_eq!(ids.len(), vectors.len(), "ids and vectors length mismatch");
        assert_eq!(
            ids.len(),
            metadatas.len(),
            "ids and metadatas length mismatch"
        );

        for i in 0..ids.len() {
            assert_eq!(
                vectors[i].len(),
                self.dimensions,
                "vector dimensionality mismatch"
            );

            let tx = self.conn.transaction()?;

            let row_id: i64 = tx.query_row(
                r#"
                INSERT INTO records (chunk_id, source_file, category, doc_type, url, content, indexed_at)
                VALUES (?, ?, ?, ?, ?, ?, CURRENT_TIMESTAMP)
                ON CONFLICT(chunk_id) DO UPDATE SET
                    source_file = excluded.source_file,
                    category = excluded.category,
                    doc_type = excluded.doc_type,
                    url = excluded.url,
                    content = excluded.content,
                    indexed_at = CURRENT_TIMESTAMP
                RETURNING id
                "#,
                params![
                    ids[i],
                    metadatas[i].source_file,
                    metadatas[i].category,
                    metadatas[i].doc_type,
                    metadatas[i].url,
                    texts[i],
                ],
                |row| row.get(0),
            )?;

            // Virtual table has no upsert; replace the vector explicitly
            tx.execute("DELETE FROM vec_records WHERE rowid = ?", params![row_id])?;
            tx.execute(
                "INSERT INTO vec_records (rowid, embedding) VALUES (?, ?)",
                params![row_id, serialize_vector(&vectors[i])],
            )?;

            tx.commit()?;
        }

        Ok(())
    }

    /// Total persisted records.
    pub fn count(&self) -> Result<usize> {
        let n: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM records", [], |row| row.get(0))?;
        Ok(n as usize)
    }

    /// Chunk counts per source file, ordered by filename.
    pub fn source_stats(&self) -> Result<Vec<(String, usize)>> {
        let mut stmt = self.conn.prepare(
            "SELECT source_file, COUNT(*) FROM records GROUP BY source_file ORDER BY source_file",
        )?;
        let rows = stmt.query_map([], |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, i64>(1)? as usize))
        })?;

        let mut stats = Vec::new();
        for row in rows {
            stats.push(row?);
        }
        Ok(stats)
    }
}
