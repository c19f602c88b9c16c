use rusqlite::{Result, params};

use super::{VectorIndex, serialize_vector};
use crate::index::records::RecordMetadata;

/// One nearest-neighbor hit.
///
/// `distance` is the cosine distance to the query vector: lower is more
/// similar, 0.0 is identical direction. This polarity is fixed; consumers
/// must not re-sort.
#[derive(Debug, Clone)]
pub struct Hit {
    pub chunk_id: String,
    pub text: String,
    pub metadata: RecordMetadata,
    pub distance: f64,
}

impl VectorIndex {
    /// Return up to `top_k` records ranked by cosine distance to
    /// `query_vector`, best match first. An empty collection yields zero
    /// hits, not an error.
    pub fn query(&self, query_vector: &[f32], top_k: usize) -> Result<Vec<Hit>> {
        let mut stmt = self.conn.prepare(
            r#"
            SELECT
                r.chunk_id,
                r.content,
                r.source_file,
                r.category,
                r.doc_type,
                r.url,
                vec_distance_cosine(v.embedding, ?) AS distance
            FROM vec_records v
            JOIN records r ON v.rowid = r.id
            ORDER BY distance ASC
            LIMIT ?
            "#,
        )?;

        let rows = stmt.query_map(
            params![serialize_vector(query_vector), top_k as i64],
            |row| {
                Ok(Hit {
                    chunk_id: row.get(0)?,
                    text: row.get(1)?,
                    metadata: RecordMetadata {
                        source_file: row.get(2)?,
                        category: row.get(3)?,
                        doc_type: row.get(4)?,
                        url: row.get(5)?,
                    },
                    distance: row.get(6)?,
                })
            },
        )?;

        let mut hits = Vec::new();
        for row in rows {
            hits.push(row?);
        }
        Ok(hits)
    }
}
