//! Query-time retrieval facade.
//!
//! Embeds a query string, runs a top-k search against the vector index, and
//! projects the hits into citation records for the red-flag/citation layer.
//! Result order is exactly the index's similarity ranking; nothing here
//! re-sorts.

use anyhow::Result;
use serde::Serialize;

use crate::embedder::Embedder;
use crate::index::VectorIndex;

/// Marker appended when [`build_context`] cuts the citation block short.
pub const TRUNCATION_MARKER: &str = "… [truncated]";

/// A retrieval result surfaced downstream as citation evidence.
#[derive(Debug, Clone, Serialize)]
pub struct Citation {
    pub text: String,
    pub source_file: String,
    pub category: String,
    pub doc_type: String,
    pub url: String,
    /// Cosine distance to the query: lower is more similar. `None` when the
    /// index reports no distance.
    pub score: Option<f64>,
}

pub struct Retriever<'a, E: Embedder + ?Sized> {
    index: &'a VectorIndex,
    embedder: &'a E,
}

impl<'a, E: Embedder + ?Sized> Retriever<'a, E> {
    pub fn new(index: &'a VectorIndex, embedder: &'a E) -> Self {
        Self { index, embedder }
    }

    /// Retrieve up to `top_k` citations for a query, best match first.
    ///
    /// An empty index or a query with no matches yields an empty vector,
    /// not an error.
    pub fn retrieve(&self, query: &str, top_k: usize) -> Result<Vec<Citation>> {
        let query_vector = self.embedder.embed(query)?;
        let hits = self.index.query(&query_vector, top_k)?;

        Ok(hits
            .into_iter()
            .map(|hit| Citation {
                text: hit.text,
                source_file: hit.metadata.source_file,
                category: hit.metadata.category,
                doc_type: hit.metadata.doc_type,
                url: hit.metadata.url,
                score: Some(hit.distance),
            })
            .collect())
    }
}

/// Assemble a bounded context block from citations, for handing to a text
/// generator.
///
/// Citations are included in ranking order, separated by blank lines and
/// labeled with their source file. If the block exceeds `max_chars` it is
/// cut on a char boundary and [`TRUNCATION_MARKER`] is appended, so the cut
/// is always visible downstream.
#[must_use]
pub fn build_context(citations: &[Citation], max_chars: usize) -> String {
    let mut block = String::new();
    for citation in citations {
        if !block.is_empty() {
            block.push_str("\n\n");
        }
        block.push_str(&format!("[{}] {}", citation.source_file, citation.text));
    }

    if block.chars().count() <= max_chars {
        return block;
    }

    let kept: String = block.chars().take(max_chars).collect();
    format!("{kept}{TRUNCATION_MARKER}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::embedder::mock::MockEmbedder;
    use crate::index::records::RecordMetadata;

    fn seeded_index(embedder: &MockEmbedder) -> VectorIndex {
        let mut index = VectorIndex::open_in_memory(embedder.dimensions()).unwrap();
        let texts = vec![
            "ADGM Courts have exclusive jurisdiction.".to_string(),
            "Share capital must be stated in the articles.".to_string(),
        ];
        let ids = vec!["courts.pdf_0".to_string(), "capital.pdf_0".to_string()];
        let vectors = embedder
            .embed_batch(&texts.iter().map(String::as_str).collect::<Vec<_>>())
            .unwrap();
        let metadatas = vec![
            RecordMetadata {
                source_file: "courts.pdf".to_string(),
                category: "Regulations".to_string(),
                doc_type: "Courts".to_string(),
                url: "http://example/courts.pdf".to_string(),
            },
            RecordMetadata {
                source_file: "capital.pdf".to_string(),
                ..Default::default()
            },
        ];
        index.upsert(&ids, &texts, &vectors, &metadatas).unwrap();
        index
    }

    #[test]
    fn test_retrieve_identical_text_is_best_match() {
        let embedder = MockEmbedder::new(64);
        let index = seeded_index(&embedder);
        let retriever = Retriever::new(&index, &embedder);

        // Mock embeddings are deterministic, so the identical text is an
        // exact vector match at distance ~0.
        let citations = retriever
            .retrieve("ADGM Courts have exclusive jurisdiction.", 2)
            .unwrap();
        assert_eq!(citations.len(), 2);
        assert_eq!(citations[0].source_file, "courts.pdf");
        assert!(citations[0].score.unwrap() < 1e-5);
        assert!(citations[0].score.unwrap() <= citations[1].score.unwrap());
    }

    #[test]
    fn test_retrieve_preserves_metadata_and_defaults() {
        let embedder = MockEmbedder::new(64);
        let index = seeded_index(&embedder);
        let retriever = Retriever::new(&index, &embedder);

        let citations = retriever
            .retrieve("Share capital must be stated in the articles.", 1)
            .unwrap();
        assert_eq!(citations.len(), 1);
        assert_eq!(citations[0].source_file, "capital.pdf");
        // Fields with no manifest metadata stay empty strings
        assert_eq!(citations[0].category, "");
        assert_eq!(citations[0].doc_type, "");
        assert_eq!(citations[0].url, "");
    }

    #[test]
    fn test_retrieve_empty_index_returns_no_citations() {
        let embedder = MockEmbedder::new(64);
        let index = VectorIndex::open_in_memory(64).unwrap();
        let retriever = Retriever::new(&index, &embedder);

        let citations = retriever.retrieve("anything", 5).unwrap();
        assert!(citations.is_empty());
    }

    #[test]
    fn test_retrieve_caps_at_top_k() {
        let embedder = MockEmbedder::new(64);
        let index = seeded_index(&embedder);
        let retriever = Retriever::new(&index, &embedder);

        let citations = retriever.retrieve("jurisdiction", 1).unwrap();
        assert_eq!(citations.len(), 1);
    }

    fn citation(source_file: &str, text: &str) -> Citation {
        Citation {
            text: text.to_string(),
            source_file: source_file.to_string(),
            category: String::new(),
            doc_type: String::new(),
            url: String::new(),
            score: None,
        }
    }

    #[test]
    fn test_build_context_within_budget() {
        let citations = vec![citation("a.pdf", "alpha"), citation("b.pdf", "beta")];
        let block = build_context(&citations, 1000);
        assert_eq!(block, "[a.pdf] alpha\n\n[b.pdf] beta");
        assert!(!block.contains(TRUNCATION_MARKER));
    }

    #[test]
    fn test_build_context_truncates_with_marker() {
        let citations = vec![citation("a.pdf", &"x".repeat(500))];
        let block = build_context(&citations, 100);
        assert!(block.ends_with(TRUNCATION_MARKER));
        assert_eq!(
            block.chars().count(),
            100 + TRUNCATION_MARKER.chars().count()
        );
    }

    #[test]
    fn test_citation_serializes_for_downstream() {
        let c = citation("a.pdf", "text");
        let json = serde_json::to_value(&c).unwrap();
        assert_eq!(json["source_file"], "a.pdf");
        assert!(json["score"].is_null());
    }
}
