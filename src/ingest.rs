//! Batch index build over the reference directory.
//!
//! One run rebuilds the collection from scratch: scan the flat reference
//! directory, extract text, attach manifest metadata, chunk, embed, upsert.
//! Chunk ids are `"<source_file>_<chunk_index>"`, so repeated runs over an
//! unchanged corpus converge on identical records.

use std::fmt;
use std::path::Path;

use anyhow::{Context, Result, bail};
use tracing::{info, warn};

use crate::chunker;
use crate::config::Config;
use crate::embedder::Embedder;
use crate::extract;
use crate::index::VectorIndex;
use crate::index::records::RecordMetadata;
use crate::manifest::Manifest;

/// Human-readable outcome of one index build.
#[derive(Debug, PartialEq, Eq)]
pub struct BuildSummary {
    pub chunks_indexed: usize,
    pub documents_processed: usize,
}

impl fmt::Display for BuildSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Indexed {} chunks from {} source documents.",
            self.chunks_indexed, self.documents_processed
        )
    }
}

/// A reference document after extraction, before chunking.
struct RawDocument {
    source_file: String,
    text: String,
    metadata: RecordMetadata,
}

pub struct IndexBuilder<'a, E: Embedder + ?Sized> {
    index: &'a mut VectorIndex,
    embedder: &'a E,
    config: &'a Config,
}

impl<'a, E: Embedder + ?Sized> IndexBuilder<'a, E> {
    pub fn new(index: &'a mut VectorIndex, embedder: &'a E, config: &'a Config) -> Self {
        Self {
            index,
            embedder,
            config,
        }
    }

    /// Build the index from the configured reference directory.
    ///
    /// Fatal if the directory is absent or holds no supported documents; a
    /// single unreadable file only degrades to an empty-text document.
    pub fn build(&mut self) -> Result<BuildSummary> {
        let manifest = Manifest::load(&self.config.manifest_path)?;
        let documents = self.load_documents(&manifest)?;

        if documents.is_empty() {
            bail!(
                "no reference documents found in {}; populate the reference directory first",
                self.config.reference_dir
            );
        }

        let mut ids = Vec::new();
        let mut texts = Vec::new();
        let mut metadatas = Vec::new();

        for doc in &documents {
            for chunk in chunker::split_text(
                &doc.text,
                self.config.chunk_size,
                self.config.chunk_overlap,
            ) {
                ids.push(format!("{}_{}", doc.source_file, chunk.index));
                texts.push(chunk.text);
                metadatas.push(doc.metadata.clone());
            }
        }

        info!(
            "Embedding {} chunks from {} documents",
            ids.len(),
            documents.len()
        );
        let text_refs: Vec<&str> = texts.iter().map(String::as_str).collect();
        let vectors = self.embedder.embed_batch(&text_refs)?;

        self.index.upsert(&ids, &texts, &vectors, &metadatas)?;

        Ok(BuildSummary {
            chunks_indexed: ids.len(),
            documents_processed: documents.len(),
        })
    }

    /// Scan the reference directory in sorted filename order and extract
    /// each supported document.
    fn load_documents(&self, manifest: &Manifest) -> Result<Vec<RawDocument>> {
        let dir = Path::new(&self.config.reference_dir);
        let entries = std::fs::read_dir(dir)
            .with_context(|| format!("reference directory missing: {}", dir.display()))?;

        let mut paths: Vec<_> = entries
            .filter_map(|e| e.ok())
            .map(|e| e.path())
            .filter(|p| p.is_file() && extract::supported_extension(p))
            .collect();
        paths.sort();

        let mut documents = Vec::new();
        for path in paths {
            let source_file = path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default();

            // Unreadable files contribute an empty-text document (zero
            // chunks) instead of aborting the batch.
            let text = match extract::extract_text(&path) {
                Ok(text) => text,
                Err(e) => {
                    warn!("Failed to extract {source_file}, indexing without text: {e:#}");
                    String::new()
                }
            };

            let metadata = match manifest.lookup(&source_file) {
                Some(entry) => RecordMetadata {
                    source_file: source_file.clone(),
                    category: entry.category.clone(),
                    doc_type: entry.doc_type.clone(),
                    url: entry.url.clone(),
                },
                None => RecordMetadata {
                    source_file: source_file.clone(),
                    ..Default::default()
                },
            };

            documents.push(RawDocument {
                source_file,
                text,
                metadata,
            });
        }

        Ok(documents)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::embedder::mock::MockEmbedder;
    use docx_rs::{Docx, Paragraph, Run};
    use std::fs;

    fn write_docx(path: &Path, text: &str) {
        let file = fs::File::create(path).unwrap();
        Docx::new()
            .add_paragraph(Paragraph::new().add_run(Run::new().add_text(text)))
            .build()
            .pack(file)
            .unwrap();
    }

    fn test_config(dir: &Path) -> Config {
        let mut config = Config::default();
        config.reference_dir = dir.join("refs").to_string_lossy().into_owned();
        config.manifest_path = dir.join("sources_manifest.csv").to_string_lossy().into_owned();
        config.chunk_size = 300;
        config.chunk_overlap = 50;
        config
    }

    #[test]
    fn test_build_fails_on_missing_directory() {
        let dir = tempfile::tempdir().unwrap();
        let config = test_config(dir.path());

        let mut index = VectorIndex::open_in_memory(64).unwrap();
        let embedder = MockEmbedder::new(64);
        let mut builder = IndexBuilder::new(&mut index, &embedder, &config);

        assert!(builder.build().is_err());
    }

    #[test]
    fn test_build_fails_on_empty_corpus() {
        let dir = tempfile::tempdir().unwrap();
        let config = test_config(dir.path());
        fs::create_dir_all(&config.reference_dir).unwrap();
        // Unsupported extensions do not count as usable documents
        fs::write(Path::new(&config.reference_dir).join("notes.txt"), "text").unwrap();

        let mut index = VectorIndex::open_in_memory(64).unwrap();
        let embedder = MockEmbedder::new(64);
        let mut builder = IndexBuilder::new(&mut index, &embedder, &config);

        let err = builder.build().unwrap_err();
        assert!(err.to_string().contains("no reference documents"));
    }

    #[test]
    fn test_build_indexes_manifest_metadata() {
        let dir = tempfile::tempdir().unwrap();
        let config = test_config(dir.path());
        fs::create_dir_all(&config.reference_dir).unwrap();

        fs::write(
            &config.manifest_path,
            "category,doc_type,url\nTemplates,Articles of Association,http://example/aoa.pdf\n",
        )
        .unwrap();
        write_docx(
            &Path::new(&config.reference_dir).join("Templates__Articles_of_Association__aoa.docx"),
            "ADGM Courts have exclusive jurisdiction.",
        );

        let mut index = VectorIndex::open_in_memory(64).unwrap();
        let embedder = MockEmbedder::new(64);
        let summary = IndexBuilder::new(&mut index, &embedder, &config)
            .build()
            .unwrap();

        assert_eq!(summary.chunks_indexed, 1);
        assert_eq!(summary.documents_processed, 1);
        assert_eq!(
            summary.to_string(),
            "Indexed 1 chunks from 1 source documents."
        );

        let hits = index
            .query(
                &embedder
                    .embed("ADGM Courts have exclusive jurisdiction.")
                    .unwrap(),
                1,
            )
            .unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(
            hits[0].chunk_id,
            "Templates__Articles_of_Association__aoa.docx_0"
        );
        assert_eq!(hits[0].metadata.category, "Templates");
        assert_eq!(hits[0].metadata.doc_type, "Articles of Association");
        assert_eq!(hits[0].metadata.url, "http://example/aoa.pdf");
    }

    #[test]
    fn test_build_without_manifest_keeps_source_file_only() {
        let dir = tempfile::tempdir().unwrap();
        let config = test_config(dir.path());
        fs::create_dir_all(&config.reference_dir).unwrap();
        write_docx(
            &Path::new(&config.reference_dir).join("orphan.docx"),
            "Unlisted reference document.",
        );

        let mut index = VectorIndex::open_in_memory(64).unwrap();
        let embedder = MockEmbedder::new(64);
        IndexBuilder::new(&mut index, &embedder, &config)
            .build()
            .unwrap();

        let hits = index
            .query(
                &embedder.embed("Unlisted reference document.").unwrap(),
                1,
            )
            .unwrap();
        assert_eq!(hits[0].metadata.source_file, "orphan.docx");
        assert_eq!(hits[0].metadata.category, "");
        assert_eq!(hits[0].metadata.url, "");
    }

    #[test]
    fn test_unreadable_file_does_not_abort_batch() {
        let dir = tempfile::tempdir().unwrap();
        let config = test_config(dir.path());
        fs::create_dir_all(&config.reference_dir).unwrap();

        // A broken PDF next to a valid DOCX
        fs::write(
            Path::new(&config.reference_dir).join("broken.pdf"),
            "not a pdf",
        )
        .unwrap();
        write_docx(
            &Path::new(&config.reference_dir).join("good.docx"),
            "Readable reference text.",
        );

        let mut index = VectorIndex::open_in_memory(64).unwrap();
        let embedder = MockEmbedder::new(64);
        let summary = IndexBuilder::new(&mut index, &embedder, &config)
            .build()
            .unwrap();

        // Both files count as processed; only the readable one yields chunks
        assert_eq!(summary.documents_processed, 2);
        assert_eq!(summary.chunks_indexed, 1);
    }

    #[test]
    fn test_rebuild_is_convergent() {
        let dir = tempfile::tempdir().unwrap();
        let config = test_config(dir.path());
        fs::create_dir_all(&config.reference_dir).unwrap();
        write_docx(
            &Path::new(&config.reference_dir).join("doc.docx"),
            &"Convergence paragraph. ".repeat(40),
        );

        let mut index = VectorIndex::open_in_memory(64).unwrap();
        let embedder = MockEmbedder::new(64);

        let first = IndexBuilder::new(&mut index, &embedder, &config)
            .build()
            .unwrap();
        let count_after_first = index.count().unwrap();

        let second = IndexBuilder::new(&mut index, &embedder, &config)
            .build()
            .unwrap();

        assert_eq!(first, second);
        assert_eq!(index.count().unwrap(), count_after_first);
    }
}
