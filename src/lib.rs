//! # lexrag — Regulatory reference-retrieval engine
//!
//! Indexes a corpus of regulatory source documents (PDF/DOCX), splits them
//! into overlapping deterministic chunks, embeds them, and serves top-k
//! similarity retrieval with provenance metadata. Retrieval results are
//! consumed downstream as citations grounding generated compliance findings.
//!
//! ## Architecture
//!
//! - **[`config`]** — Configuration loading, validation, and defaults
//! - **[`manifest`]** — CSV source manifest → filename-prefix metadata lookup
//! - **[`extract`]** — PDF/DOCX plain-text extraction with whitespace cleanup
//! - **[`chunker`]** — Deterministic sliding-window text chunking
//! - **[`embedder`]** — Text embedding via ONNX Runtime (multilingual-e5-small)
//! - **[`index`]** — SQLite + sqlite-vec persistent vector collection
//! - **[`retriever`]** — Query facade producing ranked citation records
//! - **[`ingest`]** — Batch index build over the reference directory

pub mod chunker;
pub mod config;
pub mod embedder;
pub mod extract;
pub mod index;
pub mod ingest;
pub mod manifest;
pub mod retriever;
