//! Source manifest loading.
//!
//! The manifest is a CSV catalog (`category`, `doc_type`, `url`, one row per
//! reference source). Reference filenames are expected to start with the
//! sanitized prefix `"<category>__<doc_type>__"`; the loader builds an
//! ordered prefix table so metadata association is deterministic regardless
//! of directory iteration order.

use std::path::Path;

use anyhow::{Context, Result};
use serde::Deserialize;
use tracing::{info, warn};

/// One row of the source manifest.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ManifestEntry {
    pub category: String,
    pub doc_type: String,
    pub url: String,
}

/// Prefix table derived from the manifest.
///
/// Entries are held longest-prefix-first (ties broken lexicographically), so
/// [`Manifest::lookup`] always resolves the most specific match.
#[derive(Debug, Default)]
pub struct Manifest {
    entries: Vec<(String, ManifestEntry)>,
}

/// Derive the filename prefix for a manifest entry: `"<category>__<doc_type>__"`
/// with spaces normalized to underscores. Case is preserved.
pub fn derive_prefix(category: &str, doc_type: &str) -> String {
    format!("{category}__{doc_type}__").replace(' ', "_")
}

impl Manifest {
    /// Load the manifest from a CSV file.
    ///
    /// A missing file is not an error: indexing proceeds without metadata
    /// enrichment. A present file with missing required columns is a fatal
    /// configuration error.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();

        if !path.exists() {
            warn!(
                "Manifest not found at {}, indexing without source metadata",
                path.display()
            );
            return Ok(Self::default());
        }

        let mut reader = csv::Reader::from_path(path)
            .with_context(|| format!("failed to open manifest: {}", path.display()))?;

        let mut entries = Vec::new();
        for row in reader.deserialize() {
            let mut entry: ManifestEntry = row.with_context(|| {
                format!(
                    "manifest {} must have columns category, doc_type, url",
                    path.display()
                )
            })?;
            entry.category = entry.category.trim().to_string();
            entry.doc_type = entry.doc_type.trim().to_string();
            entry.url = entry.url.trim().to_string();

            let prefix = derive_prefix(&entry.category, &entry.doc_type);
            entries.push((prefix, entry));
        }

        // Longest prefix wins on overlapping categories; lexicographic
        // tie-break keeps the order stable across loads.
        entries.sort_by(|(a, _), (b, _)| b.len().cmp(&a.len()).then_with(|| a.cmp(b)));

        info!("Loaded {} manifest entries", entries.len());
        Ok(Self { entries })
    }

    /// Resolve the metadata entry for a reference filename, if any prefix
    /// matches.
    #[must_use]
    pub fn lookup(&self, source_file: &str) -> Option<&ManifestEntry> {
        self.entries
            .iter()
            .find(|(prefix, _)| source_file.starts_with(prefix.as_str()))
            .map(|(_, entry)| entry)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
