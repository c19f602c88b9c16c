//! Plain-text extraction from reference documents.
//!
//! Two container formats are supported, dispatched by file extension:
//! PDF via `lopdf` (per-page text joined with newlines, a page with no
//! extractable text contributes an empty string) and DOCX via `docx-rs`
//! (top-level paragraph text in document order). Trailing horizontal
//! whitespace before newlines is collapsed in both cases.

use std::path::Path;
use std::sync::LazyLock;

use anyhow::{Context, Result, bail};
use docx_rs::{DocumentChild, ParagraphChild, RunChild, read_docx};
use regex::Regex;

static TRAILING_WS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[ \t]+\n").expect("valid regex literal"));

/// Whether a file has one of the supported reference extensions.
///
/// The directory scan filters on this before calling [`extract_text`];
/// anything else is skipped upstream.
#[must_use]
pub fn supported_extension(path: &Path) -> bool {
    matches!(
        path.extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase)
            .as_deref(),
        Some("pdf" | "docx")
    )
}

/// Extract normalized plain text from a reference document.
pub fn extract_text(path: &Path) -> Result<String> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase)
        .unwrap_or_default();

    let text = match ext.as_str() {
        "pdf" => extract_pdf(path)?,
        "docx" => extract_docx(path)?,
        other => bail!("unsupported reference extension: {other:?}"),
    };

    Ok(collapse_trailing_whitespace(&text))
}

/// Per-page extraction. An unreadable page contributes an empty string
/// rather than failing the whole document.
fn extract_pdf(path: &Path) -> Result<String> {
    let document = lopdf::Document::load(path)
        .with_context(|| format!("failed to load pdf: {}", path.display()))?;

    let pages: Vec<String> = document
        .get_pages()
        .keys()
        .map(|&page_no| document.extract_text(&[page_no]).unwrap_or_default())
        .collect();

    Ok(pages.join("\n"))
}

/// Concatenate top-level paragraph text in document order.
fn extract_docx(path: &Path) -> Result<String> {
    let buf =
        std::fs::read(path).with_context(|| format!("failed to read docx: {}", path.display()))?;
    let docx = read_docx(&buf)
        .map_err(|e| anyhow::anyhow!("failed to parse docx {}: {e:?}", path.display()))?;

    let mut paragraphs = Vec::new();
    for child in &docx.document.children {
        if let DocumentChild::Paragraph(paragraph) = child {
            let mut line = String::new();
            for pc in &paragraph.children {
                if let ParagraphChild::Run(run) = pc {
                    for rc in &run.children {
                        if let RunChild::Text(text) = rc {
                            line.push_str(&text.text);
                        }
                    }
                }
            }
            paragraphs.push(line);
        }
    }

    Ok(paragraphs.join("\n"))
}

/// Collapse spaces and tabs immediately preceding a newline.
pub(crate) fn collapse_trailing_whitespace(text: &str) -> String {
    TRAILING_WS.replace_all(text, "\n").into_owned()
}
