use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::sync::Mutex;

use crate::error::Result;
use crate::format::DocumentFormat;

pub mod docx;
pub mod pdf;

/// One extracted span of document text with its style tag.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentSection {
    pub text: String,
    pub style: String,
}

/// Parser output: ordered text sections plus ordered table contents, each
/// table an ordered sequence of row strings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ParsedDocument {
    pub sections: Vec<DocumentSection>,
    pub tables: Vec<Vec<String>>,
}

impl ParsedDocument {
    /// Concatenate the non-blank text sections into the extractor's input.
    pub fn plain_text(&self) -> String {
        self.sections
            .iter()
            .map(|s| s.text.trim())
            .filter(|t| !t.is_empty())
            .collect::<Vec<_>>()
            .join("\n\n")
    }
}

/// Format-specific parser adapter contract.
pub trait DocumentParser: Send + Sync {
    fn parse(&self, bytes: &[u8]) -> Result<ParsedDocument>;
}

/// Obtain the parser adapter for a supported format.
pub fn parser_for(format: DocumentFormat) -> Box<dyn DocumentParser> {
    match format {
        DocumentFormat::Pdf => Box::new(pdf::PdfSectionParser::new()),
        DocumentFormat::Docx => Box::new(docx::DocxSectionParser::new()),
    }
}

/// Renders one page of a document to an image. Backends wrapping native
/// rasterizers are not safe for concurrent use; callers must go through
/// [`render_page_serialized`].
pub trait PageRenderer: Send + Sync {
    fn render(&self, bytes: &[u8], page: usize) -> anyhow::Result<Vec<u8>>;
}

// Process-wide: at most one in-flight call into a rendering backend.
static PAGE_RENDER_LOCK: Lazy<Mutex<()>> = Lazy::new(|| Mutex::new(()));

/// Invoke a renderer while holding the process-wide render lock. The lock is
/// released as soon as the call returns; it is never held across stages.
pub fn render_page_serialized(
    renderer: &dyn PageRenderer,
    bytes: &[u8],
    page: usize,
) -> anyhow::Result<Vec<u8>> {
    let _guard = PAGE_RENDER_LOCK
        .lock()
        .unwrap_or_else(|poisoned| poisoned.into_inner());
    renderer.render(bytes, page)
}

/// Best-effort section salvage shared by the binary-format adapters: lossy
/// UTF-8 decode, control characters dropped, blank lines split paragraphs.
/// Lines with no alphanumeric content are treated as binary noise.
pub(crate) fn salvage_sections(bytes: &[u8]) -> Vec<DocumentSection> {
    let text = String::from_utf8_lossy(bytes);
    let mut sections = Vec::new();
    let mut current = String::new();

    let flush = |current: &mut String, sections: &mut Vec<DocumentSection>| {
        if !current.trim().is_empty() {
            sections.push(DocumentSection {
                text: current.trim().to_string(),
                style: "text".to_string(),
            });
        }
        current.clear();
    };

    for line in text.lines() {
        let clean: String = line
            .chars()
            .filter(|c| !c.is_control() && *c != '\u{FFFD}')
            .collect();
        let clean = clean.trim();
        if clean.is_empty() || !clean.chars().any(|c| c.is_alphanumeric()) {
            flush(&mut current, &mut sections);
            continue;
        }
        if !current.is_empty() {
            current.push('\n');
        }
        current.push_str(clean);
    }
    flush(&mut current, &mut sections);
    sections
}
