use tracing::{debug, warn};

use crate::error::{RefineryError, Result};
use crate::parser::{
    render_page_serialized, salvage_sections, DocumentParser, PageRenderer, ParsedDocument,
};

/// Text-oriented PDF adapter.
///
/// Layout-aware PDF parsing is an external collaborator concern; this adapter
/// performs the best-effort salvage used when no such collaborator is wired:
/// printable text runs become sections. When a [`PageRenderer`] is attached
/// (layout collaborators need a page image), every call into it is serialized
/// through the process-wide render lock.
pub struct PdfSectionParser {
    renderer: Option<Box<dyn PageRenderer>>,
}

impl PdfSectionParser {
    pub fn new() -> Self {
        Self { renderer: None }
    }

    pub fn with_renderer(renderer: Box<dyn PageRenderer>) -> Self {
        Self {
            renderer: Some(renderer),
        }
    }
}

impl Default for PdfSectionParser {
    fn default() -> Self {
        Self::new()
    }
}

impl DocumentParser for PdfSectionParser {
    fn parse(&self, bytes: &[u8]) -> Result<ParsedDocument> {
        debug!("PdfSectionParser: start bytes_len={}", bytes.len());
        if bytes.is_empty() {
            return Err(RefineryError::Parse("empty pdf document".to_string()));
        }

        if let Some(renderer) = &self.renderer {
            // The first page image feeds the layout collaborator; the render
            // backend is not safe for concurrent use.
            render_page_serialized(renderer.as_ref(), bytes, 0)
                .map_err(|e| RefineryError::Parse(format!("page rendering failed: {e}")))?;
        }

        let sections = salvage_sections(bytes);
        if sections.is_empty() {
            warn!("PdfSectionParser: no text salvaged from {} bytes", bytes.len());
        }
        Ok(ParsedDocument {
            sections,
            tables: Vec::new(),
        })
    }
}
