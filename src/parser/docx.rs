use once_cell::sync::Lazy;
use regex::Regex;
use tracing::{debug, info, warn};

use crate::error::{RefineryError, Result};
use crate::parser::{salvage_sections, DocumentParser, DocumentSection, ParsedDocument};

static TABLE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?s)<w:tbl[ >].*?</w:tbl>").unwrap());
static ROW_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?s)<w:tr[ >].*?</w:tr>").unwrap());
static CELL_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?s)<w:tc[ >].*?</w:tc>").unwrap());
static PARA_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?s)<w:p[ >].*?</w:p>").unwrap());
static TEXT_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"<w:t[^>]*>([^<]*)</w:t>").unwrap());
static STYLE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r#"<w:pStyle[^>]*w:val="([^"]+)""#).unwrap());

/// WordprocessingML adapter: `<w:t>` runs are concatenated per paragraph into
/// styled sections and `<w:tr>` rows become table content. Inputs without any
/// `<w:t>` markup fall back to plain text salvage.
pub struct DocxSectionParser;

impl DocxSectionParser {
    pub fn new() -> Self {
        Self
    }
}

impl Default for DocxSectionParser {
    fn default() -> Self {
        Self::new()
    }
}

fn collect_text(fragment: &str) -> String {
    TEXT_RE
        .captures_iter(fragment)
        .map(|c| c[1].to_string())
        .collect::<Vec<_>>()
        .join("")
        .trim()
        .to_string()
}

impl DocumentParser for DocxSectionParser {
    fn parse(&self, bytes: &[u8]) -> Result<ParsedDocument> {
        debug!("DocxSectionParser: start bytes_len={}", bytes.len());
        if bytes.is_empty() {
            return Err(RefineryError::Parse("empty docx document".to_string()));
        }

        let body = String::from_utf8_lossy(bytes);
        if !body.contains("<w:t") {
            warn!("DocxSectionParser: no WordprocessingML markup; falling back to text salvage");
            return Ok(ParsedDocument {
                sections: salvage_sections(bytes),
                tables: Vec::new(),
            });
        }

        // Tables are lifted out first so their cell text is not repeated in
        // the paragraph sections.
        let mut tables = Vec::new();
        for table_match in TABLE_RE.find_iter(&body) {
            let mut rows = Vec::new();
            for row_match in ROW_RE.find_iter(table_match.as_str()) {
                let cells: Vec<String> = CELL_RE
                    .find_iter(row_match.as_str())
                    .map(|cell| collect_text(cell.as_str()))
                    .collect();
                let row = cells.join(";");
                if !row.trim_matches(';').is_empty() {
                    rows.push(row);
                }
            }
            if !rows.is_empty() {
                tables.push(rows);
            }
        }
        let without_tables = TABLE_RE.replace_all(&body, "");

        let mut sections = Vec::new();
        for para_match in PARA_RE.find_iter(&without_tables) {
            let text = collect_text(para_match.as_str());
            if text.is_empty() {
                continue;
            }
            let style = STYLE_RE
                .captures(para_match.as_str())
                .map(|c| c[1].to_string())
                .unwrap_or_else(|| "Normal".to_string());
            sections.push(DocumentSection { text, style });
        }

        info!(
            "DocxSectionParser: extracted sections={} tables={}",
            sections.len(),
            tables.len()
        );
        Ok(ParsedDocument { sections, tables })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn para(style: Option<&str>, text: &str) -> String {
        let style_xml = style
            .map(|s| format!("<w:pPr><w:pStyle w:val=\"{s}\"/></w:pPr>"))
            .unwrap_or_default();
        format!("<w:p >{style_xml}<w:r><w:t>{text}</w:t></w:r></w:p>")
    }

    #[test]
    fn paragraphs_become_styled_sections() {
        let xml = format!(
            "<w:document>{}{}</w:document>",
            para(Some("Heading1"), "Ada Lovelace"),
            para(None, "work: Analytical Engines (1837-1843)")
        );
        let doc = DocxSectionParser::new().parse(xml.as_bytes()).unwrap();

        assert_eq!(doc.sections.len(), 2);
        assert_eq!(doc.sections[0].style, "Heading1");
        assert_eq!(doc.sections[0].text, "Ada Lovelace");
        assert_eq!(doc.sections[1].style, "Normal");
    }

    #[test]
    fn table_rows_are_captured_and_not_duplicated() {
        let xml = "<w:document>\
            <w:tbl ><w:tr ><w:tc ><w:p ><w:r><w:t>skill</w:t></w:r></w:p></w:tc>\
            <w:tc ><w:p ><w:r><w:t>years</w:t></w:r></w:p></w:tc></w:tr></w:tbl>\
            <w:p ><w:r><w:t>name: Ada</w:t></w:r></w:p>\
            </w:document>";
        let doc = DocxSectionParser::new().parse(xml.as_bytes()).unwrap();

        assert_eq!(doc.tables, vec![vec!["skill;years".to_string()]]);
        assert_eq!(doc.sections.len(), 1);
        assert_eq!(doc.sections[0].text, "name: Ada");
    }

    #[test]
    fn plain_text_input_falls_back_to_salvage() {
        let doc = DocxSectionParser::new()
            .parse(b"name: Ada\n\nwork: Engines (1840-1850)\n")
            .unwrap();
        assert_eq!(doc.sections.len(), 2);
    }
}
