use std::path::Path;

use crate::error::{RefineryError, Result};

/// Document formats the pipeline accepts. The set is closed: anything else
/// must be rejected before the input file is touched.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentFormat {
    Pdf,
    Docx,
}

impl DocumentFormat {
    /// Resolve a user-supplied format tag (case-insensitive).
    pub fn from_tag(tag: &str) -> Result<Self> {
        match tag.trim().to_lowercase().as_str() {
            "pdf" => Ok(DocumentFormat::Pdf),
            "docx" => Ok(DocumentFormat::Docx),
            other => Err(RefineryError::UnsupportedFormat(other.to_string())),
        }
    }

    /// Resolve the format from a file extension.
    pub fn from_path(path: &Path) -> Result<Self> {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .ok_or_else(|| RefineryError::UnsupportedFormat(path.display().to_string()))?;
        Self::from_tag(ext)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            DocumentFormat::Pdf => "pdf",
            DocumentFormat::Docx => "docx",
        }
    }
}

impl std::fmt::Display for DocumentFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_tags_resolve() {
        assert_eq!(DocumentFormat::from_tag("pdf").unwrap(), DocumentFormat::Pdf);
        assert_eq!(DocumentFormat::from_tag("DOCX").unwrap(), DocumentFormat::Docx);
    }

    #[test]
    fn unknown_tag_is_rejected() {
        let err = DocumentFormat::from_tag("xlsx").unwrap_err();
        assert!(matches!(err, RefineryError::UnsupportedFormat(_)));
    }

    #[test]
    fn extension_resolution() {
        let fmt = DocumentFormat::from_path(Path::new("cv/resume.docx")).unwrap();
        assert_eq!(fmt, DocumentFormat::Docx);
        assert!(DocumentFormat::from_path(Path::new("resume")).is_err());
    }
}
