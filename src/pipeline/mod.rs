use std::fs;
use std::path::Path;

use tracing::info;

use crate::error::{RefineryError, Result};
use crate::extract::{HeuristicExtractor, ResumeExtractor};
use crate::format::DocumentFormat;
use crate::parser::parser_for;

pub mod features;
pub mod flatten;
pub mod normalize;

use features::{FeatureEngineer, FeatureRecord};
use flatten::Flattener;
use normalize::Normalizer;

/// Sequences parse → extract → normalize → flatten → feature-engineer over a
/// single document. Stages hold no state between runs; any stage error aborts
/// the run and nothing is persisted.
pub struct ResumePipeline {
    extractor: Box<dyn ResumeExtractor>,
    normalizer: Normalizer,
    flattener: Flattener,
    engineer: FeatureEngineer,
}

impl ResumePipeline {
    pub fn new() -> Self {
        Self {
            extractor: Box::new(HeuristicExtractor::new()),
            normalizer: Normalizer::new(),
            flattener: Flattener::new(),
            engineer: FeatureEngineer::new(),
        }
    }

    pub fn with_extractor(mut self, extractor: Box<dyn ResumeExtractor>) -> Self {
        self.extractor = extractor;
        self
    }

    pub fn with_normalizer(mut self, normalizer: Normalizer) -> Self {
        self.normalizer = normalizer;
        self
    }

    pub fn with_flattener(mut self, flattener: Flattener) -> Self {
        self.flattener = flattener;
        self
    }

    pub fn with_engineer(mut self, engineer: FeatureEngineer) -> Self {
        self.engineer = engineer;
        self
    }

    /// Run the full pipeline over raw document bytes.
    pub fn run(&self, bytes: &[u8], format: DocumentFormat) -> Result<FeatureRecord> {
        let span = tracing::info_span!("pipeline", format = %format);
        let _enter = span.enter();

        let parser = parser_for(format);
        let document = parser.parse(bytes)?;
        info!(
            sections = document.sections.len(),
            tables = document.tables.len(),
            "document parsed"
        );

        let text = document.plain_text();
        let record = self.extractor.extract(&text)?;
        info!(
            id = %record.id,
            work_entries = record.work.len(),
            education_entries = record.education.len(),
            "candidate record extracted"
        );

        let record = self.normalizer.normalize(record);
        let flat = self.flattener.flatten(record)?;
        let features = self.engineer.engineer(flat)?;
        info!(fields = features.len(), "feature record engineered");

        Ok(features)
    }

    /// Resolve and validate the format, then read the file and run.
    ///
    /// The format check comes first: an unsupported tag is rejected before
    /// the filesystem is touched.
    pub fn run_file(&self, input: &Path, format_tag: Option<&str>) -> Result<FeatureRecord> {
        let format = match format_tag {
            Some(tag) => DocumentFormat::from_tag(tag)?,
            None => DocumentFormat::from_path(input)?,
        };
        if !input.exists() {
            return Err(RefineryError::InputNotFound(input.to_path_buf()));
        }
        let bytes = fs::read(input)?;
        self.run(&bytes, format)
    }
}

impl Default for ResumePipeline {
    fn default() -> Self {
        Self::new()
    }
}

/// Serialize the feature record and write it to `path`. Rendering happens in
/// memory first, so a failure never leaves a partial output file behind.
pub fn write_features(features: &FeatureRecord, path: &Path) -> Result<()> {
    let rendered = features.to_pretty_json()?;
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }
    fs::write(path, rendered)?;
    info!(path = %path.display(), "feature record written");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unsupported_tag_rejected_before_filesystem_access() {
        let pipeline = ResumePipeline::new();
        // The path does not exist; an InputNotFound here would mean the file
        // was checked before the format tag.
        let err = pipeline
            .run_file(Path::new("no/such/resume.xlsx"), Some("xlsx"))
            .unwrap_err();
        assert!(matches!(err, RefineryError::UnsupportedFormat(_)));
    }

    #[test]
    fn unknown_extension_rejected_before_filesystem_access() {
        let pipeline = ResumePipeline::new();
        let err = pipeline
            .run_file(Path::new("no/such/resume.xlsx"), None)
            .unwrap_err();
        assert!(matches!(err, RefineryError::UnsupportedFormat(_)));
    }

    #[test]
    fn missing_input_is_reported_for_supported_formats() {
        let pipeline = ResumePipeline::new();
        let err = pipeline
            .run_file(Path::new("no/such/resume.pdf"), None)
            .unwrap_err();
        assert!(matches!(err, RefineryError::InputNotFound(_)));
    }
}
