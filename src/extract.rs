use indexmap::IndexMap;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::debug;
use uuid::Uuid;

use crate::error::Result;

/// One employment entry of the repeated work group.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct WorkEntry {
    pub corporation_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub position_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start_time: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end_time: Option<String>,
}

/// One entry of the repeated education group.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EducationEntry {
    pub school_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub degree: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start_time: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end_time: Option<String>,
}

/// The nested working record threaded through the pipeline.
///
/// `work` and `education` are keyed by insertion-ordered string indices; the
/// last key in iteration order is the most recent entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CandidateRecord {
    pub id: String,
    pub raw_text: String,
    pub basic: Map<String, Value>,
    pub work: IndexMap<String, WorkEntry>,
    pub education: IndexMap<String, EducationEntry>,
    pub is_deleted: bool,
}

impl CandidateRecord {
    pub fn new(id: String, raw_text: String) -> Self {
        Self {
            id,
            raw_text,
            basic: Map::new(),
            work: IndexMap::new(),
            education: IndexMap::new(),
            is_deleted: false,
        }
    }

    /// Most recent job: the last entry in iteration order.
    pub fn latest_work(&self) -> Option<&WorkEntry> {
        self.work.values().last()
    }

    /// Most recent or highest education entry.
    pub fn latest_education(&self) -> Option<&EducationEntry> {
        self.education.values().last()
    }
}

/// Turns raw concatenated document text into the nested candidate record.
pub trait ResumeExtractor: Send + Sync {
    fn extract(&self, text: &str) -> Result<CandidateRecord>;
}

static LABEL_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)^\s*(name|birth|degree|work|education)\s*[:：]\s*(.+)$").unwrap());
static SPAN_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(\d{4})\s*[-–~]\s*(\d{4})?").unwrap());
static ENTRY_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(?P<head>.+?)(?:\s+-\s+(?P<detail>[^(（]+?))?\s*(?:[(（](?P<span>[^)）]*)[)）])?\s*$")
        .unwrap()
});

/// Default extractor: scans labeled lines (`name:`, `birth:`, `degree:`,
/// `work:`, `education:`) out of the parsed text. Repeated `work:` and
/// `education:` lines append entries in encounter order, so the last line
/// wins the "latest entry" position. Unlabeled text is ignored.
pub struct HeuristicExtractor;

impl HeuristicExtractor {
    pub fn new() -> Self {
        Self
    }
}

impl Default for HeuristicExtractor {
    fn default() -> Self {
        Self::new()
    }
}

struct ParsedEntry {
    head: String,
    detail: Option<String>,
    start: Option<String>,
    end: Option<String>,
}

fn parse_entry(value: &str) -> Option<ParsedEntry> {
    let caps = ENTRY_RE.captures(value.trim())?;
    let head = caps.name("head")?.as_str().trim().to_string();
    if head.is_empty() {
        return None;
    }
    let detail = caps
        .name("detail")
        .map(|m| m.as_str().trim().to_string())
        .filter(|d| !d.is_empty());
    let (start, end) = caps
        .name("span")
        .and_then(|span| SPAN_RE.captures(span.as_str()))
        .map(|span_caps| {
            (
                span_caps.get(1).map(|m| m.as_str().to_string()),
                span_caps.get(2).map(|m| m.as_str().to_string()),
            )
        })
        .unwrap_or((None, None));
    Some(ParsedEntry {
        head,
        detail,
        start,
        end,
    })
}

impl ResumeExtractor for HeuristicExtractor {
    fn extract(&self, text: &str) -> Result<CandidateRecord> {
        let mut record = CandidateRecord::new(Uuid::new_v4().to_string(), text.to_string());

        for line in text.lines() {
            let Some(caps) = LABEL_RE.captures(line) else {
                continue;
            };
            let label = caps[1].to_lowercase();
            let value = caps[2].trim();

            match label.as_str() {
                "name" | "birth" | "degree" => {
                    record
                        .basic
                        .insert(label, Value::String(value.to_string()));
                }
                "work" => {
                    if let Some(entry) = parse_entry(value) {
                        let index = record.work.len().to_string();
                        record.work.insert(
                            index,
                            WorkEntry {
                                corporation_name: entry.head,
                                position_name: entry.detail,
                                start_time: entry.start,
                                end_time: entry.end,
                            },
                        );
                    }
                }
                "education" => {
                    if let Some(entry) = parse_entry(value) {
                        let index = record.education.len().to_string();
                        record.education.insert(
                            index,
                            EducationEntry {
                                school_name: entry.head,
                                degree: entry.detail,
                                start_time: entry.start,
                                end_time: entry.end,
                            },
                        );
                    }
                }
                _ => {}
            }
        }

        debug!(
            id = %record.id,
            basic = record.basic.len(),
            work = record.work.len(),
            education = record.education.len(),
            "extracted candidate record"
        );
        Ok(record)
    }
}
