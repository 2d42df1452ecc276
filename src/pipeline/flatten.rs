use serde_json::{Map, Value};
use tracing::debug;

use crate::error::{RefineryError, Result};
use crate::extract::CandidateRecord;
use crate::lookup::{DegreeLookup, StaticDegreeTable};

/// The loosely structured working record produced by flattening. Keys keep
/// insertion order so later filtering is deterministic.
#[derive(Debug, Clone, Default)]
pub struct FlattenedRecord {
    pub fields: Map<String, Value>,
}

impl FlattenedRecord {
    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.fields.get(key).and_then(Value::as_str)
    }
}

/// String form of a loose scalar: strings verbatim, other values via their
/// JSON rendering (a numeric degree code round-trips as its digits).
pub(crate) fn plain_string(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Stage 2: flattens the nested record into scalar top-level fields and
/// resolves the degree code through the external naming lookup.
///
/// `education` is relocated under `education_history` so the repeated group
/// cannot be mistaken for a flattened scalar downstream; `work` stays nested
/// and is discarded by the suffix filter at the end of the pipeline.
pub struct Flattener {
    degrees: Box<dyn DegreeLookup>,
}

impl Flattener {
    pub fn new() -> Self {
        Self {
            degrees: Box::new(StaticDegreeTable),
        }
    }

    pub fn with_degree_lookup(degrees: Box<dyn DegreeLookup>) -> Self {
        Self { degrees }
    }

    pub fn flatten(&self, record: CandidateRecord) -> Result<FlattenedRecord> {
        let CandidateRecord {
            id,
            raw_text,
            basic,
            work,
            education,
            is_deleted,
        } = record;

        let corporation_name = basic
            .get("corporation_name")
            .and_then(Value::as_str)
            .unwrap_or("")
            .to_string();

        let degree = match basic.get("degree") {
            Some(code) => {
                let code = plain_string(code);
                self.degrees
                    .degree_name(&code)
                    .map_err(|e| RefineryError::Lookup(format!("degree name for '{code}': {e}")))?
            }
            None => String::new(),
        };

        let mut fields = Map::new();
        fields.insert("resume_id".to_string(), Value::String(id));
        fields.insert("raw_text".to_string(), Value::String(raw_text));
        fields.insert("basic".to_string(), Value::Object(basic));
        fields.insert(
            "corporation_name".to_string(),
            Value::String(corporation_name),
        );
        fields.insert("degree".to_string(), Value::String(degree));
        fields.insert("work".to_string(), serde_json::to_value(&work)?);
        fields.insert(
            "education_history".to_string(),
            serde_json::to_value(&education)?,
        );
        fields.insert("is_deleted".to_string(), Value::Bool(is_deleted));

        debug!(keys = fields.len(), "record flattened");
        Ok(FlattenedRecord { fields })
    }
}

impl Default for Flattener {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extract::EducationEntry;
    use serde_json::json;

    fn record_with_basic(basic: Map<String, Value>) -> CandidateRecord {
        let mut record = CandidateRecord::new("r1".into(), "raw".into());
        record.basic = basic;
        record
    }

    #[test]
    fn promotes_scalars_and_resolves_degree() {
        let mut basic = Map::new();
        basic.insert("corporation_name".into(), json!("Blue Moon Labs"));
        basic.insert("degree".into(), json!("7"));

        let flat = Flattener::new()
            .flatten(record_with_basic(basic))
            .unwrap();

        assert_eq!(flat.get_str("corporation_name"), Some("Blue Moon Labs"));
        assert_eq!(flat.get_str("degree"), Some("Master"));
        assert_eq!(flat.get_str("resume_id"), Some("r1"));
    }

    #[test]
    fn missing_scalars_default_to_empty() {
        let flat = Flattener::new()
            .flatten(record_with_basic(Map::new()))
            .unwrap();

        assert_eq!(flat.get_str("corporation_name"), Some(""));
        assert_eq!(flat.get_str("degree"), Some(""));
    }

    #[test]
    fn education_is_relocated_not_dropped() {
        let mut record = record_with_basic(Map::new());
        record.education.insert(
            "0".into(),
            EducationEntry {
                school_name: "Imperial College".into(),
                ..Default::default()
            },
        );

        let flat = Flattener::new().flatten(record).unwrap();

        assert!(!flat.fields.contains_key("education"));
        let history = flat.fields["education_history"].as_object().unwrap();
        assert_eq!(history["0"]["school_name"], "Imperial College");
    }

    #[test]
    fn lookup_failure_surfaces_as_typed_error() {
        struct FailingLookup;
        impl DegreeLookup for FailingLookup {
            fn degree_name(&self, _code: &str) -> anyhow::Result<String> {
                anyhow::bail!("service unavailable")
            }
        }

        let mut basic = Map::new();
        basic.insert("degree".into(), json!("7"));
        let err = Flattener::with_degree_lookup(Box::new(FailingLookup))
            .flatten(record_with_basic(basic))
            .unwrap_err();
        assert!(matches!(err, RefineryError::Lookup(_)));
    }
}
