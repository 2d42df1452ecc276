use chrono::{Datelike, Local};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;
use serde_json::{Map, Value};
use tracing::debug;

use crate::config::DEFAULT_FALLBACK_BIRTH_YEAR;
use crate::error::{RefineryError, Result};
use crate::lookup::{CorporationTagger, KeywordCorpTagger, SimpleTokenizer, TermTokenizer};
use crate::pipeline::flatten::{plain_string, FlattenedRecord};

/// The recognized field-name suffix tags. Only fields carrying one of these
/// (or the allow-listed identifier) survive into the output record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldSuffix {
    Feature,
    Tokens,
    Nested,
    Date,
    Integer,
    Float,
    LongTokens,
    Keyword,
    Id,
}

impl FieldSuffix {
    pub const ALL: [FieldSuffix; 9] = [
        FieldSuffix::Feature,
        FieldSuffix::Tokens,
        FieldSuffix::Nested,
        FieldSuffix::Date,
        FieldSuffix::Integer,
        FieldSuffix::Float,
        FieldSuffix::LongTokens,
        FieldSuffix::Keyword,
        FieldSuffix::Id,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            FieldSuffix::Feature => "_fea",
            FieldSuffix::Tokens => "_tks",
            FieldSuffix::Nested => "_nst",
            FieldSuffix::Date => "_dt",
            FieldSuffix::Integer => "_int",
            FieldSuffix::Float => "_flt",
            FieldSuffix::LongTokens => "_ltks",
            FieldSuffix::Keyword => "_kwd",
            FieldSuffix::Id => "_id",
        }
    }

    /// Classify a field name by its suffix tag.
    pub fn of(name: &str) -> Option<FieldSuffix> {
        Self::ALL
            .into_iter()
            .find(|suffix| name.ends_with(suffix.as_str()))
    }
}

/// A field name validated against the suffix convention. The only way into a
/// [`FeatureRecord`] is through this type or the identifier allow-list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldName {
    name: String,
    suffix: FieldSuffix,
}

impl FieldName {
    pub fn parse(name: &str) -> Option<Self> {
        FieldSuffix::of(name).map(|suffix| Self {
            name: name.to_string(),
            suffix,
        })
    }

    pub fn as_str(&self) -> &str {
        &self.name
    }

    pub fn suffix(&self) -> FieldSuffix {
        self.suffix
    }
}

/// Output identifier field, allow-listed past the suffix rule.
pub const ID_FIELD: &str = "id";
/// Sentinel written when the upstream identifier is unexpectedly absent.
pub const MISSING_ID_SENTINEL: &str = "NO_ID";

/// The flat, convention-filtered output record. Immutable once emitted by the
/// engineering stage; field order is the insertion order of the filter pass.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(transparent)]
pub struct FeatureRecord {
    fields: Map<String, Value>,
}

impl FeatureRecord {
    fn insert(&mut self, name: FieldName, value: Value) {
        self.fields.insert(name.name, value);
    }

    fn set_id(&mut self, id: &str) {
        self.fields
            .insert(ID_FIELD.to_string(), Value::String(id.to_string()));
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.fields.get(name)
    }

    pub fn keys(&self) -> impl Iterator<Item = &String> {
        self.fields.keys()
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Render as indented UTF-8 JSON for the output artifact.
    pub fn to_pretty_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(&self.fields)?)
    }
}

static BIRTH_YEAR_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\d{4}").unwrap());

/// Stage 3: derives computed features and applies the suffix filter.
pub struct FeatureEngineer {
    current_year: Option<i32>,
    fallback_birth_year: i32,
    tagger: Box<dyn CorporationTagger>,
    tokenizer: Box<dyn TermTokenizer>,
}

impl FeatureEngineer {
    pub fn new() -> Self {
        Self {
            current_year: None,
            fallback_birth_year: DEFAULT_FALLBACK_BIRTH_YEAR,
            tagger: Box::new(KeywordCorpTagger),
            tokenizer: Box::new(SimpleTokenizer),
        }
    }

    /// Pin the current calendar year, making age derivation deterministic.
    pub fn with_current_year(mut self, year: i32) -> Self {
        self.current_year = Some(year);
        self
    }

    pub fn with_fallback_birth_year(mut self, year: i32) -> Self {
        self.fallback_birth_year = year;
        self
    }

    pub fn with_tagger(mut self, tagger: Box<dyn CorporationTagger>) -> Self {
        self.tagger = tagger;
        self
    }

    pub fn with_tokenizer(mut self, tokenizer: Box<dyn TermTokenizer>) -> Self {
        self.tokenizer = tokenizer;
        self
    }

    fn current_year(&self) -> i32 {
        self.current_year.unwrap_or_else(|| Local::now().year())
    }

    /// First run of four digits in the birth field, else the fallback epoch.
    fn birth_year(&self, basic: &Map<String, Value>) -> i32 {
        basic
            .get("birth")
            .map(plain_string)
            .as_deref()
            .and_then(|birth| BIRTH_YEAR_RE.find(birth))
            .and_then(|m| m.as_str().parse().ok())
            .unwrap_or(self.fallback_birth_year)
    }

    pub fn engineer(&self, record: FlattenedRecord) -> Result<FeatureRecord> {
        let mut fields = record.fields;

        // Age and degree features are load-bearing downstream: a record that
        // lost its basic mapping is rejected, not patched over.
        let birth_year = {
            let basic = fields
                .get("basic")
                .and_then(Value::as_object)
                .ok_or_else(|| RefineryError::MissingField("basic".to_string()))?;
            self.birth_year(basic)
        };
        // Coarse by intent: month and day are ignored.
        let age = self.current_year() - birth_year;

        let corporation_name = fields
            .get("corporation_name")
            .and_then(Value::as_str)
            .unwrap_or("")
            .to_string();
        let degree_label = fields.get("degree").cloned().unwrap_or_default();

        let corp_tags = self
            .tagger
            .corp_tags(&corporation_name)
            .map_err(|e| RefineryError::Lookup(format!("corp tags for '{corporation_name}': {e}")))?;
        let corp_tokens = self
            .tokenizer
            .tokenize(&corporation_name)
            .map_err(|e| RefineryError::Lookup(format!("tokenize '{corporation_name}': {e}")))?;

        fields.insert("age_int".to_string(), Value::from(age));
        fields.insert("highest_degree_kwd".to_string(), degree_label);
        fields.insert(
            "corp_tag_kwd".to_string(),
            Value::Array(corp_tags.into_iter().map(Value::String).collect()),
        );
        fields.insert(
            "corporation_name_tks".to_string(),
            Value::String(corp_tokens),
        );

        let mut output = FeatureRecord::default();
        for (key, value) in &fields {
            if let Some(name) = FieldName::parse(key) {
                output.insert(name, value.clone());
            }
        }

        let id = fields
            .get("resume_id")
            .and_then(Value::as_str)
            .filter(|id| !id.is_empty())
            .unwrap_or(MISSING_ID_SENTINEL);
        output.set_id(id);

        debug!(fields = output.len(), "feature record engineered");
        Ok(output)
    }
}

impl Default for FeatureEngineer {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn flat_record(entries: &[(&str, Value)]) -> FlattenedRecord {
        let mut fields = Map::new();
        for (key, value) in entries {
            fields.insert((*key).to_string(), value.clone());
        }
        FlattenedRecord { fields }
    }

    fn engineer() -> FeatureEngineer {
        FeatureEngineer::new().with_current_year(2024)
    }

    #[test]
    fn age_from_birth_year() {
        let record = flat_record(&[
            ("resume_id", json!("abc123")),
            ("basic", json!({"birth": "1990-01-01"})),
            ("corporation_name", json!("")),
        ]);
        let features = engineer().engineer(record).unwrap();
        assert_eq!(features.get("age_int"), Some(&json!(34)));
    }

    #[test]
    fn missing_birth_uses_fallback_epoch() {
        let record = flat_record(&[
            ("resume_id", json!("abc123")),
            ("basic", json!({})),
        ]);
        let features = engineer().engineer(record).unwrap();
        assert_eq!(features.get("age_int"), Some(&json!(24)));

        let record = flat_record(&[
            ("resume_id", json!("abc123")),
            ("basic", json!({"birth": "unknown"})),
        ]);
        let features = engineer()
            .with_fallback_birth_year(1980)
            .engineer(record)
            .unwrap();
        assert_eq!(features.get("age_int"), Some(&json!(44)));
    }

    #[test]
    fn missing_basic_is_rejected() {
        let record = flat_record(&[("resume_id", json!("abc123"))]);
        let err = engineer().engineer(record).unwrap_err();
        assert!(matches!(err, RefineryError::MissingField(field) if field == "basic"));
    }

    #[test]
    fn derived_features_carry_the_right_suffixes() {
        let record = flat_record(&[
            ("resume_id", json!("abc123")),
            ("basic", json!({"birth": "1990"})),
            ("corporation_name", json!("ByteDance")),
            ("degree", json!("Master")),
        ]);
        let features = engineer().engineer(record).unwrap();

        assert_eq!(features.get("highest_degree_kwd"), Some(&json!("Master")));
        assert_eq!(
            features.get("corp_tag_kwd"),
            Some(&json!(["internet", "consumer"]))
        );
        assert_eq!(
            features.get("corporation_name_tks"),
            Some(&json!("bytedance"))
        );
    }

    #[test]
    fn id_passthrough_and_sentinel() {
        let record = flat_record(&[
            ("resume_id", json!("abc123")),
            ("basic", json!({})),
        ]);
        let features = engineer().engineer(record).unwrap();
        assert_eq!(features.get("id"), Some(&json!("abc123")));

        let record = flat_record(&[("basic", json!({}))]);
        let features = engineer().engineer(record).unwrap();
        assert_eq!(features.get("id"), Some(&json!("NO_ID")));
    }

    #[test]
    fn unsuffixed_fields_never_reach_the_output() {
        let record = flat_record(&[
            ("resume_id", json!("abc123")),
            ("basic", json!({"birth": "1990"})),
            ("raw_text", json!("name: Ada")),
            ("work", json!({"0": {"corporation_name": "B"}})),
            ("education_history", json!({"0": {"school_name": "S"}})),
            ("important_looking_field", json!("dropped anyway")),
        ]);
        let features = engineer().engineer(record).unwrap();

        for key in features.keys() {
            assert!(
                key == ID_FIELD || FieldName::parse(key).is_some(),
                "key '{key}' violates the suffix convention"
            );
        }
        assert!(features.get("raw_text").is_none());
        assert!(features.get("work").is_none());
        assert!(features.get("education_history").is_none());
        assert!(features.get("important_looking_field").is_none());
    }

    #[test]
    fn suffix_classification() {
        assert_eq!(FieldSuffix::of("age_int"), Some(FieldSuffix::Integer));
        assert_eq!(FieldSuffix::of("name_ltks"), Some(FieldSuffix::LongTokens));
        assert_eq!(FieldSuffix::of("name_tks"), Some(FieldSuffix::Tokens));
        assert_eq!(FieldSuffix::of("resume_id"), Some(FieldSuffix::Id));
        assert_eq!(FieldSuffix::of("basic"), None);
        assert_eq!(FieldSuffix::of("tks"), None);
    }
}
