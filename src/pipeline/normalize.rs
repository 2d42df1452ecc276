use chrono::{Local, NaiveDateTime};
use serde_json::Value;
use tracing::debug;

use crate::extract::CandidateRecord;

/// Timestamp format stamped into `basic.updated_at`.
const UPDATED_AT_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Stage 1: cleans the freshly extracted record and promotes the latest
/// work/education entries into top-level `basic` fields.
///
/// This stage tolerates arbitrarily sparse input. Empty repeated groups skip
/// promotion silently; it never fails.
pub struct Normalizer {
    fixed_time: Option<NaiveDateTime>,
}

impl Normalizer {
    pub fn new() -> Self {
        Self { fixed_time: None }
    }

    /// Pin the processing time, making runs deterministic in tests.
    pub fn with_fixed_time(fixed_time: NaiveDateTime) -> Self {
        Self {
            fixed_time: Some(fixed_time),
        }
    }

    fn timestamp(&self) -> String {
        let now = self
            .fixed_time
            .unwrap_or_else(|| Local::now().naive_local());
        now.format(UPDATED_AT_FORMAT).to_string()
    }

    pub fn normalize(&self, mut record: CandidateRecord) -> CandidateRecord {
        record.is_deleted = false;

        if let Some(corporation_name) = record
            .latest_work()
            .map(|entry| entry.corporation_name.clone())
        {
            record
                .basic
                .insert("corporation_name".to_string(), Value::String(corporation_name));
        }
        if let Some(school_name) = record
            .latest_education()
            .map(|entry| entry.school_name.clone())
        {
            record
                .basic
                .insert("school_name".to_string(), Value::String(school_name));
        }

        record
            .basic
            .insert("updated_at".to_string(), Value::String(self.timestamp()));

        debug!(id = %record.id, "record normalized");
        record
    }
}

impl Default for Normalizer {
    fn default() -> Self {
        Self::new()
    }
}
