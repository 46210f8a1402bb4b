use std::cmp::Ordering;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Number, Value};

/// Hits whose content has at most this many characters count as noise.
pub const MIN_CONTENT_CHARS: usize = 10;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Document {
    pub content: String,
    #[serde(default)]
    pub metadata: Map<String, Value>,
}

impl Document {
    pub fn new(content: impl Into<String>, metadata: Map<String, Value>) -> Self {
        Self {
            content: content.into(),
            metadata,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum MetadataError {
    #[error("{0}")]
    Syntax(#[from] serde_json::Error),
    #[error("metadata must be a JSON object, got {0}")]
    NotAnObject(&'static str),
}

/// Blank input means no metadata; anything else must be a JSON object.
pub fn parse_metadata(input: &str) -> Result<Map<String, Value>, MetadataError> {
    if input.trim().is_empty() {
        return Ok(Map::new());
    }

    match serde_json::from_str::<Value>(input)? {
        Value::Object(map) => Ok(map),
        Value::Null => Err(MetadataError::NotAnObject("null")),
        Value::Bool(_) => Err(MetadataError::NotAnObject("a boolean")),
        Value::Number(_) => Err(MetadataError::NotAnObject("a number")),
        Value::String(_) => Err(MetadataError::NotAnObject("a string")),
        Value::Array(_) => Err(MetadataError::NotAnObject("an array")),
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SearchHit {
    pub content: String,
    pub timestamp: Option<Number>,
}

impl SearchHit {
    /// Keeps `content` and a numeric `timestamp`; every other field is dropped.
    pub fn from_record(record: &Value) -> Self {
        let content = record
            .get("content")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string();
        let timestamp = match record.get("timestamp") {
            Some(Value::Number(number)) => Some(number.clone()),
            _ => None,
        };
        Self { content, timestamp }
    }

    fn sort_key(&self) -> f64 {
        self.timestamp
            .as_ref()
            .and_then(Number::as_f64)
            .unwrap_or(f64::NEG_INFINITY)
    }
}

#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct HitFilter {
    pub drop_short_content: bool,
}

impl HitFilter {
    fn keeps(&self, hit: &SearchHit) -> bool {
        !self.drop_short_content || hit.content.chars().count() > MIN_CONTENT_CHARS
    }
}

/// Maps raw records to hits, applies `filter`, and orders newest first.
/// Hits without a timestamp go last; ties keep their input order.
pub fn collect_hits(records: &[Value], filter: HitFilter) -> Vec<SearchHit> {
    let mut hits: Vec<SearchHit> = records
        .iter()
        .map(SearchHit::from_record)
        .filter(|hit| filter.keeps(hit))
        .collect();
    hits.sort_by(|a, b| {
        b.sort_key()
            .partial_cmp(&a.sort_key())
            .unwrap_or(Ordering::Equal)
    });
    hits
}
