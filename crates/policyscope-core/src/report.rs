//! Typed reports returned by the policy analysis backend.
//!
//! These are the shapes handed to the renderer after normalisation. Optional
//! backend fields are `Option` or default to empty here, so nothing downstream
//! has to probe raw JSON.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Token sets produced by comparing two policy bodies.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ComparisonDetails {
    #[serde(default)]
    pub overlap: Vec<String>,
    #[serde(default)]
    pub unique_policy1: Vec<String>,
    #[serde(default)]
    pub unique_policy2: Vec<String>,
}

impl ComparisonDetails {
    /// Find a token listed both as overlap and as unique to one side.
    pub fn shared_with_unique(&self) -> Option<(&str, u8)> {
        for token in &self.overlap {
            if self.unique_policy1.contains(token) {
                return Some((token.as_str(), 1));
            }
            if self.unique_policy2.contains(token) {
                return Some((token.as_str(), 2));
            }
        }
        None
    }
}

/// The canonical `comparison` envelope.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Comparison {
    pub similarity_score: f64,
    #[serde(default)]
    pub details: ComparisonDetails,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Statistics {
    pub word_count: Option<u64>,
    pub sentence_count: Option<u64>,
    pub average_words_per_sentence: Option<f64>,
}

/// One side of a split document.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PolicyDigest {
    pub content: Option<String>,
    pub summary: Option<String>,
    #[serde(default)]
    pub keywords: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PolicySides {
    pub policy1: Option<PolicyDigest>,
    pub policy2: Option<PolicyDigest>,
}

/// A named entity (ORG, DATE, GPE, MONEY, ...).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Entity {
    pub label: String,
    pub text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end: Option<usize>,
}

/// Result of `/api/policy/full-analysis`.
///
/// Fields the client does not model are kept in `extra` so the report
/// serialises back to what the backend sent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisReport {
    pub document_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comparison: Option<Comparison>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub statistics: Option<Statistics>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub policies: Option<PolicySides>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub entities: Option<Vec<Entity>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recommendations: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub analysis: Option<Value>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Result of a text comparison.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComparisonReport {
    pub comparison: Comparison,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SummaryReport {
    pub summary: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filename: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntityReport {
    pub entities: Vec<Entity>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filename: Option<String>,
}

// ── Weather recommendations ──

/// Request body for `/api/recommendations/`. Built by
/// [`WeatherForm::validate`](crate::weather::WeatherForm::validate).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeatherQuery {
    pub location: String,
    pub month: u8,
    pub temperature_c: f64,
    pub humidity_pct: u8,
    pub wind_kmh: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimilarDay {
    pub location: String,
    pub month: u8,
    pub temperature_c: f64,
    pub humidity_pct: u8,
    pub wind_kmh: f64,
    pub condition: String,
    pub similarity: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecommendationResponse {
    pub predicted_condition: String,
    pub confidence: f64,
    pub top_similar_days: Vec<SimilarDay>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

// ── Document upload ──

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentSection {
    pub title: String,
    pub content: String,
    pub start_line: u64,
    pub end_line: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DocumentMetadata {
    pub title: Option<String>,
    pub author: Option<String>,
    pub subject: Option<String>,
    pub keywords: Option<String>,
    pub page_count: Option<u32>,
    #[serde(default, deserialize_with = "timestamp::deserialize")]
    pub creation_date: Option<DateTime<Utc>>,
    #[serde(default, deserialize_with = "timestamp::deserialize")]
    pub modification_date: Option<DateTime<Utc>>,
    pub file_type: Option<String>,
}

/// A processed document as stored by the upload service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    pub id: String,
    pub file_name: String,
    pub file_size: u64,
    pub file_type: String,
    #[serde(default)]
    pub language: Option<String>,
    #[serde(default, deserialize_with = "timestamp::deserialize")]
    pub processing_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub sections: Vec<DocumentSection>,
    #[serde(default)]
    pub metadata: DocumentMetadata,
    #[serde(default)]
    pub keywords: Vec<String>,
}

/// Per-file outcome of a single or batch upload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentResponse {
    pub success: bool,
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub document: Option<Document>,
    #[serde(default)]
    pub error: Option<String>,
}

/// Backend timestamps come with or without a UTC offset; naive ones are UTC.
mod timestamp {
    use chrono::{DateTime, NaiveDateTime, Utc};
    use serde::{Deserialize, Deserializer};

    pub fn parse(s: &str) -> Option<DateTime<Utc>> {
        if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
            return Some(dt.with_timezone(&Utc));
        }
        NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S%.f")
            .ok()
            .map(|naive| naive.and_utc())
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw: Option<String> = Option::deserialize(deserializer)?;
        match raw {
            None => Ok(None),
            Some(s) => parse(&s)
                .map(Some)
                .ok_or_else(|| serde::de::Error::custom(format!("invalid timestamp: {s}"))),
        }
    }
}
