//! Response normalisation: raw backend bytes → typed reports.
//!
//! Every success response passes through [`normalize`] exactly once. It
//! rejects bodies that are not JSON objects, checks the fields each analysis
//! type requires, lifts legacy top-level `similarity_score`/`details` into
//! the canonical `comparison` envelope, and decodes the typed report.

use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use tracing::{debug, warn};

use crate::analysis::AnalysisType;
use crate::error::ResponseError;
use crate::report::{
    AnalysisReport, Comparison, ComparisonReport, DocumentResponse, EntityReport,
    RecommendationResponse, SummaryReport,
};

/// An HTTP response as received, before any interpretation.
#[derive(Debug, Clone, PartialEq)]
pub struct RawResponse {
    pub status: u16,
    pub content_type: Option<String>,
    pub body: Vec<u8>,
}

impl RawResponse {
    pub fn json(status: u16, value: &Value) -> Self {
        Self {
            status,
            content_type: Some("application/json".into()),
            body: value.to_string().into_bytes(),
        }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Parse the body as JSON, if it is JSON.
    pub fn parse_json(&self) -> Option<Value> {
        serde_json::from_slice(&self.body).ok()
    }
}

/// A normalised, typed result ready for display.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum AnalysisOutcome {
    Analysis(AnalysisReport),
    Summary(SummaryReport),
    Entities(EntityReport),
    Comparison(ComparisonReport),
    Recommendation(RecommendationResponse),
    Upload(DocumentResponse),
    Batch(Vec<DocumentResponse>),
}

/// Extract the server's `detail` message from an error body.
///
/// `detail` is either a string or a list of `{msg}` objects (FastAPI
/// validation errors); list entries are joined with newlines.
pub fn error_detail(body: &Value) -> Option<String> {
    match body.get("detail")? {
        Value::String(s) => Some(s.clone()),
        Value::Array(items) => {
            let msgs: Vec<String> = items
                .iter()
                .filter_map(|item| match item {
                    Value::String(s) => Some(s.clone()),
                    other => other.get("msg").and_then(Value::as_str).map(str::to_string),
                })
                .collect();
            (!msgs.is_empty()).then(|| msgs.join("\n"))
        }
        Value::Null => None,
        other => Some(other.to_string()),
    }
}

/// Normalise a 2xx response for the given analysis type.
pub fn normalize(kind: AnalysisType, raw: &RawResponse) -> Result<AnalysisOutcome, ResponseError> {
    if raw.body.iter().all(u8::is_ascii_whitespace) {
        return Err(ResponseError::Malformed("empty response body".into()));
    }
    let value: Value = serde_json::from_slice(&raw.body).map_err(|_| {
        ResponseError::Malformed(format!(
            "expected JSON but received {} ({} bytes)",
            raw.content_type.as_deref().unwrap_or("an untyped body"),
            raw.body.len()
        ))
    })?;
    normalize_value(kind, value)
}

/// Normalise an already-parsed JSON body.
pub fn normalize_value(kind: AnalysisType, value: Value) -> Result<AnalysisOutcome, ResponseError> {
    if kind == AnalysisType::BatchUpload {
        return normalize_batch(value);
    }

    let Value::Object(mut obj) = value else {
        return Err(ResponseError::Malformed(format!(
            "expected a JSON object for {kind} analysis, got {}",
            json_kind(&value)
        )));
    };
    if let Some(detail) = error_detail(&Value::Object(obj.clone())) {
        return Err(ResponseError::Server(detail));
    }

    match kind {
        AnalysisType::Full => {
            require(&obj, kind, &["document_name"])?;
            lift_comparison(&mut obj);
            if !has_value(&obj, "comparison") && !has_value(&obj, "analysis") {
                return Err(missing(kind, "analysis or comparison"));
            }
            let mut report: AnalysisReport = decode(kind, Value::Object(obj))?;
            if let Some(comparison) = report.comparison.as_mut() {
                check_comparison(comparison)?;
            }
            Ok(AnalysisOutcome::Analysis(report))
        }
        AnalysisType::Summarize => {
            require(&obj, kind, &["summary"])?;
            decode(kind, Value::Object(obj)).map(AnalysisOutcome::Summary)
        }
        AnalysisType::Ner => {
            require(&obj, kind, &["entities"])?;
            if !obj["entities"].is_array() {
                return Err(ResponseError::Malformed(
                    "invalid ner response: `entities` is not a list".into(),
                ));
            }
            decode(kind, Value::Object(obj)).map(AnalysisOutcome::Entities)
        }
        AnalysisType::Compare => {
            lift_comparison(&mut obj);
            let Some(comparison) = obj.get("comparison").filter(|c| !c.is_null()) else {
                return Err(missing(kind, "similarity_score and details"));
            };
            require_details(kind, comparison)?;
            let mut report: ComparisonReport = decode(kind, Value::Object(obj))?;
            check_comparison(&mut report.comparison)?;
            Ok(AnalysisOutcome::Comparison(report))
        }
        AnalysisType::Recommendations => {
            require(
                &obj,
                kind,
                &["predicted_condition", "confidence", "top_similar_days"],
            )?;
            decode(kind, Value::Object(obj)).map(AnalysisOutcome::Recommendation)
        }
        AnalysisType::Upload => {
            require(&obj, kind, &["success"])?;
            decode(kind, Value::Object(obj)).map(AnalysisOutcome::Upload)
        }
        AnalysisType::BatchUpload => unreachable!("handled above"),
    }
}

/// Copy legacy top-level `similarity_score`/`details` into `comparison`.
///
/// Only applies when `comparison` is absent or null and both legacy keys are
/// present. The legacy keys stay where they are; nothing else is touched.
pub fn lift_comparison(obj: &mut Map<String, Value>) {
    if has_value(obj, "comparison") {
        return;
    }
    let (Some(score), Some(details)) = (obj.get("similarity_score"), obj.get("details")) else {
        return;
    };
    let mut comparison = Map::new();
    comparison.insert("similarity_score".into(), score.clone());
    comparison.insert("details".into(), details.clone());
    debug!("lifted legacy similarity_score/details into comparison");
    obj.insert("comparison".into(), Value::Object(comparison));
}

fn normalize_batch(value: Value) -> Result<AnalysisOutcome, ResponseError> {
    let kind = AnalysisType::BatchUpload;
    let Value::Array(items) = value else {
        if let Some(detail) = error_detail(&value) {
            return Err(ResponseError::Server(detail));
        }
        return Err(ResponseError::Malformed(format!(
            "expected a JSON array for {kind}, got {}",
            json_kind(&value)
        )));
    };
    for (i, item) in items.iter().enumerate() {
        let Some(obj) = item.as_object() else {
            return Err(ResponseError::Malformed(format!(
                "batch entry {i} is {}, not an object",
                json_kind(item)
            )));
        };
        if !obj.contains_key("success") {
            return Err(ResponseError::Malformed(format!(
                "batch entry {i} is missing `success`"
            )));
        }
    }
    decode(kind, Value::Array(items)).map(AnalysisOutcome::Batch)
}

fn has_value(obj: &Map<String, Value>, key: &str) -> bool {
    obj.get(key).is_some_and(|v| !v.is_null())
}

fn require(obj: &Map<String, Value>, kind: AnalysisType, fields: &[&str]) -> Result<(), ResponseError> {
    match fields.iter().find(|f| obj.get(**f).is_none_or(Value::is_null)) {
        Some(field) => Err(missing(kind, field)),
        None => Ok(()),
    }
}

fn require_details(kind: AnalysisType, comparison: &Value) -> Result<(), ResponseError> {
    if comparison.get("similarity_score").is_none_or(Value::is_null) {
        return Err(missing(kind, "similarity_score"));
    }
    let Some(details) = comparison.get("details").and_then(Value::as_object) else {
        return Err(missing(kind, "details"));
    };
    for list in ["overlap", "unique_policy1", "unique_policy2"] {
        if !details.get(list).is_some_and(Value::is_array) {
            return Err(missing(kind, &format!("details.{list}")));
        }
    }
    Ok(())
}

/// Reject a non-finite score or a token that is both shared and unique.
/// Finite scores outside [0, 1] are clamped.
fn check_comparison(comparison: &mut Comparison) -> Result<(), ResponseError> {
    let score = comparison.similarity_score;
    if !score.is_finite() {
        return Err(ResponseError::Malformed(format!(
            "similarity_score is not a finite number: {score}"
        )));
    }
    if !(0.0..=1.0).contains(&score) {
        warn!(score, "similarity_score outside [0, 1]; clamping");
        comparison.similarity_score = score.clamp(0.0, 1.0);
    }
    if let Some((token, side)) = comparison.details.shared_with_unique() {
        return Err(ResponseError::Malformed(format!(
            "token {token:?} is listed as both overlap and unique to policy {side}"
        )));
    }
    Ok(())
}

fn decode<T: DeserializeOwned>(kind: AnalysisType, value: Value) -> Result<T, ResponseError> {
    serde_json::from_value(value)
        .map_err(|e| ResponseError::Malformed(format!("invalid {kind} response: {e}")))
}

fn missing(kind: AnalysisType, field: &str) -> ResponseError {
    ResponseError::Malformed(format!("invalid {kind} response: missing `{field}`"))
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
