//! Analysis types and the backend routes they map to.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Which backend operation a submission targets.
///
/// Endpoint selection is a pure function of this value (plus the configured
/// [`CompareRoute`] for text comparison).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum AnalysisType {
    Full,
    Summarize,
    Ner,
    Compare,
    Recommendations,
    Upload,
    BatchUpload,
}

/// The shape of input an analysis type consumes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputKind {
    /// Two pasted policy bodies, sent as JSON.
    Text,
    /// One document, sent as multipart field `file`.
    File,
    /// Several documents, sent as repeated multipart field `files`.
    Files,
    /// The weather recommendation form, sent as JSON.
    Weather,
}

/// Route used for text comparison. Backends in the wild expose either.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CompareRoute {
    /// `/api/compare_policy`
    #[default]
    Legacy,
    /// `/api/policy/compare`
    Policy,
}

impl AnalysisType {
    pub const ALL: [AnalysisType; 7] = [
        AnalysisType::Full,
        AnalysisType::Summarize,
        AnalysisType::Ner,
        AnalysisType::Compare,
        AnalysisType::Recommendations,
        AnalysisType::Upload,
        AnalysisType::BatchUpload,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            AnalysisType::Full => "full",
            AnalysisType::Summarize => "summarize",
            AnalysisType::Ner => "ner",
            AnalysisType::Compare => "compare",
            AnalysisType::Recommendations => "recommendations",
            AnalysisType::Upload => "upload",
            AnalysisType::BatchUpload => "batch-upload",
        }
    }

    pub fn input_kind(self) -> InputKind {
        match self {
            AnalysisType::Full | AnalysisType::Summarize | AnalysisType::Ner => InputKind::File,
            AnalysisType::Upload => InputKind::File,
            AnalysisType::BatchUpload => InputKind::Files,
            AnalysisType::Compare => InputKind::Text,
            AnalysisType::Recommendations => InputKind::Weather,
        }
    }

    /// Request path relative to the API base URL.
    pub fn path(self, compare_route: CompareRoute) -> &'static str {
        match self {
            AnalysisType::Full => "/api/policy/full-analysis",
            AnalysisType::Summarize => "/api/policy/summarize",
            AnalysisType::Ner => "/api/policy/ner",
            AnalysisType::Compare => match compare_route {
                CompareRoute::Legacy => "/api/compare_policy",
                CompareRoute::Policy => "/api/policy/compare",
            },
            AnalysisType::Recommendations => "/api/recommendations/",
            AnalysisType::Upload => "/api/v1/documents/upload/",
            AnalysisType::BatchUpload => "/api/v1/documents/upload/batch/",
        }
    }
}

impl fmt::Display for AnalysisType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AnalysisType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase();
        AnalysisType::ALL
            .into_iter()
            .find(|a| a.as_str() == wanted)
            .ok_or_else(|| format!("unknown analysis type: {s}"))
    }
}

impl InputKind {
    pub fn describe(self) -> &'static str {
        match self {
            InputKind::Text => "two policy texts",
            InputKind::File => "a single document",
            InputKind::Files => "one or more documents",
            InputKind::Weather => "a weather form",
        }
    }
}
