use std::path::PathBuf;

use thiserror::Error;

use crate::analysis::AnalysisType;
use crate::weather::WeatherField;

/// Client-side input problems. Raised before any request is built.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    #[error("Please enter both policies before comparing.")]
    MissingPolicies,

    #[error("Please select at least one file")]
    EmptyBatch,

    #[error("{0} is empty")]
    EmptyFile(String),

    #[error("Please upload {expected} ({file_name} is {mime})")]
    UnsupportedFileType {
        file_name: String,
        mime: String,
        expected: &'static str,
    },

    #[error("{}", join_field_errors(.0))]
    Weather(Vec<(WeatherField, String)>),

    #[error("{analysis} analysis expects {expected}")]
    WrongInput {
        analysis: AnalysisType,
        expected: &'static str,
    },
}

fn join_field_errors(errors: &[(WeatherField, String)]) -> String {
    errors
        .iter()
        .map(|(_, msg)| msg.as_str())
        .collect::<Vec<_>>()
        .join("\n")
}

/// A 2xx response that cannot be handed to the renderer.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ResponseError {
    /// The body carried a `detail` field despite the success status.
    #[error("{0}")]
    Server(String),

    #[error("Malformed response: {0}")]
    Malformed(String),
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("config file not found: {0}")]
    NotFound(PathBuf),

    #[error("api_base must start with http:// or https://, got {0:?}")]
    InvalidBase(String),

    #[error("invalid configuration: {0}")]
    Invalid(#[from] Box<figment::Error>),
}
