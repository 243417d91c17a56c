//! The seam between the workflow and the network.

use async_trait::async_trait;
use policyscope_core::{AnalysisType, RawResponse, UploadFile};
use serde_json::Value;
use thiserror::Error;

/// One backend call, fully built and validated.
#[derive(Debug, Clone, PartialEq)]
pub struct ApiRequest {
    pub analysis: AnalysisType,
    /// Path relative to the API base, starting with `/`.
    pub path: &'static str,
    pub body: RequestBody,
}

#[derive(Debug, Clone, PartialEq)]
pub enum RequestBody {
    Json(Value),
    /// Every file is sent under the same form field.
    Multipart {
        field: &'static str,
        files: Vec<UploadFile>,
    },
}

#[derive(Error, Debug)]
pub enum TransportError {
    #[error("could not reach {url}: {source}")]
    Request {
        url: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("invalid upload part {file_name}: {reason}")]
    InvalidPart { file_name: String, reason: String },
    #[error("{0}")]
    Other(String),
}

/// Sends one request and returns the response untouched, whatever its status.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn send(&self, request: ApiRequest) -> Result<RawResponse, TransportError>;
}

#[async_trait]
impl<T: Transport + ?Sized> Transport for std::sync::Arc<T> {
    async fn send(&self, request: ApiRequest) -> Result<RawResponse, TransportError> {
        (**self).send(request).await
    }
}
