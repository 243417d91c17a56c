//! reqwest transport for the policy analysis backend.

use std::time::Duration;

use async_trait::async_trait;
use policyscope_core::{ClientConfig, RawResponse, UploadFile};
use reqwest::header::{ACCEPT, CONTENT_TYPE};
use reqwest::multipart::{Form, Part};
use tracing::{debug, info};

use crate::transport::{ApiRequest, RequestBody, Transport, TransportError};

/// HTTP transport posting to `<base_url><path>`.
pub struct HttpTransport {
    client: reqwest::Client,
    base_url: String,
}

impl HttpTransport {
    /// Create a transport for the given backend base URL.
    ///
    /// `base_url` should be like `http://127.0.0.1:8000`; a trailing slash is dropped.
    pub fn new(base_url: impl Into<String>, timeout: Option<Duration>) -> Result<Self, TransportError> {
        let mut builder = reqwest::Client::builder();
        if let Some(t) = timeout {
            builder = builder.timeout(t);
        }
        let client = builder
            .build()
            .map_err(|e| TransportError::Other(format!("failed to build HTTP client: {e}")))?;
        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    pub fn from_config(config: &ClientConfig) -> Result<Self, TransportError> {
        Self::new(config.base_url(), config.timeout_secs.map(Duration::from_secs))
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn send(&self, request: ApiRequest) -> Result<RawResponse, TransportError> {
        let url = format!("{}{}", self.base_url, request.path);
        let builder = self
            .client
            .post(&url)
            .header(ACCEPT, "application/json");

        let builder = match request.body {
            RequestBody::Json(value) => {
                info!(url = %url, analysis = %request.analysis, "posting JSON request");
                builder.json(&value)
            }
            RequestBody::Multipart { field, files } => {
                info!(url = %url, analysis = %request.analysis, files = files.len(), "uploading documents");
                builder.multipart(build_form(field, files)?)
            }
        };

        let resp = builder
            .send()
            .await
            .map_err(|source| TransportError::Request {
                url: url.clone(),
                source,
            })?;
        let status = resp.status().as_u16();
        let content_type = resp
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        let body = resp
            .bytes()
            .await
            .map_err(|source| TransportError::Request {
                url: url.clone(),
                source,
            })?
            .to_vec();

        debug!(status, bytes = body.len(), content_type = ?content_type, "response received");
        Ok(RawResponse {
            status,
            content_type,
            body,
        })
    }
}

fn build_form(field: &'static str, files: Vec<UploadFile>) -> Result<Form, TransportError> {
    let mut form = Form::new();
    for file in files {
        let part = Part::bytes(file.bytes)
            .file_name(file.file_name.clone())
            .mime_str(&file.mime)
            .map_err(|e| TransportError::InvalidPart {
                file_name: file.file_name,
                reason: e.to_string(),
            })?;
        form = form.part(field, part);
    }
    Ok(form)
}
