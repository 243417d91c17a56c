//! The submit workflow: validate, dispatch once, normalise, settle.
//!
//! A [`Workflow`] owns one view state and admits one request at a time. A
//! submission moves the state to `Loading`, and every outcome (validation
//! failure, transport failure, server error, malformed response, success)
//! settles it to `Failed` or `Ready`, replacing whatever was shown before.

use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};

use policyscope_core::input::validate_batch;
use policyscope_core::{
    AnalysisOutcome, AnalysisType, ClientConfig, CompareRoute, FileAllowList, InputKind,
    PolicyPair, RawResponse, ResponseError, UploadFile, ValidationError, WeatherForm,
    error_detail, normalize,
};
use thiserror::Error;
use tracing::{info, warn};

use crate::transport::{ApiRequest, RequestBody, Transport, TransportError};

/// Raw user input, validated on submit.
#[derive(Debug, Clone, PartialEq)]
pub enum WorkflowInput {
    Text { policy1: String, policy2: String },
    File(UploadFile),
    Files(Vec<UploadFile>),
    Weather(WeatherForm),
}

impl WorkflowInput {
    fn kind(&self) -> InputKind {
        match self {
            WorkflowInput::Text { .. } => InputKind::Text,
            WorkflowInput::File(_) => InputKind::File,
            WorkflowInput::Files(_) => InputKind::Files,
            WorkflowInput::Weather(_) => InputKind::Weather,
        }
    }
}

#[derive(Error, Debug)]
pub enum WorkflowError {
    #[error("{0}")]
    Validation(#[from] ValidationError),
    #[error("Network error: {0}")]
    Transport(#[from] TransportError),
    #[error("{message}")]
    Server { status: u16, message: String },
    #[error("Malformed response: {0}")]
    Malformed(String),
    #[error("A request is already in progress")]
    Busy,
    #[error("Could not encode request: {0}")]
    Encode(#[from] serde_json::Error),
}

/// What the result view shows.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum ViewState {
    /// Nothing submitted yet.
    #[default]
    Idle,
    Loading(AnalysisType),
    Failed(String),
    Ready(AnalysisOutcome),
}

pub struct Workflow<T> {
    transport: T,
    compare_route: CompareRoute,
    file_types: FileAllowList,
    in_flight: AtomicBool,
    state: Mutex<ViewState>,
}

/// Clears the loading flag when the request settles, however it settles.
struct InFlight<'a>(&'a AtomicBool);

impl<'a> InFlight<'a> {
    fn acquire(flag: &'a AtomicBool) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| Self(flag))
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

impl<T: Transport> Workflow<T> {
    pub fn new(transport: T, config: &ClientConfig) -> Self {
        Self {
            transport,
            compare_route: config.compare_route,
            file_types: config.file_types,
            in_flight: AtomicBool::new(false),
            state: Mutex::new(ViewState::Idle),
        }
    }

    pub fn state(&self) -> ViewState {
        self.lock_state().clone()
    }

    pub fn is_loading(&self) -> bool {
        self.in_flight.load(Ordering::Acquire)
    }

    /// Submit one request. Refused with [`WorkflowError::Busy`] while another
    /// is in flight; a refused submission leaves the view state alone.
    pub async fn submit(
        &self,
        analysis: AnalysisType,
        input: WorkflowInput,
    ) -> Result<AnalysisOutcome, WorkflowError> {
        let Some(_guard) = InFlight::acquire(&self.in_flight) else {
            return Err(WorkflowError::Busy);
        };
        self.set_state(ViewState::Loading(analysis));

        let result = self.run(analysis, input).await;
        match &result {
            Ok(outcome) => {
                info!(analysis = %analysis, "request settled");
                self.set_state(ViewState::Ready(outcome.clone()));
            }
            Err(e) => {
                warn!(analysis = %analysis, error = %e, "request failed");
                self.set_state(ViewState::Failed(e.to_string()));
            }
        }
        result
    }

    async fn run(
        &self,
        analysis: AnalysisType,
        input: WorkflowInput,
    ) -> Result<AnalysisOutcome, WorkflowError> {
        let request = build_request(analysis, input, self.compare_route, self.file_types)?;
        let raw = self.transport.send(request).await?;
        if !raw.is_success() {
            return Err(server_error(&raw));
        }
        normalize(analysis, &raw).map_err(|e| match e {
            ResponseError::Server(message) => WorkflowError::Server {
                status: raw.status,
                message,
            },
            ResponseError::Malformed(reason) => WorkflowError::Malformed(reason),
        })
    }

    fn set_state(&self, next: ViewState) {
        *self.lock_state() = next;
    }

    fn lock_state(&self) -> std::sync::MutexGuard<'_, ViewState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

/// Validate input and package it for the endpoint the analysis type selects.
pub fn build_request(
    analysis: AnalysisType,
    input: WorkflowInput,
    compare_route: CompareRoute,
    file_types: FileAllowList,
) -> Result<ApiRequest, WorkflowError> {
    let expected = analysis.input_kind();
    if input.kind() != expected {
        return Err(ValidationError::WrongInput {
            analysis,
            expected: expected.describe(),
        }
        .into());
    }

    let body = match input {
        WorkflowInput::Text { policy1, policy2 } => {
            let pair = PolicyPair::new(policy1, policy2)?;
            RequestBody::Json(serde_json::to_value(&pair)?)
        }
        WorkflowInput::File(file) => {
            file.validate(file_types)?;
            RequestBody::Multipart {
                field: "file",
                files: vec![file],
            }
        }
        WorkflowInput::Files(files) => {
            validate_batch(&files, file_types)?;
            RequestBody::Multipart {
                field: "files",
                files,
            }
        }
        WorkflowInput::Weather(form) => {
            let query = form.validate()?;
            RequestBody::Json(serde_json::to_value(&query)?)
        }
    };

    Ok(ApiRequest {
        analysis,
        path: analysis.path(compare_route),
        body,
    })
}

/// Turn a non-2xx response into one message: the server's `detail` if it
/// sent one, a generic status message otherwise.
pub fn server_error(raw: &RawResponse) -> WorkflowError {
    let message = raw
        .parse_json()
        .as_ref()
        .and_then(error_detail)
        .unwrap_or_else(|| format!("Request failed with HTTP status {}", raw.status));
    WorkflowError::Server {
        status: raw.status,
        message,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::VecDeque;
    use std::sync::Arc;

    use async_trait::async_trait;
    use policyscope_core::input::{MIME_DOCX, MIME_PDF};
    use serde_json::{Value, json};
    use tokio::sync::Notify;

    /// Replays canned responses and records every request it is handed.
    #[derive(Default)]
    struct StubTransport {
        responses: Mutex<VecDeque<Result<RawResponse, String>>>,
        calls: Mutex<Vec<ApiRequest>>,
        gate: Option<Arc<Notify>>,
    }

    impl StubTransport {
        fn replying(responses: Vec<Result<RawResponse, String>>) -> Self {
            Self {
                responses: Mutex::new(responses.into()),
                ..Default::default()
            }
        }

        fn calls(&self) -> Vec<ApiRequest> {
            self.calls.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl Transport for StubTransport {
        async fn send(&self, request: ApiRequest) -> Result<RawResponse, TransportError> {
            self.calls.lock().unwrap().push(request);
            if let Some(gate) = &self.gate {
                gate.notified().await;
            }
            self.responses
                .lock()
                .unwrap()
                .pop_front()
                .expect("no canned response left")
                .map_err(TransportError::Other)
        }
    }

    fn ok(value: Value) -> Result<RawResponse, String> {
        Ok(RawResponse::json(200, &value))
    }

    fn text(p1: &str, p2: &str) -> WorkflowInput {
        WorkflowInput::Text {
            policy1: p1.into(),
            policy2: p2.into(),
        }
    }

    fn workflow(stub: Arc<StubTransport>) -> Workflow<Arc<StubTransport>> {
        Workflow::new(stub, &ClientConfig::default())
    }

    #[tokio::test]
    async fn compare_end_to_end() {
        let stub = Arc::new(StubTransport::replying(vec![ok(json!({
            "similarity_score": 0.5,
            "details": {"overlap": ["B", "C"], "unique_policy1": ["A"], "unique_policy2": ["D"]}
        }))]));
        let wf = workflow(stub.clone());
        assert_eq!(wf.state(), ViewState::Idle);

        let outcome = wf
            .submit(AnalysisType::Compare, text("A B C", "B C D"))
            .await
            .unwrap();

        let AnalysisOutcome::Comparison(report) = &outcome else {
            panic!("expected comparison outcome");
        };
        assert_eq!(report.comparison.similarity_score, 0.5);
        assert_eq!(wf.state(), ViewState::Ready(outcome.clone()));
        assert!(!wf.is_loading());

        let calls = stub.calls();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].path, "/api/compare_policy");
        assert_eq!(
            calls[0].body,
            RequestBody::Json(json!({"policy1": "A B C", "policy2": "B C D"}))
        );
    }

    #[tokio::test]
    async fn validation_failure_makes_no_call() {
        let stub = Arc::new(StubTransport::default());
        let wf = workflow(stub.clone());

        let file = UploadFile::new("scan.png", "image/png", vec![1, 2]);
        let err = wf
            .submit(AnalysisType::Full, WorkflowInput::File(file))
            .await
            .unwrap_err();

        assert!(matches!(err, WorkflowError::Validation(_)));
        assert!(stub.calls().is_empty());
        assert_eq!(
            wf.state(),
            ViewState::Failed("Please upload a PDF or Word document (scan.png is image/png)".into())
        );
    }

    #[tokio::test]
    async fn blank_policy_blocked() {
        let stub = Arc::new(StubTransport::default());
        let wf = workflow(stub.clone());
        let err = wf
            .submit(AnalysisType::Compare, text("A B C", "  "))
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "Please enter both policies before comparing.");
        assert!(stub.calls().is_empty());
    }

    #[tokio::test]
    async fn server_detail_list_surfaces_message() {
        let stub = Arc::new(StubTransport::replying(vec![Ok(RawResponse::json(
            422,
            &json!({"detail": [{"msg": "policy1 required"}]}),
        ))]));
        let wf = workflow(stub);
        let err = wf
            .submit(AnalysisType::Compare, text("x", "y"))
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "policy1 required");
        assert_eq!(wf.state(), ViewState::Failed("policy1 required".into()));
    }

    #[tokio::test]
    async fn non_json_error_body_gets_generic_message() {
        let stub = Arc::new(StubTransport::replying(vec![Ok(RawResponse {
            status: 502,
            content_type: Some("text/html".into()),
            body: b"<html>Bad Gateway</html>".to_vec(),
        })]));
        let wf = workflow(stub);
        let err = wf
            .submit(AnalysisType::Compare, text("x", "y"))
            .await
            .unwrap_err();
        assert!(matches!(err, WorkflowError::Server { status: 502, .. }));
        assert_eq!(err.to_string(), "Request failed with HTTP status 502");
    }

    #[tokio::test]
    async fn blob_success_is_malformed() {
        let stub = Arc::new(StubTransport::replying(vec![Ok(RawResponse {
            status: 200,
            content_type: Some("application/octet-stream".into()),
            body: vec![0x25, 0x50, 0x44, 0x46, 0x00, 0xff],
        })]));
        let wf = workflow(stub);
        let file = UploadFile::new("policy.pdf", MIME_PDF, b"%PDF".to_vec());
        let err = wf
            .submit(AnalysisType::Full, WorkflowInput::File(file))
            .await
            .unwrap_err();
        assert!(matches!(err, WorkflowError::Malformed(_)));
        assert!(matches!(wf.state(), ViewState::Failed(ref m) if m.starts_with("Malformed response")));
    }

    #[tokio::test]
    async fn transport_failure_settles_state() {
        let stub = Arc::new(StubTransport::replying(vec![Err("connection refused".into())]));
        let wf = workflow(stub);
        let err = wf
            .submit(AnalysisType::Compare, text("x", "y"))
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "Network error: connection refused");
        assert!(!wf.is_loading());
    }

    #[tokio::test]
    async fn second_submit_while_loading_is_busy() {
        let gate = Arc::new(Notify::new());
        let stub = Arc::new(StubTransport {
            responses: Mutex::new(
                vec![ok(json!({"status": "success", "summary": "Short."}))].into(),
            ),
            gate: Some(gate.clone()),
            ..Default::default()
        });
        let wf = workflow(stub.clone());
        let file = || WorkflowInput::File(UploadFile::new("p.pdf", MIME_PDF, vec![1]));

        let (first, second) = tokio::join!(wf.submit(AnalysisType::Summarize, file()), async {
            tokio::task::yield_now().await;
            assert!(wf.is_loading());
            assert_eq!(wf.state(), ViewState::Loading(AnalysisType::Summarize));
            let busy = wf.submit(AnalysisType::Summarize, file()).await;
            gate.notify_one();
            busy
        });

        assert!(matches!(second, Err(WorkflowError::Busy)));
        assert!(matches!(first, Ok(AnalysisOutcome::Summary(_))));
        assert_eq!(stub.calls().len(), 1);
        assert!(!wf.is_loading());
    }

    #[tokio::test]
    async fn new_result_replaces_previous() {
        let stub = Arc::new(StubTransport::replying(vec![
            Ok(RawResponse::json(500, &json!({"detail": "model not loaded"}))),
            ok(json!({"entities": [{"label": "ORG", "text": "IPCC"}]})),
        ]));
        let wf = workflow(stub);
        let file = || WorkflowInput::File(UploadFile::new("p.docx", MIME_DOCX, vec![1]));

        wf.submit(AnalysisType::Ner, file()).await.unwrap_err();
        assert_eq!(wf.state(), ViewState::Failed("model not loaded".into()));

        wf.submit(AnalysisType::Ner, file()).await.unwrap();
        assert!(matches!(wf.state(), ViewState::Ready(AnalysisOutcome::Entities(_))));
    }

    #[test]
    fn wrong_input_for_type() {
        let err = build_request(
            AnalysisType::Compare,
            WorkflowInput::Files(vec![]),
            CompareRoute::Legacy,
            FileAllowList::PdfOrWord,
        )
        .unwrap_err();
        assert_eq!(err.to_string(), "compare analysis expects two policy texts");
    }

    #[test]
    fn batch_uses_files_field() {
        let files = vec![
            UploadFile::new("a.pdf", MIME_PDF, vec![1]),
            UploadFile::new("b.docx", MIME_DOCX, vec![2]),
        ];
        let req = build_request(
            AnalysisType::BatchUpload,
            WorkflowInput::Files(files.clone()),
            CompareRoute::Legacy,
            FileAllowList::PdfOrWord,
        )
        .unwrap();
        assert_eq!(req.path, "/api/v1/documents/upload/batch/");
        assert_eq!(req.body, RequestBody::Multipart { field: "files", files });
    }

    #[test]
    fn weather_form_becomes_json() {
        let form = WeatherForm {
            location: "Colombo".into(),
            month: "8".into(),
            temperature_c: "28".into(),
            humidity_pct: "75".into(),
            wind_kmh: "12".into(),
        };
        let req = build_request(
            AnalysisType::Recommendations,
            WorkflowInput::Weather(form),
            CompareRoute::Legacy,
            FileAllowList::PdfOrWord,
        )
        .unwrap();
        assert_eq!(req.path, "/api/recommendations/");
        assert_eq!(
            req.body,
            RequestBody::Json(json!({
                "location": "Colombo",
                "month": 8,
                "temperature_c": 28.0,
                "humidity_pct": 75,
                "wind_kmh": 12.0
            }))
        );
    }

    #[test]
    fn text_pair_sent_as_entered() {
        let req = build_request(
            AnalysisType::Compare,
            text("  A B C\n", "B C D"),
            CompareRoute::Legacy,
            FileAllowList::PdfOrWord,
        )
        .unwrap();
        assert_eq!(
            req.body,
            RequestBody::Json(json!({"policy1": "  A B C\n", "policy2": "B C D"}))
        );
    }

    #[test]
    fn policy_compare_route() {
        let req = build_request(
            AnalysisType::Compare,
            text("a", "b"),
            CompareRoute::Policy,
            FileAllowList::PdfOrWord,
        )
        .unwrap();
        assert_eq!(req.path, "/api/policy/compare");
    }
}
