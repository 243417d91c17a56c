//! Client side of the policy analysis API: request dispatch over HTTP and the
//! single-flight submit workflow.

pub mod http;
pub mod transport;
pub mod workflow;

pub use http::HttpTransport;
pub use transport::{ApiRequest, RequestBody, Transport, TransportError};
pub use workflow::{ViewState, Workflow, WorkflowError, WorkflowInput, build_request};
