//! Runtime API client

use serde::Serialize;
use serde_json::Value;
use tracing::debug;

use super::handlers::HandlerError;

pub const RUNTIME_API_VERSION: &str = "2018-06-01";

const REQUEST_ID_HEADER: &str = "Lambda-Runtime-Aws-Request-Id";
const TRACE_ID_HEADER: &str = "Lambda-Runtime-Trace-Id";
const ERROR_TYPE_HEADER: &str = "Lambda-Runtime-Function-Error-Type";

/// Error type for Runtime API calls
#[derive(Debug)]
pub enum RuntimeError {
    Request(reqwest::Error),
    /// The Runtime API rejected a call
    Status { status: u16, body: String },
    /// The next-invocation response had no request id
    MissingRequestId,
    Parse(serde_json::Error),
}

impl std::fmt::Display for RuntimeError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RuntimeError::Request(e) => write!(f, "Runtime API request error: {}", e),
            RuntimeError::Status { status, body } => {
                write!(f, "Runtime API returned status {}: {}", status, body)
            }
            RuntimeError::MissingRequestId => write!(f, "Invocation has no request id"),
            RuntimeError::Parse(e) => write!(f, "Invocation payload is not JSON: {}", e),
        }
    }
}

impl std::error::Error for RuntimeError {}

impl From<reqwest::Error> for RuntimeError {
    fn from(e: reqwest::Error) -> Self {
        RuntimeError::Request(e)
    }
}

impl From<serde_json::Error> for RuntimeError {
    fn from(e: serde_json::Error) -> Self {
        RuntimeError::Parse(e)
    }
}

/// One event from the Runtime API
#[derive(Debug, Clone)]
pub struct NextInvocation {
    pub request_id: String,
    pub trace_id: Option<String>,
    pub payload: Value,
}

/// Error body the Runtime API expects
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ErrorReport {
    pub error_message: String,
    pub error_type: String,
}

impl ErrorReport {
    pub fn new(error_type: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            error_message: message.into(),
            error_type: error_type.into(),
        }
    }

    pub fn from_handler(e: &HandlerError) -> Self {
        Self::new(e.error_type(), e.to_string())
    }
}

/// Client for the Runtime API at `AWS_LAMBDA_RUNTIME_API`
#[derive(Clone)]
pub struct RuntimeClient {
    base_url: String,
    client: reqwest::Client,
}

impl RuntimeClient {
    /// Create a client for `host:port` (scheme optional)
    pub fn new(api: &str) -> Self {
        let api = api.trim_end_matches('/');
        let base = if api.starts_with("http://") || api.starts_with("https://") {
            api.to_string()
        } else {
            format!("http://{}", api)
        };
        Self {
            base_url: format!("{}/{}/runtime", base, RUNTIME_API_VERSION),
            // No timeout: `next` is a long poll
            client: reqwest::Client::new(),
        }
    }

    /// Block until the next event arrives
    pub async fn next_invocation(&self) -> Result<NextInvocation, RuntimeError> {
        let response = self
            .client
            .get(format!("{}/invocation/next", self.base_url))
            .send()
            .await?;

        let status = response.status();
        let header = |name: &str| {
            response
                .headers()
                .get(name)
                .and_then(|v| v.to_str().ok())
                .map(str::to_string)
        };
        let request_id = header(REQUEST_ID_HEADER);
        let trace_id = header(TRACE_ID_HEADER);
        let body = response.text().await?;

        if !status.is_success() {
            return Err(RuntimeError::Status {
                status: status.as_u16(),
                body,
            });
        }
        let request_id = request_id.ok_or(RuntimeError::MissingRequestId)?;
        debug!(request_id = %request_id, trace_id = ?trace_id, "Next invocation");

        Ok(NextInvocation {
            request_id,
            trace_id,
            payload: serde_json::from_str(&body)?,
        })
    }

    pub async fn post_response(&self, request_id: &str, response: &Value) -> Result<(), RuntimeError> {
        let url = format!("{}/invocation/{}/response", self.base_url, request_id);
        Self::check(self.client.post(url).json(response).send().await?).await
    }

    pub async fn post_error(&self, request_id: &str, report: &ErrorReport) -> Result<(), RuntimeError> {
        let url = format!("{}/invocation/{}/error", self.base_url, request_id);
        let request = self
            .client
            .post(url)
            .header(ERROR_TYPE_HEADER, &report.error_type)
            .json(report);
        Self::check(request.send().await?).await
    }

    /// Report a failure before the first event was taken
    pub async fn post_init_error(&self, report: &ErrorReport) -> Result<(), RuntimeError> {
        let url = format!("{}/init/error", self.base_url);
        let request = self
            .client
            .post(url)
            .header(ERROR_TYPE_HEADER, &report.error_type)
            .json(report);
        Self::check(request.send().await?).await
    }

    async fn check(response: reqwest::Response) -> Result<(), RuntimeError> {
        let status = response.status();
        if status.is_success() {
            return Ok(());
        }
        Err(RuntimeError::Status {
            status: status.as_u16(),
            body: response.text().await.unwrap_or_default(),
        })
    }
}
