//! HTTP client shared by all managed service calls
//!
//! Requests are plain JSON over HTTPS. Each one is signed with SigV4 using
//! the function role's credentials (see [`super::signing`]). The model
//! runtime alone also accepts a bearer API key; when `BEDROCK_API_KEY` is
//! set, Converse calls use it instead of a signature.

use std::time::Duration;

use aws_credential_types::provider::SharedCredentialsProvider;
use reqwest::{Method, Url};
use serde_json::Value;

use super::signing::RequestSigner;
use crate::config::{FunctionConfig, ServiceEndpoints};

/// The managed services this crate talks to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Service {
    AgentRuntime,
    Agent,
    ModelRuntime,
    Functions,
}

impl Service {
    /// Host prefix of the regional public endpoint
    pub fn host_prefix(&self) -> &'static str {
        match self {
            Service::AgentRuntime => "bedrock-agent-runtime",
            Service::Agent => "bedrock-agent",
            Service::ModelRuntime => "bedrock-runtime",
            Service::Functions => "lambda",
        }
    }

    /// Service name in the SigV4 credential scope
    pub fn signing_name(&self) -> &'static str {
        match self {
            Service::Functions => "lambda",
            _ => "bedrock",
        }
    }
}

/// Error type for managed service calls
#[derive(Debug)]
pub enum ServiceError {
    /// Transport failure (connect, timeout, TLS)
    Request(reqwest::Error),
    /// The service answered with a non-success status
    Status { status: u16, body: String },
    /// The response body was not the JSON we expected
    Parse(serde_json::Error),
    /// A field the contract guarantees was absent
    MissingField(&'static str),
    /// Credentials could not be loaded or the request could not be signed
    Signing(String),
    /// An endpoint could not be turned into a request URL
    InvalidUrl(String),
}

impl std::fmt::Display for ServiceError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ServiceError::Request(e) => write!(f, "Request error: {}", e),
            ServiceError::Status { status, body } => {
                write!(f, "Service returned status {}: {}", status, body)
            }
            ServiceError::Parse(e) => write!(f, "Parse error: {}", e),
            ServiceError::MissingField(field) => write!(f, "Response is missing {}", field),
            ServiceError::Signing(msg) => write!(f, "Signing error: {}", msg),
            ServiceError::InvalidUrl(msg) => write!(f, "Invalid endpoint: {}", msg),
        }
    }
}

impl std::error::Error for ServiceError {}

impl From<reqwest::Error> for ServiceError {
    fn from(e: reqwest::Error) -> Self {
        ServiceError::Request(e)
    }
}

impl From<serde_json::Error> for ServiceError {
    fn from(e: serde_json::Error) -> Self {
        ServiceError::Parse(e)
    }
}

/// Client for the managed service HTTP APIs
///
/// The client holds no per-request state, so one instance serves every
/// invocation a process handles. Credentials are resolved on first use.
#[derive(Clone)]
pub struct BedrockClient {
    region: String,
    endpoints: ServiceEndpoints,
    api_key: Option<String>,
    signer: RequestSigner,
    client: reqwest::Client,
}

impl BedrockClient {
    /// Create a new client that signs with the default credential chain
    ///
    /// # Arguments
    /// * `region` - Default region for services whose calls don't carry one
    /// * `endpoints` - Optional per-service endpoint overrides
    /// * `api_key` - Bearer key for the model runtime only
    /// * `timeout` - Per-request timeout
    pub fn new(
        region: impl Into<String>,
        endpoints: ServiceEndpoints,
        api_key: Option<String>,
        timeout: Duration,
    ) -> Result<Self, ServiceError> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            region: region.into(),
            endpoints,
            api_key,
            signer: RequestSigner::from_default_chain(),
            client,
        })
    }

    /// Build a client from the function configuration
    pub fn from_config(config: &FunctionConfig) -> Result<Self, ServiceError> {
        Self::new(
            config.region.clone(),
            config.endpoints.clone(),
            config.api_key.clone(),
            config.http_timeout(),
        )
    }

    /// Sign with `provider` instead of the default credential chain
    pub fn with_credentials(mut self, provider: SharedCredentialsProvider) -> Self {
        self.signer = RequestSigner::with_provider(provider);
        self
    }

    pub fn region(&self) -> &str {
        &self.region
    }

    /// Base URL of a service in the given region, honouring overrides
    pub fn endpoint(&self, service: Service, region: &str) -> String {
        let overridden = match service {
            Service::AgentRuntime => &self.endpoints.agent_runtime,
            Service::Agent => &self.endpoints.agent,
            Service::ModelRuntime => &self.endpoints.model_runtime,
            Service::Functions => &self.endpoints.functions,
        };
        match overridden {
            Some(url) => url.trim_end_matches('/').to_string(),
            None => format!("https://{}.{}.amazonaws.com", service.host_prefix(), region),
        }
    }

    /// Endpoint URL with `segments` appended, each one percent-encoded
    pub fn service_url(
        &self,
        service: Service,
        region: &str,
        segments: &[&str],
    ) -> Result<Url, ServiceError> {
        let base = self.endpoint(service, region);
        let mut url = Url::parse(&base).map_err(|e| ServiceError::InvalidUrl(format!("{}: {}", base, e)))?;
        url.path_segments_mut()
            .map_err(|_| ServiceError::InvalidUrl(base.clone()))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    pub(crate) async fn get_json(
        &self,
        service: Service,
        region: &str,
        url: Url,
    ) -> Result<Value, ServiceError> {
        self.send(service, region, Method::GET, url, Vec::new()).await
    }

    pub(crate) async fn post_json<B: serde::Serialize + ?Sized>(
        &self,
        service: Service,
        region: &str,
        url: Url,
        body: &B,
    ) -> Result<Value, ServiceError> {
        let body = serde_json::to_vec(body)?;
        self.send(service, region, Method::POST, url, body).await
    }

    async fn send(
        &self,
        service: Service,
        region: &str,
        method: Method,
        url: Url,
        body: Vec<u8>,
    ) -> Result<Value, ServiceError> {
        let mut headers: Vec<(&str, &str)> = Vec::new();
        if method == Method::POST {
            headers.push(("content-type", "application/json"));
        }

        let mut request = self.client.request(method.clone(), url.clone());
        for (name, value) in &headers {
            request = request.header(*name, *value);
        }

        request = match (&self.api_key, service) {
            (Some(key), Service::ModelRuntime) => request.bearer_auth(key),
            _ => {
                let signature = self
                    .signer
                    .sign(
                        service.signing_name(),
                        region,
                        method.as_str(),
                        url.as_str(),
                        &headers,
                        &body,
                    )
                    .await?;
                signature
                    .into_iter()
                    .fold(request, |request, (name, value)| request.header(name, value))
            }
        };

        if method == Method::POST {
            request = request.body(body);
        }
        Self::read_json(request.send().await?).await
    }

    async fn read_json(response: reqwest::Response) -> Result<Value, ServiceError> {
        let status = response.status();
        let text = response.text().await?;

        if !status.is_success() {
            return Err(ServiceError::Status {
                status: status.as_u16(),
                body: text,
            });
        }

        Ok(serde_json::from_str(&text)?)
    }
}
