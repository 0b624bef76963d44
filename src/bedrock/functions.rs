//! Synchronous function invocation API

use async_trait::async_trait;
use serde_json::Value;

use super::client::{BedrockClient, Service, ServiceError};

/// Something that can run a named function and return its JSON result
#[async_trait]
pub trait FunctionInvoker: Send + Sync {
    /// Invoke with `RequestResponse` semantics and return the decoded payload
    async fn invoke(&self, function_name: &str, payload: &Value) -> Result<Value, ServiceError>;
}

#[async_trait]
impl FunctionInvoker for BedrockClient {
    async fn invoke(&self, function_name: &str, payload: &Value) -> Result<Value, ServiceError> {
        let region = self.region();
        let url = self.service_url(
            Service::Functions,
            region,
            &["2015-03-31", "functions", function_name, "invocations"],
        )?;
        tracing::debug!(function = function_name, "Invoking function");
        self.post_json(Service::Functions, region, url, payload).await
    }
}
