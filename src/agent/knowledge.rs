//! Reaching the knowledge base through the query function
//!
//! The agent functions don't call the retrieval API themselves; they invoke
//! the standalone query function and unwrap its HTTP-style response.

use std::sync::Arc;

use serde_json::{json, Value};
use tracing::info;

use super::error::FunctionError;
use crate::bedrock::FunctionInvoker;
use crate::knowledge::Chunk;

/// Client for the downstream knowledge base query function
#[derive(Clone)]
pub struct KbFunctionClient {
    invoker: Arc<dyn FunctionInvoker>,
    function_name: String,
    kb_id: Option<String>,
    region: String,
    num_results: usize,
}

impl KbFunctionClient {
    pub fn new(
        invoker: Arc<dyn FunctionInvoker>,
        function_name: impl Into<String>,
        kb_id: Option<String>,
        region: impl Into<String>,
        num_results: usize,
    ) -> Self {
        Self {
            invoker,
            function_name: function_name.into(),
            kb_id,
            region: region.into(),
            num_results,
        }
    }

    /// Request payload: the query arguments as a JSON string under `body`
    pub fn payload(&self, query: &str) -> Value {
        let body = json!({
            "query": query,
            "kb_id": self.kb_id,
            "region": self.region,
            "num_results": self.num_results,
        });
        json!({ "body": body.to_string() })
    }

    /// Run `query` and return the retrieved chunks
    pub async fn query(&self, query: &str) -> Result<Vec<Chunk>, FunctionError> {
        let response = self
            .invoker
            .invoke(&self.function_name, &self.payload(query))
            .await?;

        let body: Value = match response.get("body") {
            Some(Value::String(raw)) => serde_json::from_str(raw)
                .map_err(|e| FunctionError::KnowledgeBase(format!("unreadable body: {}", e)))?,
            Some(other) => other.clone(),
            None => {
                return Err(FunctionError::KnowledgeBase(format!(
                    "response has no body: {}",
                    response
                )))
            }
        };

        let status = response.get("statusCode").and_then(Value::as_u64).unwrap_or(200);
        if status != 200 {
            let message = body
                .get("error")
                .and_then(Value::as_str)
                .map(str::to_string)
                .unwrap_or_else(|| body.to_string());
            return Err(FunctionError::KnowledgeBase(format!("{} ({})", message, status)));
        }

        let chunks: Vec<Chunk> = body
            .get("chunks")
            .and_then(Value::as_array)
            .map(|items| items.iter().map(Chunk::from_value).collect())
            .unwrap_or_default();

        info!(function = %self.function_name, chunks = chunks.len(), "Retrieved information from the KB");
        Ok(chunks)
    }
}
