//! HTTP-style knowledge base query function
//!
//! Unlike the agent functions, this one speaks conventional status codes:
//! 400 for a missing query or knowledge base id, 500 when the query fails,
//! 200 with `{chunks, raw_response}` otherwise.

use std::collections::BTreeMap;
use std::sync::Arc;

use serde::Serialize;
use serde_json::{json, Value};
use tracing::{error, info};

use super::query_knowledge_base;
use crate::bedrock::{KnowledgeBase, RetrieveRequest};
use crate::config::names::DEFAULT_REGION;

const DEFAULT_NUM_RESULTS: usize = 5;

/// Proxy-integration style response
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct HttpResponse {
    pub status_code: u16,
    pub headers: BTreeMap<String, String>,
    pub body: String,
}

impl HttpResponse {
    /// JSON response with permissive CORS
    pub fn json(status_code: u16, body: &Value) -> Self {
        let headers = BTreeMap::from([
            ("Content-Type".to_string(), "application/json".to_string()),
            ("Access-Control-Allow-Origin".to_string(), "*".to_string()),
        ]);
        Self {
            status_code,
            headers,
            body: body.to_string(),
        }
    }

    fn error(status_code: u16, message: impl Into<String>) -> Self {
        Self::json(status_code, &json!({ "error": message.into() }))
    }
}

/// The standalone knowledge base query function
#[derive(Clone)]
pub struct KbQueryFunction {
    kb: Arc<dyn KnowledgeBase>,
}

impl KbQueryFunction {
    pub fn new(kb: Arc<dyn KnowledgeBase>) -> Self {
        Self { kb }
    }

    /// Handle one event of the form `{"body": "<json>"}`
    ///
    /// The body may also arrive as an already-decoded object.
    pub async fn handle(&self, event: &Value) -> HttpResponse {
        let body = match decode_body(event) {
            Ok(body) => body,
            Err(e) => {
                error!(error = %e, "Error in kb query handler");
                return HttpResponse::error(500, format!("Internal server error: {}", e));
            }
        };

        let query = body.get("query").and_then(Value::as_str).unwrap_or_default();
        if query.is_empty() {
            return HttpResponse::error(400, "Query parameter is required");
        }
        let kb_id = body.get("kb_id").and_then(Value::as_str).unwrap_or_default();
        if kb_id.is_empty() {
            return HttpResponse::error(400, "Knowledge base ID is required");
        }

        let request = RetrieveRequest {
            query: query.to_string(),
            kb_id: kb_id.to_string(),
            region: body
                .get("region")
                .and_then(Value::as_str)
                .unwrap_or(DEFAULT_REGION)
                .to_string(),
            num_results: body
                .get("num_results")
                .and_then(Value::as_u64)
                .map(|n| n as usize)
                .unwrap_or(DEFAULT_NUM_RESULTS),
        };
        info!(kb_id = %request.kb_id, region = %request.region, "Querying knowledge base");

        match query_knowledge_base(self.kb.as_ref(), &request).await {
            Some(retrieval) => match serde_json::to_value(&retrieval) {
                Ok(body) => HttpResponse::json(200, &body),
                Err(e) => HttpResponse::error(500, format!("Internal server error: {}", e)),
            },
            None => HttpResponse::error(500, "Failed to query knowledge base"),
        }
    }
}

fn decode_body(event: &Value) -> Result<Value, serde_json::Error> {
    match event.get("body") {
        Some(Value::String(raw)) => serde_json::from_str(raw),
        Some(Value::Object(map)) => Ok(Value::Object(map.clone())),
        _ => Ok(json!({})),
    }
}
