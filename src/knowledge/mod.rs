//! Knowledge base retrieval
//!
//! Normalizes retrieval responses into flat [`Chunk`] lists, and hosts the
//! standalone HTTP-style query function (`handler`) the agents reach through
//! function invocation.
//!
//! # Flow
//!
//! ```text
//! agent function ──invoke──► kb query function ──Retrieve (HYBRID)──► knowledge base
//!                                   │
//!                                   ▼
//!                      {chunks: [{text, location, score, metadata}], raw_response}
//! ```

pub mod handler;

use serde::Serialize;
use serde_json::{Map, Value};
use tracing::{info, warn};

use crate::bedrock::{KnowledgeBase, RetrieveRequest, ServiceError};
use crate::metrics::RETRIEVAL_FAILURES_TOTAL;

pub use handler::{HttpResponse, KbQueryFunction};

/// One retrieved passage
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct Chunk {
    pub text: String,
    /// Free-form source location descriptor (e.g. an S3 location)
    pub location: Value,
    pub score: f64,
    pub metadata: Map<String, Value>,
}

impl Chunk {
    /// A chunk carrying only text, with empty score and metadata
    pub fn from_text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            location: Value::Null,
            score: 0.0,
            metadata: Map::new(),
        }
    }

    /// Build a chunk from loosely shaped JSON
    ///
    /// Absent fields take their defaults; a non-string `text` is kept in its
    /// JSON form rather than dropped.
    pub fn from_value(value: &Value) -> Self {
        let text = match value.get("text") {
            Some(Value::String(s)) => s.clone(),
            Some(Value::Null) | None => String::new(),
            Some(other) => other.to_string(),
        };
        Self {
            text,
            location: value.get("location").cloned().unwrap_or(Value::Null),
            score: value.get("score").and_then(Value::as_f64).unwrap_or(0.0),
            metadata: value
                .get("metadata")
                .and_then(Value::as_object)
                .cloned()
                .unwrap_or_default(),
        }
    }
}

/// Result of a successful retrieval
#[derive(Debug, Clone, Serialize)]
pub struct Retrieval {
    pub chunks: Vec<Chunk>,
    pub raw_response: Value,
}

/// Flatten the `retrievalResults` of a Retrieve response
///
/// A response without results yields an empty list.
pub fn normalize_results(response: &Value) -> Result<Vec<Chunk>, ServiceError> {
    let Some(results) = response.get("retrievalResults").and_then(Value::as_array) else {
        return Ok(Vec::new());
    };

    results
        .iter()
        .map(|result| {
            let text = result["content"]["text"]
                .as_str()
                .ok_or(ServiceError::MissingField("retrievalResults[].content.text"))?;
            Ok(Chunk {
                text: text.to_string(),
                location: result.get("location").cloned().unwrap_or(Value::Null),
                score: result.get("score").and_then(Value::as_f64).unwrap_or(0.0),
                metadata: result
                    .get("metadata")
                    .and_then(Value::as_object)
                    .cloned()
                    .unwrap_or_default(),
            })
        })
        .collect()
}

/// Query a knowledge base
///
/// Returns `None` on any transport or service failure; callers must treat
/// that as "no result", distinct from an empty chunk list.
pub async fn query_knowledge_base(
    kb: &dyn KnowledgeBase,
    request: &RetrieveRequest,
) -> Option<Retrieval> {
    let outcome = match kb.retrieve(request).await {
        Ok(raw) => normalize_results(&raw).map(|chunks| Retrieval {
            chunks,
            raw_response: raw,
        }),
        Err(e) => Err(e),
    };

    match outcome {
        Ok(retrieval) => {
            info!(
                kb_id = %request.kb_id,
                chunks = retrieval.chunks.len(),
                "Knowledge base query complete"
            );
            Some(retrieval)
        }
        Err(e) => {
            warn!(kb_id = %request.kb_id, error = %e, "Error querying knowledge base");
            RETRIEVAL_FAILURES_TOTAL.inc();
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use serde_json::json;

    struct StaticKb(Result<Value, u16>);

    #[async_trait]
    impl KnowledgeBase for StaticKb {
        async fn retrieve(&self, _request: &RetrieveRequest) -> Result<Value, ServiceError> {
            match &self.0 {
                Ok(v) => Ok(v.clone()),
                Err(status) => Err(ServiceError::Status {
                    status: *status,
                    body: "unavailable".to_string(),
                }),
            }
        }
    }

    fn request() -> RetrieveRequest {
        RetrieveRequest {
            query: "router firmware".to_string(),
            kb_id: "KB1".to_string(),
            region: "us-east-1".to_string(),
            num_results: 5,
        }
    }

    #[test]
    fn test_normalize_applies_defaults() {
        let response = json!({
            "retrievalResults": [
                {
                    "content": { "text": "GET /devices" },
                    "location": { "type": "S3", "s3Location": { "uri": "s3://b/api.md" } },
                    "score": 0.82,
                    "metadata": { "page": 3 }
                },
                { "content": { "text": "POST /notify" } }
            ]
        });
        let chunks = normalize_results(&response).unwrap();

        assert_eq!(chunks.len(), 2);
        assert_eq!(chunks[0].score, 0.82);
        assert_eq!(chunks[0].metadata["page"], 3);
        assert_eq!(chunks[0].location["type"], "S3");
        assert_eq!(chunks[1].text, "POST /notify");
        assert_eq!(chunks[1].score, 0.0);
        assert!(chunks[1].metadata.is_empty());
    }

    #[test]
    fn test_chunk_from_loose_value() {
        let chunk = Chunk::from_value(&json!({ "text": 42, "score": "high" }));
        assert_eq!(chunk.text, "42");
        assert_eq!(chunk.score, 0.0);
        assert_eq!(chunk.location, Value::Null);

        let chunk = Chunk::from_value(&json!({ "text": null }));
        assert_eq!(chunk.text, "");
    }

    #[tokio::test]
    async fn test_no_results_is_empty_not_error() {
        let kb = StaticKb(Ok(json!({ "retrievalResults": [] })));
        let retrieval = query_knowledge_base(&kb, &request()).await.unwrap();
        assert!(retrieval.chunks.is_empty());

        let kb = StaticKb(Ok(json!({})));
        let retrieval = query_knowledge_base(&kb, &request()).await.unwrap();
        assert!(retrieval.chunks.is_empty());
    }

    #[tokio::test]
    async fn test_service_error_is_sentinel() {
        let kb = StaticKb(Err(503));
        assert!(query_knowledge_base(&kb, &request()).await.is_none());
    }

    #[tokio::test]
    async fn test_malformed_result_is_sentinel() {
        let kb = StaticKb(Ok(json!({ "retrievalResults": [{ "score": 1.0 }] })));
        assert!(query_knowledge_base(&kb, &request()).await.is_none());
    }
}
