//! Knowledge base retrieval API

use async_trait::async_trait;
use serde_json::{json, Value};

use super::client::{BedrockClient, Service, ServiceError};

/// Search type requested from the knowledge base (lexical + vector)
pub const HYBRID_SEARCH: &str = "HYBRID";

/// A single retrieval request
#[derive(Debug, Clone, PartialEq)]
pub struct RetrieveRequest {
    pub query: String,
    pub kb_id: String,
    pub region: String,
    pub num_results: usize,
}

impl RetrieveRequest {
    /// JSON body of the Retrieve call
    pub fn body(&self) -> Value {
        json!({
            "retrievalQuery": { "text": self.query },
            "retrievalConfiguration": {
                "vectorSearchConfiguration": {
                    "numberOfResults": self.num_results,
                    "overrideSearchType": HYBRID_SEARCH
                }
            }
        })
    }
}

/// A knowledge base that can be searched by free text
#[async_trait]
pub trait KnowledgeBase: Send + Sync {
    /// Run one retrieval and return the raw service response
    async fn retrieve(&self, request: &RetrieveRequest) -> Result<Value, ServiceError>;
}

#[async_trait]
impl KnowledgeBase for BedrockClient {
    async fn retrieve(&self, request: &RetrieveRequest) -> Result<Value, ServiceError> {
        let url = self.service_url(
            Service::AgentRuntime,
            &request.region,
            &["knowledgebases", request.kb_id.as_str(), "retrieve"],
        )?;
        tracing::debug!(kb_id = %request.kb_id, region = %request.region, "Retrieve request");
        self.post_json(Service::AgentRuntime, &request.region, url, &request.body())
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_body_requests_hybrid_search() {
        let request = RetrieveRequest {
            query: "wifi extender".to_string(),
            kb_id: "KB1".to_string(),
            region: "us-east-1".to_string(),
            num_results: 3,
        };
        let body = request.body();

        assert_eq!(body["retrievalQuery"]["text"], "wifi extender");
        let search = &body["retrievalConfiguration"]["vectorSearchConfiguration"];
        assert_eq!(search["numberOfResults"], 3);
        assert_eq!(search["overrideSearchType"], "HYBRID");
        // The id and region are addressing, not payload
        assert!(body.get("kb_id").is_none());
    }
}
