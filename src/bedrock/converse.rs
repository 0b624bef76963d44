//! Converse API for model inference

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::client::{BedrockClient, Service, ServiceError};

/// A content block; only text blocks are used here
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ContentBlock {
    pub text: String,
}

/// A message in a conversation
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Message {
    pub role: String, // "user", "assistant"
    pub content: Vec<ContentBlock>,
}

impl Message {
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            role: "user".to_string(),
            content: vec![ContentBlock { text: text.into() }],
        }
    }
}

/// Decoding parameters
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct InferenceConfig {
    pub temperature: f32,
    pub max_tokens: u32,
    pub top_p: f32,
}

/// One Converse call
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ConverseRequest {
    #[serde(skip)]
    pub model_id: String,
    pub messages: Vec<Message>,
    pub system: Vec<ContentBlock>,
    pub inference_config: InferenceConfig,
}

/// A model that answers a conversation
#[async_trait]
pub trait ModelRuntime: Send + Sync {
    /// Run the conversation and return the first text segment of the reply
    async fn converse(&self, request: &ConverseRequest) -> Result<String, ServiceError>;
}

#[async_trait]
impl ModelRuntime for BedrockClient {
    async fn converse(&self, request: &ConverseRequest) -> Result<String, ServiceError> {
        let region = self.region();
        let url = self.service_url(
            Service::ModelRuntime,
            region,
            &["model", request.model_id.as_str(), "converse"],
        )?;
        let response = self
            .post_json(Service::ModelRuntime, region, url, request)
            .await?;
        first_text(&response)
    }
}

/// Extract `output.message.content[0].text` from a Converse response
pub fn first_text(response: &Value) -> Result<String, ServiceError> {
    response["output"]["message"]["content"][0]["text"]
        .as_str()
        .map(str::to_string)
        .ok_or(ServiceError::MissingField("output.message.content[0].text"))
}
