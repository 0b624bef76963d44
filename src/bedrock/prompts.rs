//! Prompt management API

use async_trait::async_trait;
use serde_json::Value;

use super::client::{BedrockClient, Service, ServiceError};

/// A store of named prompt templates
#[async_trait]
pub trait PromptStore: Send + Sync {
    /// Fetch the template text of a prompt by identifier
    async fn get_prompt(&self, prompt_id: &str) -> Result<String, ServiceError>;
}

#[async_trait]
impl PromptStore for BedrockClient {
    async fn get_prompt(&self, prompt_id: &str) -> Result<String, ServiceError> {
        let region = self.region();
        let url = self.service_url(Service::Agent, region, &["prompts", prompt_id])?;
        let response = self.get_json(Service::Agent, region, url).await?;
        template_text(&response)
    }
}

/// Pull the first variant's template text out of a GetPrompt response
pub fn template_text(response: &Value) -> Result<String, ServiceError> {
    response["variants"][0]["templateConfiguration"]["text"]["text"]
        .as_str()
        .map(str::to_string)
        .ok_or(ServiceError::MissingField(
            "variants[0].templateConfiguration.text.text",
        ))
}
