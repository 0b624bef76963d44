//! Code generation from retrieved API documentation
//!
//! ```text
//! chunks ──join("\n")──► kb_content ─┐
//! user query / input params ─────────┼──► prompt template ──► model ──► script text
//! auth token (from config) ──────────┘
//! ```
//!
//! The first text segment of the model's reply is returned verbatim. It is
//! not checked for being valid source; running it is the execution step's job.

pub mod template;

use std::sync::Arc;
use std::time::Instant;

use tracing::{debug, info};

use crate::bedrock::{
    ContentBlock, ConverseRequest, InferenceConfig, Message, ModelRuntime, PromptStore,
    ServiceError,
};
use crate::config::{require, ConfigError, FunctionConfig};
use crate::knowledge::Chunk;
use crate::metrics::GENERATION_DURATION;

pub use template::{render, TemplateError};

/// Error type for code generation
#[derive(Debug)]
pub enum GenerationError {
    Config(ConfigError),
    /// The template store or the model failed
    Service(ServiceError),
    Template(TemplateError),
}

impl std::fmt::Display for GenerationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            GenerationError::Config(e) => write!(f, "{}", e),
            GenerationError::Service(e) => write!(f, "Model service error: {}", e),
            GenerationError::Template(e) => write!(f, "Prompt template error: {}", e),
        }
    }
}

impl std::error::Error for GenerationError {}

impl From<ConfigError> for GenerationError {
    fn from(e: ConfigError) -> Self {
        GenerationError::Config(e)
    }
}

impl From<ServiceError> for GenerationError {
    fn from(e: ServiceError) -> Self {
        GenerationError::Service(e)
    }
}

impl From<TemplateError> for GenerationError {
    fn from(e: TemplateError) -> Self {
        GenerationError::Template(e)
    }
}

/// Everything a generation call needs from configuration
#[derive(Debug, Clone)]
pub struct GenerationSettings {
    pub model_id: String,
    pub prompt_id: String,
    pub temperature: f32,
    pub top_p: f32,
    pub max_tokens: u32,
    pub auth_token: String,
    pub system_prompt: String,
}

impl GenerationSettings {
    /// Validate the generation-only fields of the function configuration
    pub fn from_config(config: &FunctionConfig) -> Result<Self, ConfigError> {
        Ok(Self {
            model_id: config.model_id.clone(),
            prompt_id: require(&config.prompt_id, "CODE_GEN_PROMPT_ID")?.to_string(),
            temperature: config.temperature,
            top_p: config.top_p,
            max_tokens: config.max_tokens,
            auth_token: require(&config.auth_token, "HOME_NETWORK_AUTH_TOKEN")?.to_string(),
            system_prompt: config.profile.system_prompt().to_string(),
        })
    }
}

/// Generates scripts from a prompt template and a model
#[derive(Clone)]
pub struct CodeGenerator {
    prompts: Arc<dyn PromptStore>,
    model: Arc<dyn ModelRuntime>,
}

impl CodeGenerator {
    pub fn new(prompts: Arc<dyn PromptStore>, model: Arc<dyn ModelRuntime>) -> Self {
        Self { prompts, model }
    }

    /// Generate a script for `query` using `chunks` as context
    ///
    /// # Arguments
    /// * `settings` - Model, template id, decoding parameters, auth token
    /// * `chunks` - Retrieved documentation; texts are joined with newlines
    /// * `query` - The user's request
    /// * `input_params` - Extra values the user supplied, if any
    ///
    /// A missing template is propagated; there is nothing to fall back to.
    pub async fn generate_code(
        &self,
        settings: &GenerationSettings,
        chunks: &[Chunk],
        query: &str,
        input_params: Option<&str>,
    ) -> Result<String, GenerationError> {
        info!(prompt_id = %settings.prompt_id, "Reading prompt template");
        let template = self.prompts.get_prompt(&settings.prompt_id).await?;

        let kb_content = chunks
            .iter()
            .map(|c| c.text.as_str())
            .collect::<Vec<_>>()
            .join("\n");

        let user_message = render(
            &template,
            &[
                ("kb_content", kb_content.as_str()),
                ("user_query", query),
                ("input_params", input_params.unwrap_or_default()),
                ("auth_token", settings.auth_token.as_str()),
            ],
        )?;
        debug!(
            message = %redact(&user_message, &settings.auth_token),
            "Rendered code generation prompt"
        );

        let request = ConverseRequest {
            model_id: settings.model_id.clone(),
            messages: vec![Message::user(user_message)],
            system: vec![ContentBlock {
                text: settings.system_prompt.clone(),
            }],
            inference_config: InferenceConfig {
                temperature: settings.temperature,
                max_tokens: settings.max_tokens,
                top_p: settings.top_p,
            },
        };

        let start = Instant::now();
        let code = self.model.converse(&request).await?;
        let latency = start.elapsed().as_secs_f64();
        GENERATION_DURATION.observe(latency);

        info!(
            model = %settings.model_id,
            latency_secs = latency,
            code_len = code.len(),
            "Generated code"
        );
        Ok(code)
    }
}

/// `text` with every occurrence of `secret` masked
fn redact(text: &str, secret: &str) -> String {
    if secret.is_empty() {
        return text.to_string();
    }
    text.replace(secret, "[REDACTED]")
}
