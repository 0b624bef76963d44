//! Function Dispatcher - routes agent runtime calls to their operation
//!
//! The dispatcher owns the one hard rule of the agent functions: every
//! invocation gets exactly one well-formed envelope back. Operations return
//! `Result<Value, FunctionError>`; `handle` turns either side into a body.

use std::path::Path;
use std::sync::Arc;

use serde_json::{json, Value};
use tracing::{error, info, info_span, warn, Instrument};
use uuid::Uuid;

use super::error::FunctionError;
use super::invocation::{Invocation, ResponseEnvelope};
use super::knowledge::KbFunctionClient;
use super::recovery::recover_chunks;
use crate::bedrock::{BedrockClient, FunctionInvoker, ModelRuntime, PromptStore};
use crate::config::FunctionConfig;
use crate::execution::{execute_generated_code, save_generated_code, ExecutionConfig};
use crate::generation::{CodeGenerator, GenerationSettings};
use crate::metrics::INVOCATIONS_TOTAL;

/// The four operations an agent can call
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AgentFunction {
    QueryKnowledgeBase,
    GenerateCode,
    SaveGeneratedCode,
    ExecuteGeneratedCode,
}

impl AgentFunction {
    pub const ALL: [AgentFunction; 4] = [
        AgentFunction::QueryKnowledgeBase,
        AgentFunction::GenerateCode,
        AgentFunction::SaveGeneratedCode,
        AgentFunction::ExecuteGeneratedCode,
    ];

    /// Exact, case-sensitive match on the runtime's function name
    pub fn parse(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|f| f.as_str() == name)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            AgentFunction::QueryKnowledgeBase => "query_knowledge_base",
            AgentFunction::GenerateCode => "generate_code",
            AgentFunction::SaveGeneratedCode => "save_generated_code",
            AgentFunction::ExecuteGeneratedCode => "execute_generated_code",
        }
    }
}

/// Dispatcher for one agent function deployment
pub struct Dispatcher {
    config: FunctionConfig,
    knowledge: KbFunctionClient,
    generator: CodeGenerator,
    execution: ExecutionConfig,
}

impl Dispatcher {
    /// Create a dispatcher over explicit service implementations
    pub fn new(
        config: FunctionConfig,
        invoker: Arc<dyn FunctionInvoker>,
        prompts: Arc<dyn PromptStore>,
        model: Arc<dyn ModelRuntime>,
    ) -> Self {
        let knowledge = KbFunctionClient::new(
            invoker,
            config.kb_function_name.clone(),
            config.kb_id.clone(),
            config.region.clone(),
            config.num_results,
        );
        let execution = ExecutionConfig::from_config(&config);
        Self {
            generator: CodeGenerator::new(prompts, model),
            knowledge,
            execution,
            config,
        }
    }

    /// Create a dispatcher backed by one shared service client
    pub fn with_client(config: FunctionConfig, client: Arc<BedrockClient>) -> Self {
        Self::new(config, client.clone(), client.clone(), client)
    }

    /// Handle one invocation; never fails
    pub async fn handle(&self, invocation: &Invocation) -> ResponseEnvelope {
        let trace_id = Uuid::now_v7().to_string();
        let profile = self.config.profile;
        let span = info_span!(
            "agent_function",
            trace_id = %trace_id,
            agent = profile.agent_name(),
            function = %invocation.function,
            action_group = %invocation.action_group,
            otel.name = "agent_function"
        );

        async {
            info!(
                parameters = ?invocation.parameters,
                input_params = ?invocation.parameter("input_params"),
                "Received invocation"
            );
            if invocation.action_group != profile.action_group() {
                warn!(
                    expected = profile.action_group(),
                    "Invocation is for a different action group than this deployment's"
                );
            }

            let label = AgentFunction::parse(&invocation.function)
                .map(|f| f.as_str())
                .unwrap_or("unknown");

            let body = match self.route(invocation).await {
                Ok(data) => {
                    INVOCATIONS_TOTAL.with_label_values(&[label, "ok"]).inc();
                    info!(response = %data, "Function completed");
                    data
                }
                Err(e) => {
                    INVOCATIONS_TOTAL.with_label_values(&[label, "error"]).inc();
                    let message = format!("Error processing request: {}", e);
                    error!(error = %e, "{}", message);
                    json!({ "error": message, "status": "Error occurred" })
                }
            };

            ResponseEnvelope::new(invocation, &body)
        }
        .instrument(span)
        .await
    }

    async fn route(&self, invocation: &Invocation) -> Result<Value, FunctionError> {
        let function = AgentFunction::parse(&invocation.function)
            .ok_or_else(|| FunctionError::UnknownFunction(invocation.function.clone()))?;

        match function {
            AgentFunction::QueryKnowledgeBase => self.query_knowledge_base(invocation).await,
            AgentFunction::GenerateCode => self.generate_code(invocation).await,
            AgentFunction::SaveGeneratedCode => self.save_generated_code(invocation),
            AgentFunction::ExecuteGeneratedCode => self.execute_generated_code(invocation).await,
        }
    }

    async fn query_knowledge_base(&self, invocation: &Invocation) -> Result<Value, FunctionError> {
        let query = required(invocation, "query")?;
        let chunks = self.knowledge.query(query).await?;

        let chunks: Vec<Value> = chunks
            .iter()
            .map(|c| json!({ "text": c.text, "score": c.score }))
            .collect();

        Ok(json!({
            "chunks": chunks,
            "user_query": query,
            "status": "KB content retrieved successfully."
        }))
    }

    async fn generate_code(&self, invocation: &Invocation) -> Result<Value, FunctionError> {
        // An empty chunk list string counts as absent
        let raw_chunks = required(invocation, "chunks")
            .ok()
            .filter(|raw| !raw.trim().is_empty())
            .ok_or(FunctionError::MissingParameter("chunks"))?;
        let query = required(invocation, "query")?;
        let input_params = invocation.parameter("input_params");

        let settings = GenerationSettings::from_config(&self.config)?;
        let chunks = recover_chunks(raw_chunks).into_chunks();
        info!(chunks = chunks.len(), query, "Generating code");

        let code = self
            .generator
            .generate_code(&settings, &chunks, query, input_params)
            .await?;

        Ok(json!({
            "original_generated_code": code,
            "input_params": input_params,
            "status": "Code generated successfully"
        }))
    }

    fn save_generated_code(&self, invocation: &Invocation) -> Result<Value, FunctionError> {
        let code = required(invocation, "code_content")?;
        let path = save_generated_code(code)?;
        let path = path.display().to_string();

        Ok(json!({
            "file_path": path,
            "status": format!("Code is saved to {}", path)
        }))
    }

    async fn execute_generated_code(
        &self,
        invocation: &Invocation,
    ) -> Result<Value, FunctionError> {
        let path = required(invocation, "file_path")?;
        let result = execute_generated_code(Path::new(path), &self.execution).await;

        Ok(json!({ "execution_result": result }))
    }
}

fn required<'a>(invocation: &'a Invocation, name: &'static str) -> Result<&'a str, FunctionError> {
    invocation
        .parameter(name)
        .ok_or(FunctionError::MissingParameter(name))
}
