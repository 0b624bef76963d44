//! Event handlers for the two deployable functions

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;

use crate::agent::{Dispatcher, Invocation};
use crate::bedrock::{BedrockClient, ServiceError};
use crate::config::FunctionConfig;
use crate::knowledge::KbQueryFunction;

/// Which function a process serves
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum FunctionKind {
    /// Agent action-group function (dispatcher)
    Agent,
    /// Standalone knowledge base query function
    Kb,
}

/// Error type for handler failures the runtime should see as errors
#[derive(Debug)]
pub enum HandlerError {
    /// The event could not be read as this function's input
    InvalidEvent(serde_json::Error),
    Serialize(serde_json::Error),
}

impl HandlerError {
    /// Error type reported to the runtime
    pub fn error_type(&self) -> &'static str {
        match self {
            HandlerError::InvalidEvent(_) => "Function.InvalidEvent",
            HandlerError::Serialize(_) => "Function.SerializationError",
        }
    }
}

impl std::fmt::Display for HandlerError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            HandlerError::InvalidEvent(e) => write!(f, "Invalid event: {}", e),
            HandlerError::Serialize(e) => write!(f, "Could not serialize response: {}", e),
        }
    }
}

impl std::error::Error for HandlerError {}

/// A function body: one JSON event in, one JSON response out
#[async_trait]
pub trait Handler: Send + Sync {
    fn name(&self) -> &'static str;

    async fn call(&self, event: Value) -> Result<Value, HandlerError>;
}

/// Agent function: invocation in, envelope out
pub struct AgentHandler {
    dispatcher: Dispatcher,
}

impl AgentHandler {
    pub fn new(dispatcher: Dispatcher) -> Self {
        Self { dispatcher }
    }
}

#[async_trait]
impl Handler for AgentHandler {
    fn name(&self) -> &'static str {
        "agent"
    }

    async fn call(&self, event: Value) -> Result<Value, HandlerError> {
        let invocation: Invocation =
            serde_json::from_value(event).map_err(HandlerError::InvalidEvent)?;
        let envelope = self.dispatcher.handle(&invocation).await;
        serde_json::to_value(&envelope).map_err(HandlerError::Serialize)
    }
}

/// Knowledge base query function: HTTP-style event in, HTTP-style response out
pub struct KbHandler {
    function: KbQueryFunction,
}

impl KbHandler {
    pub fn new(function: KbQueryFunction) -> Self {
        Self { function }
    }
}

#[async_trait]
impl Handler for KbHandler {
    fn name(&self) -> &'static str {
        "kb"
    }

    async fn call(&self, event: Value) -> Result<Value, HandlerError> {
        let response = self.function.handle(&event).await;
        serde_json::to_value(&response).map_err(HandlerError::Serialize)
    }
}

/// Build the handler for `kind` over the real service client
pub fn build_handler(
    kind: FunctionKind,
    config: FunctionConfig,
) -> Result<Box<dyn Handler>, ServiceError> {
    let client = Arc::new(BedrockClient::from_config(&config)?);
    Ok(match kind {
        FunctionKind::Agent => Box::new(AgentHandler::new(Dispatcher::with_client(config, client))),
        FunctionKind::Kb => Box::new(KbHandler::new(KbQueryFunction::new(client))),
    })
}
