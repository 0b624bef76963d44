//! homebell - agent action-group functions for a home-network / doorbell assistant
//!
//! Two deployable functions live here: the agent function, which routes the
//! agent runtime's calls to knowledge retrieval, code generation, persistence
//! and execution, and a standalone knowledge base query function with an
//! HTTP-style contract.
//!
//! # Modules
//!
//! - `agent` - Invocation types, dispatcher, chunk recovery
//! - `bedrock` - REST clients for retrieval, prompts, models and function invoke
//! - `knowledge` - Retrieval normalization and the kb query function
//! - `generation` - Prompt templates and code generation
//! - `execution` - Saving and running generated scripts
//! - `devices` - Camera and doorbell API clients
//! - `runtime` - Runtime API loop and handlers
//! - `config` - Environment configuration
//! - `metrics` - Prometheus metrics for observability
//! - `tracing` - Logging and OpenTelemetry export
//!
//! # Quick Start
//!
//! ```ignore
//! use std::sync::Arc;
//! use homebell::{BedrockClient, Dispatcher, FunctionConfig, Invocation};
//!
//! let config = FunctionConfig::from_env()?;
//! let client = Arc::new(BedrockClient::from_config(&config)?);
//! let dispatcher = Dispatcher::with_client(config, client);
//!
//! let invocation = Invocation::new("ag", "query_knowledge_base")
//!     .with_parameter("query", "how do I check signal strength?");
//! let envelope = dispatcher.handle(&invocation).await;
//! ```

pub mod agent;
pub mod bedrock;
pub mod config;
pub mod devices;
pub mod execution;
pub mod generation;
pub mod knowledge;
pub mod metrics;
pub mod runtime;
pub mod tracing;

// Re-export commonly used types at crate root for convenience
pub use agent::{Dispatcher, Invocation, ResponseEnvelope};
pub use bedrock::BedrockClient;
pub use config::FunctionConfig;
pub use knowledge::KbQueryFunction;
pub use runtime::{FunctionKind, Handler};
