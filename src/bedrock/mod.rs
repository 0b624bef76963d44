//! Managed service integration module
//!
//! This module provides an HTTP client for the managed services the agent
//! functions delegate to, and one trait per service so handlers can be
//! given any implementation (the real client, or a stub in tests):
//!
//! - [`KnowledgeBase`] - hybrid retrieval against a knowledge base
//! - [`PromptStore`] - prompt template lookup
//! - [`ModelRuntime`] - Converse-style model inference
//! - [`FunctionInvoker`] - synchronous invocation of another function

pub mod client;
pub mod converse;
pub mod functions;
pub mod prompts;
pub mod retrieve;
pub mod signing;

// Re-export public types so callers can `use crate::bedrock::KnowledgeBase`
pub use client::{BedrockClient, Service, ServiceError};
pub use converse::{ContentBlock, ConverseRequest, InferenceConfig, Message, ModelRuntime};
pub use functions::FunctionInvoker;
pub use prompts::PromptStore;
pub use retrieve::{KnowledgeBase, RetrieveRequest};
pub use signing::RequestSigner;
