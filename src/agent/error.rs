//! Errors raised while serving one agent function call
//!
//! None of these escape the dispatcher; each becomes the `error` field of a
//! response envelope.

use crate::bedrock::ServiceError;
use crate::config::ConfigError;
use crate::generation::GenerationError;

#[derive(Debug)]
pub enum FunctionError {
    /// The function name matched none of the four operations
    UnknownFunction(String),
    /// A parameter the operation needs was not passed
    MissingParameter(&'static str),
    Config(ConfigError),
    Service(ServiceError),
    /// The knowledge base function answered with an error
    KnowledgeBase(String),
    Generation(GenerationError),
    Io(std::io::Error),
}

impl std::fmt::Display for FunctionError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FunctionError::UnknownFunction(name) => write!(f, "Unknown function: {}", name),
            FunctionError::MissingParameter(name) => {
                write!(f, "Missing required parameter: {}", name)
            }
            FunctionError::Config(e) => write!(f, "{}", e),
            FunctionError::Service(e) => write!(f, "{}", e),
            FunctionError::KnowledgeBase(msg) => write!(f, "Knowledge base query failed: {}", msg),
            FunctionError::Generation(e) => write!(f, "Error generating code: {}", e),
            FunctionError::Io(e) => write!(f, "IO error: {}", e),
        }
    }
}

impl std::error::Error for FunctionError {}

impl From<ConfigError> for FunctionError {
    fn from(e: ConfigError) -> Self {
        FunctionError::Config(e)
    }
}

impl From<ServiceError> for FunctionError {
    fn from(e: ServiceError) -> Self {
        FunctionError::Service(e)
    }
}

impl From<GenerationError> for FunctionError {
    fn from(e: GenerationError) -> Self {
        FunctionError::Generation(e)
    }
}

impl From<std::io::Error> for FunctionError {
    fn from(e: std::io::Error) -> Self {
        FunctionError::Io(e)
    }
}
