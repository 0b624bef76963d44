//! Process configuration for the agent functions
//!
//! Everything is read from the function's environment. Variable names match
//! the ones the deployment scripts already set on the functions, which is why
//! some of them are lowercase.
//!
//! Fields only the code-generation path needs (prompt id, auth token) are
//! optional here and validated when that path runs, so the knowledge-base
//! function can be deployed with a much smaller environment.

use std::collections::HashMap;
use std::time::Duration;

use crate::agent::AgentProfile;

/// Names shared with the deployment tooling (agents, functions, models)
pub mod names {
    pub const HOME_NETWORK_AGENT_NAME: &str = "home-network-assistant";
    pub const HOME_NETWORK_ACTION_GROUP_NAME: &str = "homenetwork-ag";
    pub const HOME_NETWORK_KB_LAMBDA_FUNCTION_NAME: &str = "kb-query-function-home-network";

    pub const DOORBELL_AGENT_NAME: &str = "doorbell-assistant";
    pub const DOORBELL_ACTION_GROUP_NAME: &str = "doorbellag";
    pub const DOORBELL_KB_LAMBDA_FUNCTION_NAME: &str = "kb-query-function-doorbell";

    pub const BEDROCK_MODEL_NOVA_PRO: &str = "amazon.nova-pro-v1:0";
    pub const BEDROCK_MODEL_NOVA_MICRO: &str = "amazon.nova-micro-v1:0";
    pub const BEDROCK_MODEL_NOVA_LITE: &str = "amazon.nova-lite-v1:0";
    pub const BEDROCK_MODEL_CLAUDE_3_HAIKU: &str = "anthropic.claude-3-haiku-20240307-v1:0";

    pub const DEFAULT_REGION: &str = "us-east-1";
}

/// Error type for configuration problems
#[derive(Debug, Clone, PartialEq)]
pub enum ConfigError {
    /// A variable required by the current operation is not set
    Missing(&'static str),
    /// A variable is set but cannot be parsed
    Invalid { key: &'static str, value: String },
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::Missing(key) => write!(f, "Missing configuration: {}", key),
            ConfigError::Invalid { key, value } => {
                write!(f, "Invalid value for {}: '{}'", key, value)
            }
        }
    }
}

impl std::error::Error for ConfigError {}

/// Explicit endpoint overrides for the managed services
///
/// When a field is `None` the regional public endpoint is used.
#[derive(Debug, Clone, Default)]
pub struct ServiceEndpoints {
    /// Retrieval API (`bedrock-agent-runtime`)
    pub agent_runtime: Option<String>,
    /// Prompt management API (`bedrock-agent`)
    pub agent: Option<String>,
    /// Model inference API (`bedrock-runtime`)
    pub model_runtime: Option<String>,
    /// Function invocation API (`lambda`)
    pub functions: Option<String>,
}

/// Configuration shared by both agent functions
#[derive(Debug, Clone)]
pub struct FunctionConfig {
    /// Region for all service calls
    pub region: String,
    /// Which agent this deployment serves
    pub profile: AgentProfile,
    /// Knowledge base queried by the downstream function
    pub kb_id: Option<String>,
    /// Name of the downstream knowledge-base query function
    pub kb_function_name: String,
    /// Number of chunks requested from the knowledge base
    pub num_results: usize,
    /// Model used for code generation
    pub model_id: String,
    pub temperature: f32,
    pub top_p: f32,
    pub max_tokens: u32,
    /// Prompt-management identifier of the code generation template
    pub prompt_id: Option<String>,
    /// Bearer token injected into generated scripts
    pub auth_token: Option<String>,
    /// Interpreter used to run generated scripts
    pub interpreter: String,
    /// Wall-clock limit for one script execution
    pub execution_timeout_secs: u64,
    /// Bearer API key for the model runtime; every other call is SigV4-signed
    pub api_key: Option<String>,
    /// Per-request timeout for outbound HTTP calls
    pub http_timeout_secs: u64,
    pub endpoints: ServiceEndpoints,
}

impl Default for FunctionConfig {
    fn default() -> Self {
        let profile = AgentProfile::HomeNetwork;
        Self {
            region: names::DEFAULT_REGION.to_string(),
            kb_function_name: profile.kb_function_name().to_string(),
            profile,
            kb_id: None,
            num_results: 5,
            model_id: names::BEDROCK_MODEL_NOVA_PRO.to_string(),
            temperature: 0.1,
            top_p: 0.9,
            max_tokens: 2048,
            prompt_id: None,
            auth_token: None,
            interpreter: "python3".to_string(),
            execution_timeout_secs: 60,
            api_key: None,
            http_timeout_secs: 30,
            endpoints: ServiceEndpoints::default(),
        }
    }
}

impl FunctionConfig {
    /// Load configuration from the process environment
    pub fn from_env() -> Result<Self, ConfigError> {
        let vars: HashMap<String, String> = std::env::vars().collect();
        Self::from_lookup(|key| vars.get(key).cloned())
    }

    /// Load configuration from any key-value source
    ///
    /// Unset and empty variables both fall back to the default.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let mut config = Self::default();

        if let Some(profile) = get("AGENT_PROFILE") {
            config.profile = profile.parse().map_err(|_| ConfigError::Invalid {
                key: "AGENT_PROFILE",
                value: profile,
            })?;
            config.kb_function_name = config.profile.kb_function_name().to_string();
        }
        if let Some(region) = get("REGION") {
            config.region = region;
        }
        config.kb_id = get("KB_ID");
        if let Some(name) = get("HOME_NETWORK_KB_LAMBDA_FUNCTION_NAME") {
            config.kb_function_name = name;
        }
        if let Some(model) = get("code_generation_model") {
            config.model_id = model;
        }
        config.temperature = parse_or(&get, "temperature", config.temperature)?;
        config.top_p = parse_or(&get, "top_p", config.top_p)?;
        config.max_tokens = parse_or(&get, "max_tokens", config.max_tokens)?;
        config.num_results = parse_or(&get, "NUM_RESULTS", config.num_results)?;
        config.prompt_id = get("CODE_GEN_PROMPT_ID");
        config.auth_token = get("HOME_NETWORK_AUTH_TOKEN");
        if let Some(interpreter) = get("SCRIPT_INTERPRETER") {
            config.interpreter = interpreter;
        }
        config.execution_timeout_secs =
            parse_or(&get, "code_execution_timeout", config.execution_timeout_secs)?;
        config.api_key = get("BEDROCK_API_KEY");
        config.http_timeout_secs = parse_or(&get, "HTTP_TIMEOUT_SECS", config.http_timeout_secs)?;
        config.endpoints = ServiceEndpoints {
            agent_runtime: get("BEDROCK_AGENT_RUNTIME_ENDPOINT"),
            agent: get("BEDROCK_AGENT_ENDPOINT"),
            model_runtime: get("BEDROCK_RUNTIME_ENDPOINT"),
            functions: get("LAMBDA_ENDPOINT"),
        };

        Ok(config)
    }

    pub fn execution_timeout(&self) -> Duration {
        Duration::from_secs(self.execution_timeout_secs)
    }

    pub fn http_timeout(&self) -> Duration {
        Duration::from_secs(self.http_timeout_secs)
    }
}

/// Return a required optional field or name the variable that is missing
pub fn require<'a>(value: &'a Option<String>, key: &'static str) -> Result<&'a str, ConfigError> {
    value.as_deref().ok_or(ConfigError::Missing(key))
}

fn parse_or<T, G>(get: &G, key: &'static str, default: T) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    G: Fn(&str) -> Option<String>,
{
    match get(key) {
        Some(raw) => raw.trim().parse().map_err(|_| ConfigError::Invalid { key, value: raw }),
        None => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults_without_environment() {
        let config = FunctionConfig::from_lookup(|_| None).unwrap();

        assert_eq!(config.region, "us-east-1");
        assert_eq!(config.profile, AgentProfile::HomeNetwork);
        assert_eq!(config.kb_function_name, names::HOME_NETWORK_KB_LAMBDA_FUNCTION_NAME);
        assert_eq!(config.num_results, 5);
        assert_eq!(config.interpreter, "python3");
        assert!(config.prompt_id.is_none());
        assert!(config.auth_token.is_none());
    }

    #[test]
    fn test_reads_deployment_variables() {
        let config = FunctionConfig::from_lookup(lookup_from(&[
            ("REGION", "eu-west-1"),
            ("KB_ID", "KB123"),
            ("code_generation_model", names::BEDROCK_MODEL_CLAUDE_3_HAIKU),
            ("temperature", "0.3"),
            ("top_p", "0.5"),
            ("max_tokens", "1024"),
            ("CODE_GEN_PROMPT_ID", "PROMPT1"),
            ("code_execution_timeout", "15"),
            ("HOME_NETWORK_AUTH_TOKEN", "secret"),
        ]))
        .unwrap();

        assert_eq!(config.region, "eu-west-1");
        assert_eq!(config.kb_id.as_deref(), Some("KB123"));
        assert_eq!(config.model_id, names::BEDROCK_MODEL_CLAUDE_3_HAIKU);
        assert_eq!(config.temperature, 0.3);
        assert_eq!(config.top_p, 0.5);
        assert_eq!(config.max_tokens, 1024);
        assert_eq!(config.prompt_id.as_deref(), Some("PROMPT1"));
        assert_eq!(config.execution_timeout(), Duration::from_secs(15));
        assert_eq!(config.auth_token.as_deref(), Some("secret"));
    }

    #[test]
    fn test_doorbell_profile_switches_kb_function() {
        let config =
            FunctionConfig::from_lookup(lookup_from(&[("AGENT_PROFILE", "doorbell")])).unwrap();
        assert_eq!(config.profile, AgentProfile::Doorbell);
        assert_eq!(config.kb_function_name, names::DOORBELL_KB_LAMBDA_FUNCTION_NAME);

        // An explicit function name still wins over the profile default
        let config = FunctionConfig::from_lookup(lookup_from(&[
            ("AGENT_PROFILE", "doorbell"),
            ("HOME_NETWORK_KB_LAMBDA_FUNCTION_NAME", "custom-kb"),
        ]))
        .unwrap();
        assert_eq!(config.kb_function_name, "custom-kb");
    }

    #[test]
    fn test_invalid_number_is_reported() {
        let err = FunctionConfig::from_lookup(lookup_from(&[("max_tokens", "lots")])).unwrap_err();
        assert_eq!(
            err,
            ConfigError::Invalid {
                key: "max_tokens",
                value: "lots".to_string()
            }
        );
        assert!(err.to_string().contains("max_tokens"));
    }

    #[test]
    fn test_require_names_missing_key() {
        let err = require(&None, "CODE_GEN_PROMPT_ID").unwrap_err();
        assert_eq!(err.to_string(), "Missing configuration: CODE_GEN_PROMPT_ID");
        assert_eq!(require(&Some("x".to_string()), "K").unwrap(), "x");
    }
}
