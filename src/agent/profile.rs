//! The two assistants this crate serves

use std::str::FromStr;

use crate::config::names;

/// Which assistant a deployment serves
///
/// Both agents share the dispatcher; they differ in names, the downstream
/// knowledge-base function, and the system instruction given to the model.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AgentProfile {
    HomeNetwork,
    Doorbell,
}

impl AgentProfile {
    pub fn agent_name(&self) -> &'static str {
        match self {
            AgentProfile::HomeNetwork => names::HOME_NETWORK_AGENT_NAME,
            AgentProfile::Doorbell => names::DOORBELL_AGENT_NAME,
        }
    }

    pub fn action_group(&self) -> &'static str {
        match self {
            AgentProfile::HomeNetwork => names::HOME_NETWORK_ACTION_GROUP_NAME,
            AgentProfile::Doorbell => names::DOORBELL_ACTION_GROUP_NAME,
        }
    }

    /// Default name of the knowledge-base query function for this agent
    pub fn kb_function_name(&self) -> &'static str {
        match self {
            AgentProfile::HomeNetwork => names::HOME_NETWORK_KB_LAMBDA_FUNCTION_NAME,
            AgentProfile::Doorbell => names::DOORBELL_KB_LAMBDA_FUNCTION_NAME,
        }
    }

    /// Fixed system instruction for code generation
    pub fn system_prompt(&self) -> &'static str {
        match self {
            AgentProfile::HomeNetwork => {
                "You are an AI assistant specialized in generating Python code for Home Networking API interactions."
            }
            AgentProfile::Doorbell => {
                "You are an AI assistant specialized in generating Python code for Doorbell API interactions."
            }
        }
    }
}

impl FromStr for AgentProfile {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "home-network" | "home_network" | "homenetwork" => Ok(AgentProfile::HomeNetwork),
            "doorbell" => Ok(AgentProfile::Doorbell),
            other => Err(format!("unknown agent profile: {}", other)),
        }
    }
}
