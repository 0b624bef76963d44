//! Agent runtime invocation and response envelope

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A named parameter; the runtime passes every value as a string
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Parameter {
    pub name: String,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub param_type: Option<String>,
    #[serde(default)]
    pub value: String,
}

impl Parameter {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            param_type: Some("string".to_string()),
            value: value.into(),
        }
    }
}

/// One function call from the agent runtime
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Invocation {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message_version: Option<String>,
    #[serde(default)]
    pub action_group: String,
    #[serde(default)]
    pub function: String,
    #[serde(default)]
    pub parameters: Vec<Parameter>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub session_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub input_text: Option<String>,
}

impl Invocation {
    pub fn new(action_group: impl Into<String>, function: impl Into<String>) -> Self {
        Self {
            action_group: action_group.into(),
            function: function.into(),
            ..Default::default()
        }
    }

    pub fn with_parameter(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.parameters.push(Parameter::new(name, value));
        self
    }

    /// Value of the first parameter called `name`
    pub fn parameter(&self, name: &str) -> Option<&str> {
        self.parameters
            .iter()
            .find(|p| p.name == name)
            .map(|p| p.value.as_str())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TextBody {
    pub body: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ResponseBody {
    #[serde(rename = "TEXT")]
    pub text: TextBody,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct FunctionResponse {
    pub response_body: ResponseBody,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ActionResponse {
    pub action_group: String,
    pub function: String,
    pub function_response: FunctionResponse,
}

/// The response shape the agent runtime requires
///
/// ```text
/// {response: {actionGroup, function, functionResponse: {responseBody: {TEXT: {body}}}}}
/// ```
///
/// `body` is always a string; structured results are stringified JSON.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ResponseEnvelope {
    pub response: ActionResponse,
}

impl ResponseEnvelope {
    /// Wrap `result` for the invocation it answers
    pub fn new(invocation: &Invocation, result: &Value) -> Self {
        Self {
            response: ActionResponse {
                action_group: invocation.action_group.clone(),
                function: invocation.function.clone(),
                function_response: FunctionResponse {
                    response_body: ResponseBody {
                        text: TextBody {
                            body: result.to_string(),
                        },
                    },
                },
            },
        }
    }

    pub fn body(&self) -> &str {
        &self.response.function_response.response_body.text.body
    }

    /// The body decoded back into JSON
    pub fn body_json(&self) -> Option<Value> {
        serde_json::from_str(self.body()).ok()
    }
}
