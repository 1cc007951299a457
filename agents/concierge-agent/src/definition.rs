//! Agent Definition
//!
//! The static declaration of the agent handed to the platform on create.

use serde::{Deserialize, Serialize};

use crate::prompt::ROOT_AGENT_INSTR;

/// Model the concierge runs on
pub const ROOT_AGENT_MODEL: &str = "gemini-2.5-flash";

/// Identity of a hosted conversational agent
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgentDefinition {
    /// Model identifier understood by the platform
    pub model: String,
    pub name: String,
    pub description: String,
    pub instruction: String,
}

impl AgentDefinition {
    pub fn new(
        model: impl Into<String>,
        name: impl Into<String>,
        description: impl Into<String>,
        instruction: impl Into<String>,
    ) -> Self {
        Self {
            model: model.into(),
            name: name.into(),
            description: description.into(),
            instruction: instruction.into(),
        }
    }
}

/// Build the root concierge agent
pub fn root_agent() -> AgentDefinition {
    AgentDefinition::new(
        ROOT_AGENT_MODEL,
        "root_agent",
        "コンシェルジュ",
        ROOT_AGENT_INSTR,
    )
}
