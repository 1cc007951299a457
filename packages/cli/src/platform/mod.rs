//! Platform module
//!
//! Abstraction over the hosted agent platform through the `AgentPlatform`
//! and `RemoteAgent` traits, with the Vertex AI Agent Engine binding.

pub mod adapter;
pub mod vertex;

#[cfg(test)]
pub mod mock;

pub use adapter::{
    AgentPlatform, DeployedAgent, EventStream, InitParams, PlatformError, RemoteAgent, Session,
};
