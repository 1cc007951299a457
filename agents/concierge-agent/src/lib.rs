//! Concierge Agent Library
//!
//! Declares the identity of the concierge agent that the deployment CLI
//! provisions on the hosted agent platform. The agent's reasoning runs
//! remotely; this crate only describes it.

pub mod definition;
pub mod prompt;

// Re-exports for convenience
pub use definition::{root_agent, AgentDefinition};
