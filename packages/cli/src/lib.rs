//! Concierge Deploy Library
//!
//! Deployment lifecycle for the hosted concierge agent: create a remote
//! instance, delete it, and smoke-test it with a streamed message.

pub mod app;
pub mod cli;
pub mod commands;
pub mod config;
pub mod platform;

// Re-exports for convenience
pub use cli::{Cli, Operation};
pub use config::{DeploymentConfig, Settings};
pub use platform::vertex::VertexPlatform;
pub use platform::{AgentPlatform, RemoteAgent};
