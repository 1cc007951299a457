//! Platform Adapter Trait
//!
//! Defines the interface the deployment commands use to reach the hosted
//! agent platform. The platform itself is remote; implementations only
//! translate these calls into its API.

use async_trait::async_trait;
use concierge_agent::AgentDefinition;
use futures_util::stream::BoxStream;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors returned by platform calls
#[derive(Debug, Error)]
pub enum PlatformError {
    #[error("failed to obtain access token: {0}")]
    Auth(String),

    #[error("request to {url} failed: {source}")]
    Http {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("[{status}] {message}")]
    Api { status: u16, message: String },

    #[error("operation {name} failed: {message}")]
    Operation { name: String, message: String },

    #[error("stream interrupted: {0}")]
    Stream(String),

    #[error("failed to decode response: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("invalid resource id: {0}")]
    InvalidResourceId(String),

    #[error("failed to build source package: {0}")]
    Archive(#[from] std::io::Error),
}

/// Values the platform client is initialized with
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InitParams {
    pub project: String,
    pub location: String,
    /// Storage location URI, always `gs://`-prefixed
    pub staging_bucket: String,
}

/// Result of a successful create
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeployedAgent {
    pub resource_name: String,
}

/// A conversational session on a remote agent
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub id: String,
    #[serde(default, alias = "userId")]
    pub user_id: Option<String>,
}

/// Lazily delivered response events, in arrival order
pub type EventStream = BoxStream<'static, Result<serde_json::Value, PlatformError>>;

/// Entry point to the hosted agent platform
#[async_trait]
pub trait AgentPlatform: Send + Sync {
    /// Deploy a new remote agent from a definition and its runtime requirements
    async fn create(
        &self,
        definition: &AgentDefinition,
        requirements: &[&str],
    ) -> Result<DeployedAgent, PlatformError>;

    /// Fetch a previously deployed agent by resource id
    async fn get(&self, resource_id: &str) -> Result<Box<dyn RemoteAgent>, PlatformError>;
}

/// Proxy for a deployed agent
#[async_trait]
pub trait RemoteAgent: Send + Sync {
    fn resource_name(&self) -> &str;

    /// Delete the agent. With `force` child resources such as sessions go too.
    async fn delete(&self, force: bool) -> Result<(), PlatformError>;

    async fn create_session(&self, user_id: &str) -> Result<Session, PlatformError>;

    /// Send a message and stream back the response events
    async fn stream_query(
        &self,
        user_id: &str,
        message: &str,
        session_id: Option<&str>,
    ) -> Result<EventStream, PlatformError>;
}
