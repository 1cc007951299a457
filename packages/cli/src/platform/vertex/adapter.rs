//! Vertex AI Adapter
//!
//! Implementation of AgentPlatform for Vertex AI Agent Engine
//! (reasoning engines), using the REST API through `ApiClient`.

use std::time::Duration;

use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use chrono::{DateTime, Utc};
use concierge_agent::AgentDefinition;
use indicatif::{ProgressBar, ProgressStyle};
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::{debug, info};

use crate::config::Settings;
use crate::platform::adapter::{
    AgentPlatform, DeployedAgent, EventStream, InitParams, PlatformError, RemoteAgent, Session,
};
use crate::platform::vertex::api::{access_token, ApiClient};
use crate::platform::vertex::source::{
    source_archive, ENTRYPOINT_MODULE, ENTRYPOINT_OBJECT, REQUIREMENTS_FILE,
};
use crate::platform::vertex::stream::decode_events;

const AGENT_FRAMEWORK: &str = "google-adk";
const PYTHON_VERSION: &str = "3.12";

/// Long-running operation returned by create and delete
#[derive(Debug, Clone, Deserialize)]
pub struct Operation {
    pub name: String,
    #[serde(default)]
    pub done: bool,
    #[serde(default)]
    pub error: Option<OperationError>,
    #[serde(default)]
    pub response: Option<Value>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct OperationError {
    #[serde(default)]
    pub code: i32,
    #[serde(default)]
    pub message: String,
}

/// Reasoning engine resource as returned by GET
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReasoningEngine {
    pub name: String,
    #[serde(default)]
    pub display_name: Option<String>,
    #[serde(default)]
    pub create_time: Option<DateTime<Utc>>,
    #[serde(default)]
    pub update_time: Option<DateTime<Utc>>,
}

#[derive(Debug, Deserialize)]
struct QueryResponse {
    #[serde(default)]
    output: Value,
}

/// Vertex AI Agent Engine platform client
pub struct VertexPlatform {
    api: ApiClient,
    params: InitParams,
    poll_interval: Duration,
}

impl VertexPlatform {
    /// Initialize the platform client for a project, location and staging bucket
    pub async fn connect(params: InitParams, settings: Settings) -> Result<Self, PlatformError> {
        let token = access_token().await?;
        Self::new(params, &settings, &token)
    }

    /// Build a client with an already obtained access token
    pub fn new(params: InitParams, settings: &Settings, token: &str) -> Result<Self, PlatformError> {
        let endpoint = settings.api_endpoint(&params.location);
        let api = ApiClient::new(&endpoint, token)?;

        info!(
            project = %params.project,
            location = %params.location,
            staging_bucket = %params.staging_bucket,
            endpoint = %endpoint,
            "Platform client initialized"
        );

        Ok(Self {
            api,
            params,
            poll_interval: settings.poll_interval(),
        })
    }

    fn parent(&self) -> String {
        format!(
            "projects/{}/locations/{}",
            self.params.project, self.params.location
        )
    }
}

#[async_trait]
impl AgentPlatform for VertexPlatform {
    async fn create(
        &self,
        definition: &AgentDefinition,
        requirements: &[&str],
    ) -> Result<DeployedAgent, PlatformError> {
        let archive = source_archive(definition, requirements)?;
        debug!(bytes = archive.len(), "Built source package");

        let body = json!({
            "displayName": definition.name,
            "description": definition.description,
            "spec": {
                "agentFramework": AGENT_FRAMEWORK,
                "sourceCodeSpec": {
                    "inlineSource": {
                        "sourceArchive": STANDARD.encode(&archive),
                    },
                    "pythonSpec": {
                        "version": PYTHON_VERSION,
                        "entrypointModule": ENTRYPOINT_MODULE,
                        "entrypointObject": ENTRYPOINT_OBJECT,
                        "requirementsFile": REQUIREMENTS_FILE,
                    },
                },
            },
        });

        info!(agent = %definition.name, model = %definition.model, "Creating reasoning engine");
        let operation: Operation = self
            .api
            .post(&format!("{}/reasoningEngines", self.parent()), &body)
            .await?;

        let operation = wait_for_operation(&self.api, operation, self.poll_interval, "Deploying agent").await?;
        let resource_name = created_resource_name(&operation);

        Ok(DeployedAgent { resource_name })
    }

    async fn get(&self, resource_id: &str) -> Result<Box<dyn RemoteAgent>, PlatformError> {
        let name = resource_name(resource_id, &self.params.project, &self.params.location)?;
        let engine: ReasoningEngine = self.api.get(&name).await?;

        debug!(
            name = %engine.name,
            display_name = ?engine.display_name,
            created = ?engine.create_time,
            updated = ?engine.update_time,
            "Fetched reasoning engine"
        );

        Ok(Box::new(VertexAgent {
            api: self.api.clone(),
            engine,
            poll_interval: self.poll_interval,
        }))
    }
}

/// A deployed reasoning engine
pub struct VertexAgent {
    api: ApiClient,
    engine: ReasoningEngine,
    poll_interval: Duration,
}

#[async_trait]
impl RemoteAgent for VertexAgent {
    fn resource_name(&self) -> &str {
        &self.engine.name
    }

    async fn delete(&self, force: bool) -> Result<(), PlatformError> {
        let force = if force { "true" } else { "false" };
        let operation: Operation = self
            .api
            .delete(&self.engine.name, &[("force", force)])
            .await?;

        wait_for_operation(&self.api, operation, self.poll_interval, "Deleting agent").await?;
        Ok(())
    }

    async fn create_session(&self, user_id: &str) -> Result<Session, PlatformError> {
        let body = json!({
            "classMethod": "create_session",
            "input": { "user_id": user_id },
        });

        let response: QueryResponse = self
            .api
            .post(&format!("{}:query", self.engine.name), &body)
            .await?;

        Ok(serde_json::from_value(response.output)?)
    }

    async fn stream_query(
        &self,
        user_id: &str,
        message: &str,
        session_id: Option<&str>,
    ) -> Result<EventStream, PlatformError> {
        let mut input = json!({
            "user_id": user_id,
            "message": message,
        });
        if let Some(session_id) = session_id {
            input["session_id"] = Value::from(session_id);
        }
        let body = json!({
            "classMethod": "stream_query",
            "input": input,
        });

        let response = self
            .api
            .post_stream(&format!("{}:streamQuery", self.engine.name), &body)
            .await?;

        Ok(decode_events(response.bytes_stream()))
    }
}

/// Poll a long-running operation until it is done
async fn wait_for_operation(
    api: &ApiClient,
    mut operation: Operation,
    poll_interval: Duration,
    message: &'static str,
) -> Result<Operation, PlatformError> {
    let spinner = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::default_spinner()
        .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"])
        .template("{spinner:.blue} {msg} ({elapsed})")
    {
        spinner.set_style(style);
    }
    spinner.set_message(message);
    spinner.enable_steady_tick(Duration::from_millis(120));

    while !operation.done {
        debug!(operation = %operation.name, "Waiting for operation");
        tokio::time::sleep(poll_interval).await;
        operation = match api.get(&operation.name).await {
            Ok(op) => op,
            Err(e) => {
                spinner.finish_and_clear();
                return Err(e);
            }
        };
    }
    spinner.finish_and_clear();

    if let Some(error) = operation.error.take() {
        return Err(PlatformError::Operation {
            name: operation.name,
            message: format!("[{}] {}", error.code, error.message),
        });
    }
    Ok(operation)
}

/// Name of the resource a finished create operation produced
fn created_resource_name(operation: &Operation) -> String {
    if let Some(name) = operation
        .response
        .as_ref()
        .and_then(|r| r.get("name"))
        .and_then(Value::as_str)
    {
        return name.to_string();
    }

    match operation.name.split_once("/operations/") {
        Some((resource, _)) => resource.to_string(),
        None => operation.name.clone(),
    }
}

/// Expand a resource id into a full reasoning engine resource name
///
/// Accepts either `projects/<p>/locations/<l>/reasoningEngines/<id>` or a bare id.
pub fn resource_name(resource_id: &str, project: &str, location: &str) -> Result<String, PlatformError> {
    let id = resource_id.trim().trim_matches('/');
    if id.is_empty() {
        return Err(PlatformError::InvalidResourceId(resource_id.to_string()));
    }

    if id.starts_with("projects/") {
        let parts: Vec<&str> = id.split('/').collect();
        let well_formed = parts.len() == 6
            && parts[2] == "locations"
            && parts[4] == "reasoningEngines"
            && parts.iter().all(|p| !p.is_empty());
        if well_formed {
            return Ok(id.to_string());
        }
        return Err(PlatformError::InvalidResourceId(resource_id.to_string()));
    }

    if id.contains('/') {
        return Err(PlatformError::InvalidResourceId(resource_id.to_string()));
    }

    Ok(format!(
        "projects/{}/locations/{}/reasoningEngines/{}",
        project, location, id
    ))
}
