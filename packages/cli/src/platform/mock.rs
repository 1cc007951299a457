//! Scripted in-memory platform for tests.

use std::collections::VecDeque;
use std::sync::Arc;

use async_trait::async_trait;
use concierge_agent::AgentDefinition;
use futures_util::stream::{self, StreamExt};
use parking_lot::Mutex;
use serde_json::Value;

use crate::platform::adapter::{
    AgentPlatform, DeployedAgent, EventStream, PlatformError, RemoteAgent, Session,
};

/// A call observed by the mock
#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    Create {
        name: String,
        requirements: Vec<String>,
    },
    Get(String),
    Delete {
        resource_id: String,
        force: bool,
    },
    CreateSession {
        user_id: String,
    },
    StreamQuery {
        user_id: String,
        message: String,
        session_id: Option<String>,
    },
}

/// How a single `stream_query` call behaves
#[derive(Debug, Clone)]
pub enum StreamScript {
    /// Yields every event, then ends
    Events(Vec<Value>),
    /// The call itself fails
    Rejected(String),
    /// Yields some events, then fails mid-stream
    BreaksAfter(Vec<Value>, String),
}

fn api_error(message: &str) -> PlatformError {
    PlatformError::Api {
        status: 500,
        message: message.to_string(),
    }
}

#[derive(Default)]
struct Script {
    create_error: Option<String>,
    get_error: Option<String>,
    delete_error: Option<String>,
    session: Option<Result<String, String>>,
    streams: VecDeque<StreamScript>,
}

#[derive(Clone, Default)]
pub struct MockPlatform {
    calls: Arc<Mutex<Vec<Call>>>,
    script: Arc<Mutex<Script>>,
}

impl MockPlatform {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing_create(self, message: &str) -> Self {
        self.script.lock().create_error = Some(message.to_string());
        self
    }

    pub fn failing_get(self, message: &str) -> Self {
        self.script.lock().get_error = Some(message.to_string());
        self
    }

    pub fn failing_delete(self, message: &str) -> Self {
        self.script.lock().delete_error = Some(message.to_string());
        self
    }

    pub fn with_session(self, id: &str) -> Self {
        self.script.lock().session = Some(Ok(id.to_string()));
        self
    }

    pub fn failing_session(self, message: &str) -> Self {
        self.script.lock().session = Some(Err(message.to_string()));
        self
    }

    /// Queue the behavior of the next `stream_query` call
    pub fn then_stream(self, script: StreamScript) -> Self {
        self.script.lock().streams.push_back(script);
        self
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().clone()
    }

    pub fn count(&self, matches: impl Fn(&Call) -> bool) -> usize {
        self.calls.lock().iter().filter(|c| matches(c)).count()
    }

    fn record(&self, call: Call) {
        self.calls.lock().push(call);
    }
}

#[async_trait]
impl AgentPlatform for MockPlatform {
    async fn create(
        &self,
        definition: &AgentDefinition,
        requirements: &[&str],
    ) -> Result<DeployedAgent, PlatformError> {
        self.record(Call::Create {
            name: definition.name.clone(),
            requirements: requirements.iter().map(|r| r.to_string()).collect(),
        });

        if let Some(message) = &self.script.lock().create_error {
            return Err(api_error(message));
        }
        Ok(DeployedAgent {
            resource_name: "projects/p/locations/l/reasoningEngines/42".to_string(),
        })
    }

    async fn get(&self, resource_id: &str) -> Result<Box<dyn RemoteAgent>, PlatformError> {
        self.record(Call::Get(resource_id.to_string()));

        if let Some(message) = &self.script.lock().get_error {
            return Err(api_error(message));
        }
        Ok(Box::new(MockAgent {
            resource_id: resource_id.to_string(),
            platform: self.clone(),
        }))
    }
}

struct MockAgent {
    resource_id: String,
    platform: MockPlatform,
}

#[async_trait]
impl RemoteAgent for MockAgent {
    fn resource_name(&self) -> &str {
        &self.resource_id
    }

    async fn delete(&self, force: bool) -> Result<(), PlatformError> {
        self.platform.record(Call::Delete {
            resource_id: self.resource_id.clone(),
            force,
        });

        match &self.platform.script.lock().delete_error {
            Some(message) => Err(api_error(message)),
            None => Ok(()),
        }
    }

    async fn create_session(&self, user_id: &str) -> Result<Session, PlatformError> {
        self.platform.record(Call::CreateSession {
            user_id: user_id.to_string(),
        });

        match self.platform.script.lock().session.clone() {
            Some(Ok(id)) => Ok(Session {
                id,
                user_id: Some(user_id.to_string()),
            }),
            Some(Err(message)) => Err(api_error(&message)),
            None => Err(api_error("no session scripted")),
        }
    }

    async fn stream_query(
        &self,
        user_id: &str,
        message: &str,
        session_id: Option<&str>,
    ) -> Result<EventStream, PlatformError> {
        self.platform.record(Call::StreamQuery {
            user_id: user_id.to_string(),
            message: message.to_string(),
            session_id: session_id.map(str::to_string),
        });

        let script = self.platform.script.lock().streams.pop_front();
        match script {
            Some(StreamScript::Events(events)) => {
                Ok(stream::iter(events.into_iter().map(Ok::<Value, PlatformError>)).boxed())
            }
            Some(StreamScript::Rejected(message)) => Err(api_error(&message)),
            Some(StreamScript::BreaksAfter(events, message)) => {
                let items = events
                    .into_iter()
                    .map(Ok::<Value, PlatformError>)
                    .chain(std::iter::once(Err(PlatformError::Stream(message))));
                Ok(stream::iter(items).boxed())
            }
            None => Err(api_error("no stream scripted")),
        }
    }
}
