//! Quick test
//!
//! Sends a test message to a deployed agent and prints the streamed
//! response. When the direct query fails the command falls back once to a
//! freshly created session:
//!
//! ```text
//! NotStarted ──> StreamedNoSession(ok)                      done
//!            └─> StreamedNoSession(fail) ──> SessionCreated(fail)   done
//!                                        └─> SessionCreated(ok) ──> StreamedWithSession(_)  done
//! ```

use anyhow::Result;
use colored::Colorize;
use futures_util::StreamExt;
use std::io::Write;
use tracing::{debug, info, warn};

use crate::platform::{AgentPlatform, PlatformError, RemoteAgent};

/// User the quick test speaks as
pub const QUICKTEST_USER_ID: &str = "traveler0115";

pub const DEFAULT_MESSAGE: &str = "Looking for inspirations around the Americas";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    Succeeded,
    Failed,
}

/// Progress through the direct query and its session fallback
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuickTestState {
    NotStarted,
    StreamedNoSession(Step),
    SessionCreated(Step),
    StreamedWithSession(Step),
}

/// Work to do from a given state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    StreamDirect,
    CreateSession,
    StreamWithSession,
}

impl QuickTestState {
    /// The step to run next, `None` once the test is over
    pub fn next_action(self) -> Option<Action> {
        match self {
            QuickTestState::NotStarted => Some(Action::StreamDirect),
            QuickTestState::StreamedNoSession(Step::Failed) => Some(Action::CreateSession),
            QuickTestState::SessionCreated(Step::Succeeded) => Some(Action::StreamWithSession),
            _ => None,
        }
    }

    /// Record the result of the next step. Terminal states absorb.
    pub fn advance(self, step: Step) -> Self {
        match self {
            QuickTestState::NotStarted => QuickTestState::StreamedNoSession(step),
            QuickTestState::StreamedNoSession(Step::Failed) => QuickTestState::SessionCreated(step),
            QuickTestState::SessionCreated(Step::Succeeded) => {
                QuickTestState::StreamedWithSession(step)
            }
            terminal => terminal,
        }
    }

    pub fn succeeded(self) -> bool {
        matches!(
            self,
            QuickTestState::StreamedNoSession(Step::Succeeded)
                | QuickTestState::StreamedWithSession(Step::Succeeded)
        )
    }
}

/// Result of one streamed query attempt
#[derive(Debug)]
pub enum StreamOutcome {
    /// The stream was consumed to its end
    Completed { events: usize },
    /// Opening or reading the stream failed after `events` were printed
    Failed { events: usize, error: PlatformError },
}

/// What the quick test observed
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QuickTestOutcome {
    /// The agent could not be fetched; nothing was sent
    Unreachable,
    Finished {
        state: QuickTestState,
        events: usize,
    },
}

/// Stream a query and print every event as it arrives
async fn stream_events<W: Write>(
    remote: &dyn RemoteAgent,
    message: &str,
    session_id: Option<&str>,
    out: &mut W,
) -> std::io::Result<StreamOutcome> {
    let mut events = 0;
    let mut stream = match remote
        .stream_query(QUICKTEST_USER_ID, message, session_id)
        .await
    {
        Ok(stream) => stream,
        Err(error) => return Ok(StreamOutcome::Failed { events, error }),
    };

    while let Some(item) = stream.next().await {
        match item {
            Ok(event) => {
                writeln!(out, "{}", event)?;
                events += 1;
            }
            Err(error) => return Ok(StreamOutcome::Failed { events, error }),
        }
    }

    Ok(StreamOutcome::Completed { events })
}

fn print_fundamental_failure<W: Write>(out: &mut W, error: &PlatformError) -> std::io::Result<()> {
    writeln!(out, "{} Session-based query also failed: {}", "✗".red().bold(), error)?;
    writeln!(out, "This indicates a fundamental issue with the deployed agent.")?;
    writeln!(
        out,
        "{}",
        "Consider redeploying the agent or checking the agent implementation.".yellow()
    )
}

/// Send `message` to the agent behind `resource_id`
///
/// Platform failures are reported on `out`, never returned.
pub async fn run<W: Write>(
    platform: &dyn AgentPlatform,
    resource_id: &str,
    message: &str,
    out: &mut W,
) -> Result<QuickTestOutcome> {
    let remote = match platform.get(resource_id).await {
        Ok(remote) => remote,
        Err(e) => {
            warn!(resource_id = %resource_id, error = %e, "Failed to fetch remote agent");
            writeln!(
                out,
                "{} Error connecting to remote agent {}: {}",
                "✗".red().bold(),
                resource_id,
                e
            )?;
            writeln!(out, "Please check if the agent is deployed correctly.")?;
            return Ok(QuickTestOutcome::Unreachable);
        }
    };
    writeln!(
        out,
        "{} Successfully connected to remote agent: {}",
        "✓".green().bold(),
        resource_id
    )?;

    let mut state = QuickTestState::NotStarted;
    let mut printed = 0;
    let mut session_id: Option<String> = None;

    while let Some(action) = state.next_action() {
        debug!(state = ?state, action = ?action, "Quick test step");
        let step = match action {
            Action::StreamDirect => {
                writeln!(out, "{} Sending message to remote agent: {}", "→".blue().bold(), resource_id)?;
                match stream_events(remote.as_ref(), message, None, out).await? {
                    StreamOutcome::Completed { events } => {
                        printed += events;
                        writeln!(out, "Done.")?;
                        Step::Succeeded
                    }
                    StreamOutcome::Failed { events, error } => {
                        printed += events;
                        warn!(resource_id = %resource_id, error = %error, "Stream query without session failed");
                        writeln!(out, "{} Stream query without session failed: {}", "✗".red().bold(), error)?;
                        writeln!(out, "Attempting to create session...")?;
                        Step::Failed
                    }
                }
            }
            Action::CreateSession => match remote.create_session(QUICKTEST_USER_ID).await {
                Ok(session) => {
                    info!(session_id = %session.id, "Session created");
                    writeln!(out, "{} Session created successfully: {}", "✓".green().bold(), session.id)?;
                    session_id = Some(session.id);
                    Step::Succeeded
                }
                Err(e) => {
                    print_fundamental_failure(out, &e)?;
                    Step::Failed
                }
            },
            Action::StreamWithSession => {
                writeln!(out, "{} Trying remote agent with session: {}", "→".blue().bold(), resource_id)?;
                match stream_events(remote.as_ref(), message, session_id.as_deref(), out).await? {
                    StreamOutcome::Completed { events } => {
                        printed += events;
                        writeln!(out, "Done.")?;
                        Step::Succeeded
                    }
                    StreamOutcome::Failed { events, error } => {
                        printed += events;
                        print_fundamental_failure(out, &error)?;
                        Step::Failed
                    }
                }
            }
        };
        state = state.advance(step);
    }

    debug!(state = ?state, events = printed, succeeded = state.succeeded(), "Quick test finished");
    Ok(QuickTestOutcome::Finished {
        state,
        events: printed,
    })
}
