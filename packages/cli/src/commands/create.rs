use anyhow::{Context, Result};
use colored::Colorize;
use concierge_agent::AgentDefinition;
use std::collections::HashMap;
use std::io::Write;
use tracing::{debug, info};

use crate::platform::{AgentPlatform, DeployedAgent};

/// Runtime packages installed alongside the deployed agent
pub const REQUIREMENTS: &[&str] = &["google-cloud-aiplatform[adk,agent_engines]"];

/// Deploy a new remote agent
///
/// `env_vars` is accepted but not forwarded to the deployment.
pub async fn run<W: Write>(
    platform: &dyn AgentPlatform,
    definition: &AgentDefinition,
    env_vars: &HashMap<String, String>,
    out: &mut W,
) -> Result<DeployedAgent> {
    debug!(env_vars = ?env_vars.keys().collect::<Vec<_>>(), "Extra environment for create");

    writeln!(
        out,
        "{} Creating remote agent {} ({})...",
        "→".blue().bold(),
        definition.name,
        definition.model
    )?;

    let deployed = platform
        .create(definition, REQUIREMENTS)
        .await
        .with_context(|| format!("Failed to create remote agent {}", definition.name))?;

    info!(resource_name = %deployed.resource_name, "Remote agent created");
    writeln!(
        out,
        "{} Created remote agent: {}",
        "✓".green().bold(),
        deployed.resource_name
    )?;

    Ok(deployed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::platform::mock::{Call, MockPlatform};
    use concierge_agent::root_agent;

    #[tokio::test]
    async fn test_create_passes_requirements() {
        let platform = MockPlatform::new();
        let mut out = Vec::new();

        let deployed = run(&platform, &root_agent(), &HashMap::new(), &mut out)
            .await
            .unwrap();

        assert_eq!(
            platform.calls(),
            vec![Call::Create {
                name: "root_agent".to_string(),
                requirements: vec!["google-cloud-aiplatform[adk,agent_engines]".to_string()],
            }]
        );
        let printed = String::from_utf8(out).unwrap();
        assert!(printed.contains(&format!("Created remote agent: {}", deployed.resource_name)));
    }

    #[tokio::test]
    async fn test_create_failure_propagates() {
        let platform = MockPlatform::new().failing_create("quota exceeded");
        let mut out = Vec::new();

        let err = run(&platform, &root_agent(), &HashMap::new(), &mut out)
            .await
            .unwrap_err();

        assert!(format!("{:#}", err).contains("quota exceeded"));
        assert_eq!(platform.count(|c| matches!(c, Call::Create { .. })), 1);
        assert!(!String::from_utf8(out).unwrap().contains("Created remote agent"));
    }
}
