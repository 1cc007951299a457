//! Source package
//!
//! Agent Engine deploys Python source. The package carries the agent
//! definition as JSON, the requirements and a small entrypoint module that
//! rebuilds the ADK agent from the JSON and wraps it in an `AdkApp`.

use concierge_agent::AgentDefinition;
use flate2::write::GzEncoder;
use flate2::Compression;
use tar::{Builder, Header};

use crate::platform::adapter::PlatformError;

/// Module the platform imports, without the `.py` suffix
pub const ENTRYPOINT_MODULE: &str = "agent_app";

/// Object inside the entrypoint module that serves queries
pub const ENTRYPOINT_OBJECT: &str = "app";

pub const REQUIREMENTS_FILE: &str = "requirements.txt";
pub const DEFINITION_FILE: &str = "agent.json";

const ENTRYPOINT_SOURCE: &str = r#"import json
import pathlib

from google.adk.agents import Agent
from vertexai.agent_engines import AdkApp

_definition = json.loads(
    (pathlib.Path(__file__).parent / "agent.json").read_text(encoding="utf-8")
)

root_agent = Agent(
    model=_definition["model"],
    name=_definition["name"],
    description=_definition["description"],
    instruction=_definition["instruction"],
)

app = AdkApp(agent=root_agent)
"#;

/// Render a requirements.txt body
pub fn requirements_file(requirements: &[&str]) -> String {
    let mut content = requirements.join("\n");
    content.push('\n');
    content
}

fn append(builder: &mut Builder<GzEncoder<Vec<u8>>>, name: &str, data: &[u8]) -> std::io::Result<()> {
    let mut header = Header::new_gnu();
    header.set_size(data.len() as u64);
    header.set_mode(0o644);
    header.set_mtime(0);
    header.set_cksum();
    builder.append_data(&mut header, name, data)
}

/// Build the gzipped tarball deployed as the agent's source
pub fn source_archive(
    definition: &AgentDefinition,
    requirements: &[&str],
) -> Result<Vec<u8>, PlatformError> {
    let definition_json = serde_json::to_vec_pretty(definition)?;

    let mut builder = Builder::new(GzEncoder::new(Vec::new(), Compression::default()));
    append(&mut builder, DEFINITION_FILE, &definition_json)?;
    append(
        &mut builder,
        REQUIREMENTS_FILE,
        requirements_file(requirements).as_bytes(),
    )?;
    append(
        &mut builder,
        &format!("{}.py", ENTRYPOINT_MODULE),
        ENTRYPOINT_SOURCE.as_bytes(),
    )?;

    let encoder = builder.into_inner()?;
    Ok(encoder.finish()?)
}
