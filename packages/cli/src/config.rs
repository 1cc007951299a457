//! CLI Configuration
//!
//! Resolves the deployment target (project, location, staging bucket) from
//! flags and environment, and loads optional client settings stored in
//! ~/.concierge-deploy/config.toml

use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::platform::InitParams;

/// Dotenv file read before variables are resolved
pub const DEFAULT_ENV_FILE: &str = "agents/concierge-agent/.env";

pub const PROJECT_VAR: &str = "GOOGLE_CLOUD_PROJECT";
pub const LOCATION_VAR: &str = "GOOGLE_CLOUD_LOCATION";
pub const BUCKET_VAR: &str = "GOOGLE_CLOUD_STORAGE_BUCKET";

const STORAGE_SCHEME: &str = "gs://";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingVariable(&'static str),

    #[error("Unknown command: pass one of --create, --delete or --quicktest")]
    NoOperation,

    #[error("Only one of --create, --delete or --quicktest may be given (got {0})")]
    ConflictingOperations(String),
}

/// Deployment target values as found, before validation
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PartialConfig {
    pub project_id: Option<String>,
    pub location: Option<String>,
    pub bucket: Option<String>,
}

/// Validated deployment target
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeploymentConfig {
    pub project_id: String,
    pub location: String,
    pub storage_bucket: String,
}

/// Explicit value first, then the environment. Empty counts as unset.
fn pick(flag: Option<&str>, env: &impl Fn(&str) -> Option<String>, key: &str) -> Option<String> {
    flag.map(str::to_string)
        .filter(|v| !v.trim().is_empty())
        .or_else(|| env(key).filter(|v| !v.trim().is_empty()))
}

impl PartialConfig {
    /// Resolve each value from its flag, falling back to `env`
    pub fn resolve(
        project_id: Option<&str>,
        location: Option<&str>,
        bucket: Option<&str>,
        env: impl Fn(&str) -> Option<String>,
    ) -> Self {
        Self {
            project_id: pick(project_id, &env, PROJECT_VAR),
            location: pick(location, &env, LOCATION_VAR),
            bucket: pick(bucket, &env, BUCKET_VAR),
        }
    }

    /// Lines echoing the resolved values
    pub fn summary(&self) -> [String; 3] {
        let show = |v: &Option<String>| v.clone().unwrap_or_else(|| "(not set)".to_string());
        [
            format!("PROJECT: {}", show(&self.project_id)),
            format!("LOCATION: {}", show(&self.location)),
            format!("BUCKET: {}", show(&self.bucket)),
        ]
    }

    /// All three values must be present. The first missing one is reported.
    pub fn validate(self) -> Result<DeploymentConfig, ConfigError> {
        let project_id = self.project_id.ok_or(ConfigError::MissingVariable(PROJECT_VAR))?;
        let location = self.location.ok_or(ConfigError::MissingVariable(LOCATION_VAR))?;
        let storage_bucket = self.bucket.ok_or(ConfigError::MissingVariable(BUCKET_VAR))?;

        Ok(DeploymentConfig {
            project_id,
            location,
            storage_bucket,
        })
    }
}

impl DeploymentConfig {
    /// Values for platform initialization; the bucket becomes a `gs://` URI
    pub fn init_params(&self) -> InitParams {
        let staging_bucket = if self.storage_bucket.starts_with(STORAGE_SCHEME) {
            self.storage_bucket.clone()
        } else {
            format!("{}{}", STORAGE_SCHEME, self.storage_bucket)
        };

        InitParams {
            project: self.project_id.clone(),
            location: self.location.clone(),
            staging_bucket,
        }
    }
}

/// Locate a dotenv file
///
/// A relative path missing from the working directory is looked up again
/// from the workspace root, so the default works from any directory.
pub fn resolve_env_file(path: &Path) -> PathBuf {
    if path.is_absolute() || path.exists() {
        return path.to_path_buf();
    }

    let candidate = Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("../..")
        .join(path);
    if candidate.exists() {
        candidate
    } else {
        path.to_path_buf()
    }
}

/// Load variables from a dotenv file into the process environment
///
/// Variables already set in the environment are kept. Returns whether a
/// file was loaded.
pub fn load_env_file(path: &Path) -> bool {
    let path = resolve_env_file(path);
    let path = path.as_path();
    if !path.exists() {
        info!(path = %path.display(), "No env file, using process environment only");
        return false;
    }
    match dotenvy::from_path(path) {
        Ok(()) => {
            debug!(path = %path.display(), "Loaded env file");
            true
        }
        Err(e) => {
            warn!(path = %path.display(), error = %e, "Failed to load env file");
            false
        }
    }
}

/// Optional client settings
#[derive(Debug, Clone, Deserialize, Default)]
pub struct Settings {
    /// Override for the regional platform endpoint
    pub api_endpoint: Option<String>,
    /// Interval between long-running operation polls
    pub operation_poll_interval_ms: Option<u64>,
}

impl Settings {
    /// Get the settings file path (~/.concierge-deploy/config.toml)
    pub fn path() -> Result<PathBuf> {
        let home = dirs::home_dir().context("Could not determine home directory")?;
        Ok(home.join(".concierge-deploy").join("config.toml"))
    }

    /// Load settings from disk, defaults when the file is absent
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::path()?)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read settings at {}", path.display()))?;
        let settings: Settings = toml::from_str(&content)
            .with_context(|| format!("Failed to parse settings at {}", path.display()))?;
        Ok(settings)
    }

    /// Get the platform API base URL for a location
    pub fn api_endpoint(&self, location: &str) -> String {
        match &self.api_endpoint {
            Some(endpoint) => endpoint.clone(),
            None => format!("https://{}-aiplatform.googleapis.com/v1", location),
        }
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.operation_poll_interval_ms.unwrap_or(5000))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;

    fn env_of(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| map.get(key).cloned()
    }

    #[test]
    fn test_flags_win_over_env() {
        let env = env_of(&[
            (PROJECT_VAR, "env-project"),
            (LOCATION_VAR, "env-location"),
            (BUCKET_VAR, "env-bucket"),
        ]);
        let partial = PartialConfig::resolve(Some("flag-project"), None, Some("flag-bucket"), env);

        assert_eq!(partial.project_id.as_deref(), Some("flag-project"));
        assert_eq!(partial.location.as_deref(), Some("env-location"));
        assert_eq!(partial.bucket.as_deref(), Some("flag-bucket"));
    }

    #[test]
    fn test_empty_values_count_as_missing() {
        let env = env_of(&[(PROJECT_VAR, ""), (LOCATION_VAR, "us-central1")]);
        let partial = PartialConfig::resolve(Some(""), None, None, env);

        assert!(partial.project_id.is_none());
        assert_eq!(
            partial.validate(),
            Err(ConfigError::MissingVariable(PROJECT_VAR))
        );
    }

    #[test]
    fn test_first_missing_variable_is_named() {
        let partial = PartialConfig::resolve(Some("p"), None, None, env_of(&[]));
        let err = partial.validate().unwrap_err();
        assert_eq!(err, ConfigError::MissingVariable(LOCATION_VAR));
        assert_eq!(
            err.to_string(),
            "Missing required environment variable: GOOGLE_CLOUD_LOCATION"
        );

        let partial = PartialConfig::resolve(Some("p"), Some("l"), None, env_of(&[]));
        assert_eq!(
            partial.validate(),
            Err(ConfigError::MissingVariable(BUCKET_VAR))
        );
    }

    #[test]
    fn test_init_params_prefix_bucket() {
        let config = PartialConfig::resolve(Some("p"), Some("us-central1"), Some("staging"), env_of(&[]))
            .validate()
            .unwrap();

        assert_eq!(
            config.init_params(),
            InitParams {
                project: "p".to_string(),
                location: "us-central1".to_string(),
                staging_bucket: "gs://staging".to_string(),
            }
        );
    }

    #[test]
    fn test_init_params_keep_existing_scheme() {
        let config = DeploymentConfig {
            project_id: "p".to_string(),
            location: "l".to_string(),
            storage_bucket: "gs://already".to_string(),
        };
        assert_eq!(config.init_params().staging_bucket, "gs://already");
    }

    #[test]
    fn test_summary_marks_unset() {
        let partial = PartialConfig::resolve(Some("p"), None, None, env_of(&[]));
        let lines = partial.summary();
        assert_eq!(lines[0], "PROJECT: p");
        assert_eq!(lines[1], "LOCATION: (not set)");
    }

    #[test]
    fn test_load_env_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "CONCIERGE_DEPLOY_TEST_VAR=from-file").unwrap();

        assert!(load_env_file(file.path()));
        assert_eq!(
            std::env::var("CONCIERGE_DEPLOY_TEST_VAR").as_deref(),
            Ok("from-file")
        );
    }

    #[test]
    fn test_env_file_keeps_existing_variables() {
        std::env::set_var("CONCIERGE_DEPLOY_KEEP_VAR", "from-process");
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "CONCIERGE_DEPLOY_KEEP_VAR=from-file").unwrap();

        assert!(load_env_file(file.path()));
        assert_eq!(
            std::env::var("CONCIERGE_DEPLOY_KEEP_VAR").as_deref(),
            Ok("from-process")
        );
    }

    #[test]
    fn test_resolve_env_file_from_workspace_root() {
        // Tests run from the crate directory, not the workspace root
        let relative = Path::new("agents/concierge-agent/.env.example");
        let resolved = resolve_env_file(relative);
        assert!(resolved.exists());
        assert!(resolved.ends_with(relative));
    }

    #[test]
    fn test_resolve_env_file_keeps_unknown_path() {
        let missing = Path::new("does/not/exist/.env");
        assert_eq!(resolve_env_file(missing), missing);
    }

    #[test]
    fn test_missing_env_file_is_not_an_error() {
        assert!(!load_env_file(Path::new("does/not/exist/.env")));
    }

    #[test]
    fn test_settings_defaults() {
        let settings = Settings::load_from(Path::new("does/not/exist.toml")).unwrap();
        assert_eq!(
            settings.api_endpoint("europe-west4"),
            "https://europe-west4-aiplatform.googleapis.com/v1"
        );
        assert_eq!(settings.poll_interval(), Duration::from_secs(5));
    }

    #[test]
    fn test_parse_settings() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            "api_endpoint = \"http://localhost:8080/v1\"\noperation_poll_interval_ms = 250"
        )
        .unwrap();

        let settings = Settings::load_from(file.path()).unwrap();
        assert_eq!(settings.api_endpoint("us-central1"), "http://localhost:8080/v1");
        assert_eq!(settings.poll_interval(), Duration::from_millis(250));
    }
}
