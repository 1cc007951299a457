//! API Client
//!
//! HTTP client for the Vertex AI REST API.

use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use reqwest::Response;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::platform::adapter::PlatformError;

/// Environment variable holding a ready-made OAuth access token
pub const ACCESS_TOKEN_VAR: &str = "GOOGLE_OAUTH_ACCESS_TOKEN";

/// Google API error envelope
#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ApiError,
}

#[derive(Debug, Deserialize)]
pub struct ApiError {
    #[serde(default)]
    pub code: u16,
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub status: Option<String>,
}

#[derive(Clone)]
pub struct ApiClient {
    client: reqwest::Client,
    base_url: String,
}

impl ApiClient {
    /// Create a client for `base_url` authenticating with a bearer token
    pub fn new(base_url: &str, token: &str) -> Result<Self, PlatformError> {
        let mut headers = HeaderMap::new();
        let auth = HeaderValue::from_str(&format!("Bearer {}", token))
            .map_err(|e| PlatformError::Auth(e.to_string()))?;
        headers.insert(AUTHORIZATION, auth);
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .build()
            .map_err(|source| PlatformError::Http {
                url: base_url.to_string(),
                source,
            })?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    /// GET request
    pub async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, PlatformError> {
        let url = self.url(path);
        debug!(url = %url, "GET");
        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|source| PlatformError::Http { url: url.clone(), source })?;

        read_json(&url, response).await
    }

    /// POST request
    pub async fn post<T: DeserializeOwned, B: Serialize>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, PlatformError> {
        let url = self.url(path);
        debug!(url = %url, "POST");
        let response = self
            .client
            .post(&url)
            .json(body)
            .send()
            .await
            .map_err(|source| PlatformError::Http { url: url.clone(), source })?;

        read_json(&url, response).await
    }

    /// POST request answered as server-sent events, consumed incrementally
    /// by the caller
    pub async fn post_stream<B: Serialize>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<Response, PlatformError> {
        let url = self.url(path);
        debug!(url = %url, "POST (stream)");
        let response = self
            .client
            .post(&url)
            .query(&[("alt", "sse")])
            .json(body)
            .send()
            .await
            .map_err(|source| PlatformError::Http { url: url.clone(), source })?;

        check_status(response).await
    }

    /// DELETE request
    pub async fn delete<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, &str)],
    ) -> Result<T, PlatformError> {
        let url = self.url(path);
        debug!(url = %url, "DELETE");
        let response = self
            .client
            .delete(&url)
            .query(query)
            .send()
            .await
            .map_err(|source| PlatformError::Http { url: url.clone(), source })?;

        read_json(&url, response).await
    }
}

async fn check_status(response: Response) -> Result<Response, PlatformError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let text = response.text().await.unwrap_or_default();
    let message = match serde_json::from_str::<ErrorEnvelope>(&text) {
        Ok(envelope) => match envelope.error.status {
            Some(code) => format!("{}: {}", code, envelope.error.message),
            None => envelope.error.message,
        },
        Err(_) if text.is_empty() => format!("API request failed with status {}", status),
        Err(_) => text,
    };

    Err(PlatformError::Api {
        status: status.as_u16(),
        message,
    })
}

async fn read_json<T: DeserializeOwned>(url: &str, response: Response) -> Result<T, PlatformError> {
    let response = check_status(response).await?;
    let bytes = response
        .bytes()
        .await
        .map_err(|source| PlatformError::Http {
            url: url.to_string(),
            source,
        })?;

    // Empty bodies (e.g. some DELETEs) decode as `{}`
    if bytes.is_empty() {
        return Ok(serde_json::from_str("{}")?);
    }
    Ok(serde_json::from_slice(&bytes)?)
}

/// Obtain an OAuth access token for the Google APIs
///
/// Uses `GOOGLE_OAUTH_ACCESS_TOKEN` when set, otherwise asks the gcloud CLI.
pub async fn access_token() -> Result<String, PlatformError> {
    if let Ok(token) = std::env::var(ACCESS_TOKEN_VAR) {
        if !token.trim().is_empty() {
            return Ok(token.trim().to_string());
        }
    }

    let output = tokio::process::Command::new("gcloud")
        .args(["auth", "print-access-token"])
        .output()
        .await
        .map_err(|e| PlatformError::Auth(format!("failed to run gcloud: {}", e)))?;

    if !output.status.success() {
        return Err(PlatformError::Auth(
            String::from_utf8_lossy(&output.stderr).trim().to_string(),
        ));
    }

    let token = String::from_utf8_lossy(&output.stdout).trim().to_string();
    if token.is_empty() {
        return Err(PlatformError::Auth("gcloud returned an empty token".to_string()));
    }
    Ok(token)
}
