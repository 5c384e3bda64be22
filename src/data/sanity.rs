//! Sanity content API client
//!
//! This module provides the production content backend: GROQ queries sent to
//! the Sanity HTTP query endpoint, with query parameters JSON-encoded as
//! `$name=value` pairs.

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::Value;
use std::collections::BTreeMap;
use thiserror::Error;

use crate::config::SanityConfig;

/// Named parameters referenced from a GROQ query as `$name`
pub type QueryParams = BTreeMap<String, Value>;

/// Errors that can occur when querying the content backend
#[derive(Debug, Error)]
pub enum BackendError {
    /// HTTP request failed
    #[error("HTTP request failed: {0}")]
    RequestFailed(#[from] reqwest::Error),

    /// Failed to parse JSON response
    #[error("Failed to parse JSON response: {0}")]
    ParseError(#[from] serde_json::Error),

    /// The API answered with an error status
    #[error("Content API returned {status}: {message}")]
    Api { status: u16, message: String },
}

/// Anything that can answer a GROQ query with JSON
#[async_trait]
pub trait ContentBackend: Send + Sync {
    async fn fetch(&self, query: &str, params: &QueryParams) -> Result<Value, BackendError>;
}

/// Successful query response body
#[derive(Debug, Deserialize)]
struct QueryResponse {
    #[serde(default)]
    result: Value,
}

/// Error response body, e.g. `{"error": {"description": "..."}}`
#[derive(Debug, Deserialize)]
struct ErrorResponse {
    error: ErrorDetail,
}

#[derive(Debug, Deserialize)]
struct ErrorDetail {
    description: Option<String>,
    message: Option<String>,
}

/// Client for the Sanity HTTP query API
#[derive(Debug, Clone)]
pub struct SanityClient {
    client: Client,
    /// Scheme and host, e.g. `https://abc123.api.sanity.io`
    base_url: String,
    config: SanityConfig,
}

impl SanityClient {
    /// Creates a client for the configured project and dataset
    pub fn new(config: SanityConfig) -> Self {
        Self::with_client(Client::new(), config)
    }

    /// Creates a client with a custom HTTP client
    pub fn with_client(client: Client, config: SanityConfig) -> Self {
        let host = if config.use_cdn {
            "apicdn.sanity.io"
        } else {
            "api.sanity.io"
        };
        let base_url = format!("https://{}.{}", config.project_id, host);
        Self {
            client,
            base_url,
            config,
        }
    }

    /// Points the client at a different host (used for testing)
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    /// Full URL of the query endpoint
    pub fn query_url(&self) -> String {
        format!(
            "{}/v{}/data/query/{}",
            self.base_url, self.config.api_version, self.config.dataset
        )
    }

    /// Builds the URL query string pairs for a GROQ query
    fn query_pairs(
        &self,
        query: &str,
        params: &QueryParams,
    ) -> Result<Vec<(String, String)>, BackendError> {
        let mut pairs = Vec::with_capacity(params.len() + 2);
        pairs.push(("query".to_string(), query.to_string()));
        for (name, value) in params {
            pairs.push((format!("${}", name), serde_json::to_string(value)?));
        }
        pairs.push((
            "perspective".to_string(),
            self.config.perspective.as_str().to_string(),
        ));
        Ok(pairs)
    }
}

#[async_trait]
impl ContentBackend for SanityClient {
    async fn fetch(&self, query: &str, params: &QueryParams) -> Result<Value, BackendError> {
        let url = self.query_url();
        let pairs = self.query_pairs(query, params)?;
        tracing::debug!(%url, params = params.len(), "Sending content query");

        let mut request = self.client.get(&url).query(&pairs);
        if let Some(token) = &self.config.token {
            request = request.bearer_auth(token);
        }

        let response = request.send().await?;
        let status = response.status();
        let text = response.text().await?;

        if !status.is_success() {
            return Err(BackendError::Api {
                status: status.as_u16(),
                message: error_message(&text),
            });
        }

        let body: QueryResponse = serde_json::from_str(&text)?;
        Ok(body.result)
    }
}

/// Extracts a readable message from an error response body
fn error_message(body: &str) -> String {
    serde_json::from_str::<ErrorResponse>(body)
        .ok()
        .and_then(|resp| resp.error.description.or(resp.error.message))
        .unwrap_or_else(|| body.trim().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Perspective;
    use serde_json::json;

    fn test_config() -> SanityConfig {
        SanityConfig {
            project_id: "abc123".to_string(),
            dataset: "production".to_string(),
            api_version: "2024-01-01".to_string(),
            token: None,
            use_cdn: false,
            perspective: Perspective::Published,
        }
    }

    #[test]
    fn test_query_url_uses_api_host() {
        let client = SanityClient::new(test_config());
        assert_eq!(
            client.query_url(),
            "https://abc123.api.sanity.io/v2024-01-01/data/query/production"
        );
    }

    #[test]
    fn test_query_url_uses_cdn_host_when_enabled() {
        let config = SanityConfig {
            use_cdn: true,
            ..test_config()
        };
        let client = SanityClient::new(config);
        assert!(client.query_url().starts_with("https://abc123.apicdn.sanity.io/"));
    }

    #[test]
    fn test_with_base_url_strips_trailing_slash() {
        let client = SanityClient::new(test_config()).with_base_url("http://127.0.0.1:1234/");
        assert_eq!(
            client.query_url(),
            "http://127.0.0.1:1234/v2024-01-01/data/query/production"
        );
    }

    #[test]
    fn test_query_pairs_json_encode_params() {
        let client = SanityClient::new(test_config());
        let mut params = QueryParams::new();
        params.insert("slug".to_string(), json!("night-drive"));

        let pairs = client.query_pairs("*[_type == $t]", &params).unwrap();

        assert_eq!(pairs[0], ("query".to_string(), "*[_type == $t]".to_string()));
        assert_eq!(pairs[1], ("$slug".to_string(), "\"night-drive\"".to_string()));
        assert_eq!(pairs[2], ("perspective".to_string(), "published".to_string()));
    }

    #[test]
    fn test_error_message_prefers_description() {
        let body = r#"{"error":{"description":"expected ']'","type":"queryParseError"}}"#;
        assert_eq!(error_message(body), "expected ']'");
    }

    #[test]
    fn test_error_message_falls_back_to_body() {
        assert_eq!(error_message("Bad Gateway\n"), "Bad Gateway");
    }
}
