//! Ad platform Graph API client.
//!
//! Thin typed wrapper over the Graph API endpoints the launcher needs:
//! account listing, media upload, and campaign/ad set/creative/ad creation.
//! No business logic lives here; the orchestrator decides what to create.
//!
//! # API Reference
//!
//! - Base URL: `https://graph.facebook.com/{version}`
//! - Authentication: `access_token` request parameter
//! - Errors: `{"error": {"message": "...", "code": 100, ...}}`, sometimes with
//!   a 200 status, so every body is inspected before decoding

mod media;
mod objects;
mod types;

pub use types::*;

use std::sync::Arc;

use secrecy::{ExposeSecret, SecretString};
use serde::de::DeserializeOwned;
use thiserror::Error;

use crate::config::{GraphConfig, VideoPollPolicy, has_secret};
use campaign_launcher_core::AdAccountId;

/// OAuth error code for expired or revoked tokens.
const CODE_INVALID_TOKEN: i64 = 190;

/// Throttling codes (app, user, page-level and custom rate limits).
const RATE_LIMIT_CODES: &[i64] = &[4, 17, 32, 613];

/// Errors that can occur when interacting with the Graph API.
#[derive(Debug, Error)]
pub enum GraphError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// No access token configured.
    #[error("Missing Graph API access token (set GRAPH_ACCESS_TOKEN)")]
    MissingCredential,

    /// Token rejected by the platform.
    #[error("Invalid access token: {0}")]
    InvalidToken(String),

    /// Platform returned an error payload.
    #[error("API error {code}: {message}")]
    Api { code: i64, message: String },

    /// Throttled by the platform.
    #[error("Rate limited ({code}): {message}")]
    RateLimited { code: i64, message: String },

    /// Success response without the created object's identifier.
    #[error("{object} response did not contain an id")]
    MissingId { object: &'static str },

    /// Video transcoding ended in the error state.
    #[error("Video {video_id} was rejected during processing")]
    MediaProcessing { video_id: String },

    /// Video never reached a terminal state.
    #[error("Video {video_id} still processing after {attempts} status checks")]
    MediaTimeout { video_id: String, attempts: u32 },

    /// Media uploaded to one account used to build a creative in another.
    #[error("Media uploaded to {uploaded_to} cannot be used in {account}")]
    MediaScopeMismatch {
        uploaded_to: AdAccountId,
        account: AdAccountId,
    },

    /// Failed to parse response.
    #[error("Parse error: {0}")]
    Parse(String),
}

/// Graph API client.
///
/// Cheap to clone; clones share the connection pool.
#[derive(Clone)]
pub struct GraphClient {
    inner: Arc<GraphClientInner>,
}

struct GraphClientInner {
    client: reqwest::Client,
    api_root: String,
    access_token: SecretString,
    video_poll: VideoPollPolicy,
}

impl GraphClient {
    /// Create a new Graph API client.
    ///
    /// # Errors
    ///
    /// Returns `GraphError::MissingCredential` if no token is configured, or
    /// an HTTP error if the client fails to build.
    pub fn new(config: &GraphConfig) -> Result<Self, GraphError> {
        if !has_secret(config.access_token.as_ref()) {
            return Err(GraphError::MissingCredential);
        }
        let access_token = config
            .access_token
            .clone()
            .ok_or(GraphError::MissingCredential)?;

        let client = reqwest::Client::builder()
            .user_agent(concat!("campaign-launcher/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            inner: Arc::new(GraphClientInner {
                client,
                api_root: config.api_root(),
                access_token,
                video_poll: config.video_poll,
            }),
        })
    }

    /// Polling policy applied to video uploads.
    #[must_use]
    pub fn video_poll(&self) -> VideoPollPolicy {
        self.inner.video_poll
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.inner.api_root, path.trim_start_matches('/'))
    }

    fn token(&self) -> &str {
        self.inner.access_token.expose_secret()
    }

    /// Execute a GET request with query parameters.
    pub(crate) async fn get<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, &str)],
    ) -> Result<T, GraphError> {
        let response = self
            .inner
            .client
            .get(self.url(path))
            .query(query)
            .query(&[("access_token", self.token())])
            .send()
            .await?;
        Self::handle_response(response).await
    }

    /// Execute a form-encoded POST request.
    pub(crate) async fn post_form<T: DeserializeOwned>(
        &self,
        path: &str,
        form: &[(&str, String)],
    ) -> Result<T, GraphError> {
        let mut params: Vec<(&str, &str)> =
            form.iter().map(|(k, v)| (*k, v.as_str())).collect();
        params.push(("access_token", self.token()));

        let response = self
            .inner
            .client
            .post(self.url(path))
            .form(&params)
            .send()
            .await?;
        Self::handle_response(response).await
    }

    /// Execute a multipart POST request.
    pub(crate) async fn post_multipart<T: DeserializeOwned>(
        &self,
        path: &str,
        form: reqwest::multipart::Form,
    ) -> Result<T, GraphError> {
        let response = self
            .inner
            .client
            .post(self.url(path))
            .query(&[("access_token", self.token())])
            .multipart(form)
            .send()
            .await?;
        Self::handle_response(response).await
    }

    /// Decode a response body, surfacing embedded error payloads.
    async fn handle_response<T: DeserializeOwned>(
        response: reqwest::Response,
    ) -> Result<T, GraphError> {
        let status = response.status();
        let body = response.text().await?;

        if let Ok(envelope) = serde_json::from_str::<ErrorEnvelope>(&body) {
            return Err(Self::classify(status.as_u16(), envelope.error));
        }

        if !status.is_success() {
            if status.as_u16() == 401 {
                return Err(GraphError::InvalidToken(body));
            }
            return Err(GraphError::Api {
                code: i64::from(status.as_u16()),
                message: body,
            });
        }

        serde_json::from_str(&body)
            .map_err(|e| GraphError::Parse(format!("Failed to parse response: {e}")))
    }

    /// Map a platform error payload to a `GraphError`.
    fn classify(status: u16, error: ApiErrorBody) -> GraphError {
        let code = error.code.unwrap_or_else(|| i64::from(status));
        if code == CODE_INVALID_TOKEN || status == 401 {
            return GraphError::InvalidToken(error.message);
        }
        if RATE_LIMIT_CODES.contains(&code) || status == 429 {
            return GraphError::RateLimited {
                code,
                message: error.message,
            };
        }
        GraphError::Api {
            code,
            message: error.message,
        }
    }
}

impl std::fmt::Debug for GraphClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GraphClient")
            .field("api_root", &self.inner.api_root)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn api_error(code: Option<i64>, message: &str) -> ApiErrorBody {
        ApiErrorBody {
            message: message.to_string(),
            code,
            error_type: None,
        }
    }

    #[test]
    fn test_missing_token_fails_fast() {
        let mut config = GraphConfig::new("http://localhost", SecretString::from("x"));
        config.access_token = None;
        assert!(matches!(
            GraphClient::new(&config),
            Err(GraphError::MissingCredential)
        ));

        config.access_token = Some(SecretString::from(""));
        assert!(matches!(
            GraphClient::new(&config),
            Err(GraphError::MissingCredential)
        ));
    }

    #[test]
    fn test_url_joins_version() {
        let config = GraphConfig::new("http://localhost:8080/", SecretString::from("token"));
        let client = GraphClient::new(&config).expect("client");
        assert_eq!(
            client.url("/act_1/campaigns"),
            "http://localhost:8080/v22.0/act_1/campaigns"
        );
        assert!(!format!("{client:?}").contains("token"));
    }

    #[test]
    fn test_classify_errors() {
        assert!(matches!(
            GraphClient::classify(400, api_error(Some(190), "Session has expired")),
            GraphError::InvalidToken(m) if m == "Session has expired"
        ));
        assert!(matches!(
            GraphClient::classify(400, api_error(Some(17), "User request limit reached")),
            GraphError::RateLimited { code: 17, .. }
        ));
        assert!(matches!(
            GraphClient::classify(400, api_error(Some(100), "Invalid parameter")),
            GraphError::Api { code: 100, ref message } if message == "Invalid parameter"
        ));
        assert!(matches!(
            GraphClient::classify(500, api_error(None, "Unknown")),
            GraphError::Api { code: 500, .. }
        ));
    }

    #[test]
    fn test_api_error_display_keeps_message() {
        let err = GraphError::Api {
            code: 100,
            message: "Invalid parameter: daily_budget too low".to_string(),
        };
        assert!(err.to_string().contains("daily_budget too low"));
    }
}
