//! Ad copy generation via the `OpenAI` chat completions API.
//!
//! Copy generation is best-effort: [`CopyWriter::generate`] always returns a
//! usable [`AdCopy`], substituting the default copy on any failure.

use reqwest::header::{AUTHORIZATION, CONTENT_TYPE, HeaderMap, HeaderValue};
use secrecy::ExposeSecret;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{info, instrument, warn};

use crate::config::OpenAIConfig;
use campaign_launcher_core::{AdCopy, CopySource};

/// Maximum headline length in characters.
pub const MAX_HEADLINE_CHARS: usize = 40;

/// Errors raised while generating copy. Never leave this module.
#[derive(Debug, Error)]
pub enum CopyError {
    #[error("OpenAI API key not configured")]
    MissingCredential,

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("OpenAI API error ({status}): {body}")]
    Api { status: u16, body: String },

    #[error("invalid completion: {0}")]
    InvalidResponse(String),
}

/// Client that writes a headline and body for a product.
#[derive(Clone)]
pub struct CopyWriter {
    client: Option<ConfiguredClient>,
}

#[derive(Clone)]
struct ConfiguredClient {
    http: reqwest::Client,
    url: String,
    model: String,
    language: String,
}

impl CopyWriter {
    /// Create a copy writer; without a config every call returns the default
    /// copy.
    #[must_use]
    pub fn new(config: Option<&OpenAIConfig>) -> Self {
        let client = config.and_then(|config| match Self::build_client(config) {
            Ok(client) => Some(client),
            Err(e) => {
                warn!("Copy generation disabled: {e}");
                None
            }
        });
        Self { client }
    }

    fn build_client(config: &OpenAIConfig) -> Result<ConfiguredClient, CopyError> {
        let key = config.api_key.expose_secret().trim();
        if key.is_empty() {
            return Err(CopyError::MissingCredential);
        }

        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers.insert(
            AUTHORIZATION,
            HeaderValue::from_str(&format!("Bearer {key}")).map_err(|e| {
                CopyError::InvalidResponse(format!("Invalid API key for header: {e}"))
            })?,
        );

        let http = reqwest::Client::builder()
            .default_headers(headers)
            .build()?;

        Ok(ConfiguredClient {
            http,
            url: format!("{}/chat/completions", config.base_url.trim_end_matches('/')),
            model: config.model.clone(),
            language: config.language.clone(),
        })
    }

    /// Whether a credential is configured.
    #[must_use]
    pub const fn is_enabled(&self) -> bool {
        self.client.is_some()
    }

    /// Generate a headline and body for a product.
    ///
    /// Never fails; on any error the default copy is returned with the
    /// reason recorded in [`CopySource::Fallback`].
    #[instrument(skip(self, context))]
    pub async fn generate(&self, product: &str, context: &str) -> AdCopy {
        match self.try_generate(product, context).await {
            Ok(copy) => {
                info!(headline = %copy.headline, "Ad copy generated");
                copy
            }
            Err(e) => {
                warn!("Copy generation failed, using default copy: {e}");
                AdCopy::fallback(e.to_string())
            }
        }
    }

    async fn try_generate(&self, product: &str, context: &str) -> Result<AdCopy, CopyError> {
        let client = self.client.as_ref().ok_or(CopyError::MissingCredential)?;

        let request = ChatRequest {
            model: &client.model,
            messages: vec![ChatMessage {
                role: "user",
                content: prompt(product, context, &client.language),
            }],
            response_format: ResponseFormat {
                format_type: "json_object",
            },
        };

        let response = client.http.post(&client.url).json(&request).send().await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(CopyError::Api {
                status: status.as_u16(),
                body,
            });
        }

        let completion: ChatResponse = response
            .json()
            .await
            .map_err(|e| CopyError::InvalidResponse(e.to_string()))?;
        let content = completion
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .ok_or_else(|| CopyError::InvalidResponse("no choices in response".to_string()))?;

        parse_copy(&content)
    }
}

impl std::fmt::Debug for CopyWriter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CopyWriter")
            .field("enabled", &self.is_enabled())
            .finish_non_exhaustive()
    }
}

fn prompt(product: &str, context: &str, language: &str) -> String {
    format!(
        "Act as a direct-response dropshipping copywriter. Product: {product}. \
         Context: {context}. Write, in {language}, a headline of at most \
         {MAX_HEADLINE_CHARS} characters and a persuasive body with emojis. \
         Reply with JSON only: {{\"headline\": \"...\", \"body\": \"...\"}}"
    )
}

/// Parse the model's JSON answer into copy.
fn parse_copy(content: &str) -> Result<AdCopy, CopyError> {
    let generated: GeneratedCopy = serde_json::from_str(content)
        .map_err(|e| CopyError::InvalidResponse(format!("completion is not copy JSON: {e}")))?;

    let headline = generated.headline.trim();
    let body = generated.body.trim();
    if headline.is_empty() || body.is_empty() {
        return Err(CopyError::InvalidResponse(
            "headline or body is empty".to_string(),
        ));
    }

    Ok(AdCopy {
        headline: headline.chars().take(MAX_HEADLINE_CHARS).collect(),
        body: body.to_string(),
        source: CopySource::Generated,
    })
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage>,
    response_format: ResponseFormat,
}

#[derive(Debug, Serialize)]
struct ChatMessage {
    role: &'static str,
    content: String,
}

#[derive(Debug, Serialize)]
struct ResponseFormat {
    #[serde(rename = "type")]
    format_type: &'static str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChatChoiceMessage {
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct GeneratedCopy {
    #[serde(default)]
    headline: String,
    #[serde(default)]
    body: String,
}

#[cfg(test)]
mod tests {
    use secrecy::SecretString;

    use super::*;

    #[tokio::test]
    async fn test_missing_key_returns_default_copy() {
        let writer = CopyWriter::new(None);
        assert!(!writer.is_enabled());

        let copy = writer.generate("LAMPARA", "lámpara LED recargable").await;
        assert!(copy.is_fallback());
        assert_eq!(copy.headline, AdCopy::DEFAULT_HEADLINE);
        assert!(!copy.body.is_empty());
    }

    #[test]
    fn test_blank_key_disables_generation() {
        let config = OpenAIConfig {
            api_key: SecretString::from("  "),
            model: "gpt-4o-mini".to_string(),
            base_url: "http://localhost".to_string(),
            language: "Spanish".to_string(),
        };
        assert!(!CopyWriter::new(Some(&config)).is_enabled());
    }

    #[test]
    fn test_parse_copy_truncates_headline() {
        let copy = parse_copy(
            r#"{"headline": "Ilumina tu casa con la lámpara más brillante del mercado", "body": "✨ Luz sin cables"}"#,
        )
        .expect("valid copy");
        assert_eq!(copy.headline.chars().count(), MAX_HEADLINE_CHARS);
        assert_eq!(copy.body, "✨ Luz sin cables");
        assert_eq!(copy.source, CopySource::Generated);
    }

    #[test]
    fn test_parse_copy_rejects_bad_output() {
        assert!(parse_copy("not json").is_err());
        assert!(parse_copy(r#"{"headline": "", "body": "x"}"#).is_err());
        assert!(parse_copy(r#"{"body": "x"}"#).is_err());
    }

    #[test]
    fn test_prompt_mentions_product_and_language() {
        let text = prompt("LAMPARA", "LED", "Spanish");
        assert!(text.contains("LAMPARA"));
        assert!(text.contains("Spanish"));
        assert!(text.contains("JSON"));
    }
}
