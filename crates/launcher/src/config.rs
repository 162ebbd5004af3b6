//! Launcher configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required for remote operations
//! - `GRAPH_ACCESS_TOKEN` - Ad platform Graph API access token (HIGH PRIVILEGE)
//!
//! ## Optional
//! - `GRAPH_API_VERSION` - Graph API version (default: v22.0)
//! - `GRAPH_BASE_URL` - Graph API host (default: <https://graph.facebook.com>)
//! - `OPENAI_API_KEY` - `OpenAI` API key (enables ad copy generation)
//! - `OPENAI_MODEL` - Chat model (default: gpt-4o-mini)
//! - `OPENAI_BASE_URL` - `OpenAI` API base (default: <https://api.openai.com/v1>)
//! - `COPY_LANGUAGE` - Language the generated copy is written in (default: Spanish)
//! - `VIDEO_POLL_INTERVAL_SECS` - Seconds between video status checks (default: 3)
//! - `VIDEO_POLL_MAX_ATTEMPTS` - Status checks before giving up (default: 200)
//! - `AD_CREATION_DELAY_MS` - Pause after every ad creation (default: 1000)
//! - `MAX_PARALLEL_ACCOUNTS` - Ad accounts processed concurrently (default: 1)
//! - `STORE_REGISTRY_PATH` - YAML file replacing the builtin store table
//! - `SENTRY_DSN` - Sentry error tracking DSN
//! - `SENTRY_ENVIRONMENT` - Sentry environment name

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

use campaign_launcher_core::{StoreProfile, StoreRegistry};
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use thiserror::Error;

const MIN_ENTROPY_BITS_PER_CHAR: f64 = 3.3;

pub const DEFAULT_GRAPH_API_VERSION: &str = "v22.0";
pub const DEFAULT_GRAPH_BASE_URL: &str = "https://graph.facebook.com";
pub const DEFAULT_OPENAI_MODEL: &str = "gpt-4o-mini";
pub const DEFAULT_OPENAI_BASE_URL: &str = "https://api.openai.com/v1";
pub const DEFAULT_COPY_LANGUAGE: &str = "Spanish";
const DEFAULT_VIDEO_POLL_INTERVAL_SECS: u64 = 3;
const DEFAULT_VIDEO_POLL_MAX_ATTEMPTS: u32 = 200;
const DEFAULT_AD_CREATION_DELAY_MS: u64 = 1000;

/// Blocklist of common placeholder patterns (case-insensitive)
const PLACEHOLDER_PATTERNS: &[&str] = &[
    "your-",
    "changeme",
    "replace",
    "placeholder",
    "xxx",
    "todo",
    "fixme",
    "insert",
    "enter-",
    "put-your",
    "add-your",
];

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
    #[error("Insecure secret in {0}: {1}")]
    InsecureSecret(String, String),
    #[error("Invalid store registry {0}: {1}")]
    StoreRegistry(PathBuf, String),
}

/// Launcher configuration.
#[derive(Debug, Clone)]
pub struct LauncherConfig {
    /// Graph API configuration
    pub graph: GraphConfig,
    /// `OpenAI` configuration (optional, enables copy generation)
    pub openai: Option<OpenAIConfig>,
    /// Pause after every ad creation
    pub ad_creation_delay: Duration,
    /// Number of ad accounts processed concurrently
    pub max_parallel_accounts: usize,
    /// YAML store table replacing the builtin registry
    pub store_registry_path: Option<PathBuf>,
    /// Sentry DSN for error tracking
    pub sentry_dsn: Option<String>,
    /// Sentry environment (e.g., "development", "production")
    pub sentry_environment: Option<String>,
}

/// Bounded polling policy for video transcoding.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VideoPollPolicy {
    /// Delay between status checks.
    pub interval: Duration,
    /// Status checks before the upload is declared timed out.
    pub max_attempts: u32,
}

impl Default for VideoPollPolicy {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(DEFAULT_VIDEO_POLL_INTERVAL_SECS),
            max_attempts: DEFAULT_VIDEO_POLL_MAX_ATTEMPTS,
        }
    }
}

/// Graph API configuration.
///
/// Implements `Debug` manually to redact the HIGH PRIVILEGE access token.
#[derive(Clone)]
pub struct GraphConfig {
    /// Access token; `None` until one is configured
    pub access_token: Option<SecretString>,
    /// API version path segment (e.g., v22.0)
    pub api_version: String,
    /// Scheme and host (e.g., <https://graph.facebook.com>)
    pub base_url: String,
    /// Video readiness polling policy
    pub video_poll: VideoPollPolicy,
}

impl std::fmt::Debug for GraphConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GraphConfig")
            .field(
                "access_token",
                &self.access_token.as_ref().map(|_| "[REDACTED]"),
            )
            .field("api_version", &self.api_version)
            .field("base_url", &self.base_url)
            .field("video_poll", &self.video_poll)
            .finish()
    }
}

impl GraphConfig {
    /// Versioned API root, e.g. `https://graph.facebook.com/v22.0`.
    #[must_use]
    pub fn api_root(&self) -> String {
        format!(
            "{}/{}",
            self.base_url.trim_end_matches('/'),
            self.api_version.trim_matches('/')
        )
    }

    /// Config pointing at `base_url` with the given token, default version
    /// and polling policy.
    #[must_use]
    pub fn new(base_url: impl Into<String>, access_token: SecretString) -> Self {
        Self {
            access_token: Some(access_token),
            api_version: DEFAULT_GRAPH_API_VERSION.to_string(),
            base_url: base_url.into(),
            video_poll: VideoPollPolicy::default(),
        }
    }
}

/// `OpenAI` API configuration for ad copy generation.
///
/// Implements `Debug` manually to redact the API key.
#[derive(Clone)]
pub struct OpenAIConfig {
    /// `OpenAI` API key
    pub api_key: SecretString,
    /// Chat model ID
    pub model: String,
    /// API base URL
    pub base_url: String,
    /// Language the copy is written in
    pub language: String,
}

impl std::fmt::Debug for OpenAIConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OpenAIConfig")
            .field("api_key", &"[REDACTED]")
            .field("model", &self.model)
            .field("base_url", &self.base_url)
            .field("language", &self.language)
            .finish()
    }
}

impl LauncherConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if a variable is present but invalid.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration through an arbitrary key lookup.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if a variable is present but invalid.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let env = Env(&lookup);

        let graph = GraphConfig {
            access_token: env.optional_secret("GRAPH_ACCESS_TOKEN"),
            api_version: env.or_default("GRAPH_API_VERSION", DEFAULT_GRAPH_API_VERSION),
            base_url: env.or_default("GRAPH_BASE_URL", DEFAULT_GRAPH_BASE_URL),
            video_poll: VideoPollPolicy {
                interval: Duration::from_secs(
                    env.parse_or("VIDEO_POLL_INTERVAL_SECS", DEFAULT_VIDEO_POLL_INTERVAL_SECS)?,
                ),
                max_attempts: env
                    .parse_or("VIDEO_POLL_MAX_ATTEMPTS", DEFAULT_VIDEO_POLL_MAX_ATTEMPTS)?,
            },
        };
        if graph.video_poll.max_attempts == 0 {
            return Err(ConfigError::InvalidEnvVar(
                "VIDEO_POLL_MAX_ATTEMPTS".to_string(),
                "must be at least 1".to_string(),
            ));
        }

        let openai = env.optional_secret("OPENAI_API_KEY").map(|api_key| OpenAIConfig {
            api_key,
            model: env.or_default("OPENAI_MODEL", DEFAULT_OPENAI_MODEL),
            base_url: env.or_default("OPENAI_BASE_URL", DEFAULT_OPENAI_BASE_URL),
            language: env.or_default("COPY_LANGUAGE", DEFAULT_COPY_LANGUAGE),
        });

        let max_parallel_accounts: usize = env.parse_or("MAX_PARALLEL_ACCOUNTS", 1)?;
        if max_parallel_accounts == 0 {
            return Err(ConfigError::InvalidEnvVar(
                "MAX_PARALLEL_ACCOUNTS".to_string(),
                "must be at least 1".to_string(),
            ));
        }

        Ok(Self {
            graph,
            openai,
            ad_creation_delay: Duration::from_millis(
                env.parse_or("AD_CREATION_DELAY_MS", DEFAULT_AD_CREATION_DELAY_MS)?,
            ),
            max_parallel_accounts,
            store_registry_path: env.optional("STORE_REGISTRY_PATH").map(PathBuf::from),
            sentry_dsn: env.optional("SENTRY_DSN"),
            sentry_environment: env.optional("SENTRY_ENVIRONMENT"),
        })
    }

    /// Returns a reference to the `OpenAI` configuration, if available.
    ///
    /// Returns `None` if `OPENAI_API_KEY` was not set, which makes copy
    /// generation fall back to default copy.
    #[must_use]
    pub const fn openai(&self) -> Option<&OpenAIConfig> {
        self.openai.as_ref()
    }

    /// Load the store registry: the YAML file if configured, else the builtin
    /// table.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::StoreRegistry` if the file cannot be read or is
    /// not a valid store table.
    pub fn store_registry(&self) -> Result<StoreRegistry, ConfigError> {
        match &self.store_registry_path {
            Some(path) => load_store_registry(path),
            None => Ok(StoreRegistry::builtin()),
        }
    }
}

/// YAML layout of a store table file.
#[derive(Debug, Deserialize)]
struct StoreRegistryFile {
    stores: Vec<StoreProfile>,
}

/// Read a store table from a YAML file.
///
/// # Errors
///
/// Returns `ConfigError::StoreRegistry` on I/O, parse or duplicate-key errors.
pub fn load_store_registry(path: &Path) -> Result<StoreRegistry, ConfigError> {
    let content = std::fs::read_to_string(path)
        .map_err(|e| ConfigError::StoreRegistry(path.to_path_buf(), e.to_string()))?;
    parse_store_registry(&content)
        .map_err(|e| ConfigError::StoreRegistry(path.to_path_buf(), e))
}

fn parse_store_registry(content: &str) -> Result<StoreRegistry, String> {
    let file: StoreRegistryFile = serde_yaml::from_str(content).map_err(|e| e.to_string())?;
    StoreRegistry::from_profiles(file.stores).map_err(|e| e.to_string())
}

// =============================================================================
// Helper Functions
// =============================================================================

struct Env<'a>(&'a dyn Fn(&str) -> Option<String>);

impl Env<'_> {
    /// Get an optional, non-blank variable.
    fn optional(&self, key: &str) -> Option<String> {
        (self.0)(key).filter(|v| !v.trim().is_empty())
    }

    /// Get a variable with a default value.
    fn or_default(&self, key: &str, default: &str) -> String {
        self.optional(key).unwrap_or_else(|| default.to_string())
    }

    /// Parse a variable, falling back to `default` when unset.
    fn parse_or<T: FromStr>(&self, key: &str, default: T) -> Result<T, ConfigError>
    where
        T::Err: std::fmt::Display,
    {
        self.optional(key).map_or(Ok(default), |raw| {
            raw.trim()
                .parse()
                .map_err(|e: T::Err| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))
        })
    }

    /// Get an optional secret; weak-looking values are accepted with a warning.
    fn optional_secret(&self, key: &str) -> Option<SecretString> {
        self.optional(key).map(|value| {
            if let Err(e) = validate_secret_strength(&value, key) {
                tracing::warn!("{key} validation warning: {e}");
            }
            SecretString::from(value)
        })
    }
}

/// Calculate Shannon entropy in bits per character.
fn shannon_entropy(s: &str) -> f64 {
    if s.is_empty() {
        return 0.0;
    }

    let mut freq: HashMap<char, usize> = HashMap::new();
    for c in s.chars() {
        *freq.entry(c).or_insert(0) += 1;
    }

    #[allow(clippy::cast_precision_loss)] // String length will never exceed f64 precision
    let len = s.chars().count() as f64;
    freq.values()
        .map(|&count| {
            #[allow(clippy::cast_precision_loss)] // Character count will never exceed f64 precision
            let p = count as f64 / len;
            -p * p.log2()
        })
        .sum()
}

/// Validate that a secret is not a placeholder and has sufficient entropy.
fn validate_secret_strength(secret: &str, var_name: &str) -> Result<(), ConfigError> {
    let lower = secret.to_lowercase();

    for pattern in PLACEHOLDER_PATTERNS {
        if lower.contains(pattern) {
            return Err(ConfigError::InsecureSecret(
                var_name.to_string(),
                format!("appears to be a placeholder (contains '{pattern}')"),
            ));
        }
    }

    let entropy = shannon_entropy(secret);
    if entropy < MIN_ENTROPY_BITS_PER_CHAR {
        return Err(ConfigError::InsecureSecret(
            var_name.to_string(),
            format!(
                "entropy too low ({entropy:.2} bits/char, need >= {MIN_ENTROPY_BITS_PER_CHAR:.1})"
            ),
        ));
    }

    Ok(())
}

/// Whether a secret is present and non-blank.
pub(crate) fn has_secret(secret: Option<&SecretString>) -> bool {
    secret.is_some_and(|s| !s.expose_secret().trim().is_empty())
}
