//! Campaign launch request and its validation.

use std::collections::HashSet;

use bytes::Bytes;
use chrono::{DateTime, NaiveDate, NaiveTime, TimeZone};
use serde::{Deserialize, Serialize};

use crate::store::{StoreKey, StoreRegistry};
use crate::types::{AdAccountId, Budget, CallToAction, FanoutStrategy, Gender, MediaKind};

/// Hour of the local day at which every launch is scheduled.
pub const LAUNCH_HOUR: u32 = 5;

/// Where a creative's bytes come from.
#[derive(Clone, PartialEq, Eq)]
pub enum AssetSource {
    /// File content read once from disk; `Bytes` clones share the buffer so
    /// the content can be uploaded to every account.
    LocalFile { file_name: String, bytes: Bytes },
    /// Publicly reachable URL the platform fetches itself.
    RemoteUrl(String),
}

impl std::fmt::Debug for AssetSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::LocalFile { file_name, bytes } => f
                .debug_struct("LocalFile")
                .field("file_name", file_name)
                .field("len", &bytes.len())
                .finish(),
            Self::RemoteUrl(url) => f.debug_tuple("RemoteUrl").field(url).finish(),
        }
    }
}

/// One image or video to turn into an ad.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreativeAsset {
    pub source: AssetSource,
    pub kind: MediaKind,
    /// MIME type sent with local uploads (e.g. `image/jpeg`).
    pub mime_type: String,
    /// Name used for the ad and, prefixed, for the creative object.
    pub display_name: String,
}

impl CreativeAsset {
    /// Creative backed by in-memory file content.
    #[must_use]
    pub fn local(
        file_name: impl Into<String>,
        bytes: impl Into<Bytes>,
        kind: MediaKind,
        mime_type: impl Into<String>,
        display_name: impl Into<String>,
    ) -> Self {
        Self {
            source: AssetSource::LocalFile {
                file_name: file_name.into(),
                bytes: bytes.into(),
            },
            kind,
            mime_type: mime_type.into(),
            display_name: display_name.into(),
        }
    }

    /// Creative the platform downloads from a URL.
    #[must_use]
    pub fn remote(url: impl Into<String>, kind: MediaKind, display_name: impl Into<String>) -> Self {
        let mime_type = match kind {
            MediaKind::Image => "image/jpeg",
            MediaKind::Video => "video/mp4",
        };
        Self {
            source: AssetSource::RemoteUrl(url.into()),
            kind,
            mime_type: mime_type.to_string(),
            display_name: display_name.into(),
        }
    }
}

/// Where a piece of ad copy came from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum CopySource {
    /// Written by the language model.
    Generated,
    /// Generation failed; defaults were substituted.
    Fallback { reason: String },
}

/// Headline and body text for an ad.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdCopy {
    pub headline: String,
    pub body: String,
    pub source: CopySource,
}

impl AdCopy {
    pub const DEFAULT_HEADLINE: &'static str = "¡Pide hoy y Paga en Casa!";
    pub const DEFAULT_BODY: &'static str =
        "🚚 Envío a todo el país. 💵 Pagas cuando lo recibes. ¡Unidades limitadas, pide el tuyo hoy!";

    /// Default copy used when generation is unavailable.
    #[must_use]
    pub fn fallback(reason: impl Into<String>) -> Self {
        Self {
            headline: Self::DEFAULT_HEADLINE.to_string(),
            body: Self::DEFAULT_BODY.to_string(),
            source: CopySource::Fallback {
                reason: reason.into(),
            },
        }
    }

    /// Whether defaults were substituted.
    #[must_use]
    pub const fn is_fallback(&self) -> bool {
        matches!(self.source, CopySource::Fallback { .. })
    }
}

/// Errors found when validating a [`CampaignRequest`].
///
/// Validation runs once before any remote call is made.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("at least one ad account must be selected")]
    NoAccounts,
    #[error("at least one store must be selected")]
    NoStores,
    #[error("at least one creative is required")]
    NoCreatives,
    #[error("destination URL is required")]
    MissingDestinationUrl,
    #[error("product name is required")]
    MissingProductName,
    #[error("headline is required")]
    MissingHeadline,
    #[error("ad account selected twice: {0}")]
    DuplicateAccount(AdAccountId),
    #[error("store selected twice: {0}")]
    DuplicateStore(StoreKey),
    #[error("unknown store: {0}")]
    UnknownStore(StoreKey),
    #[error("{date} {hour:02}:00 does not exist in the local timezone")]
    InvalidLaunchTime { date: NaiveDate, hour: u32 },
}

/// Everything needed to launch one product across accounts and stores.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CampaignRequest {
    pub account_ids: Vec<AdAccountId>,
    pub store_keys: Vec<StoreKey>,
    pub start_date: NaiveDate,
    pub gender: Gender,
    pub product_name: String,
    pub destination_url: String,
    pub strategy: FanoutStrategy,
    /// Per campaign under ABO/CBO, per creative under `PerCreativeTest`.
    pub budget: Budget,
    pub headline: String,
    pub body: String,
    pub call_to_action: CallToAction,
    pub creatives: Vec<CreativeAsset>,
}

impl CampaignRequest {
    /// Check the request before any remote side effect.
    ///
    /// # Errors
    ///
    /// Returns the first problem found.
    pub fn validate(&self, registry: &StoreRegistry) -> Result<(), ValidationError> {
        if self.account_ids.is_empty() {
            return Err(ValidationError::NoAccounts);
        }
        if self.store_keys.is_empty() {
            return Err(ValidationError::NoStores);
        }
        if self.creatives.is_empty() {
            return Err(ValidationError::NoCreatives);
        }
        if self.destination_url.trim().is_empty() {
            return Err(ValidationError::MissingDestinationUrl);
        }
        if self.product_name.trim().is_empty() {
            return Err(ValidationError::MissingProductName);
        }
        if self.headline.trim().is_empty() {
            return Err(ValidationError::MissingHeadline);
        }

        let mut seen_accounts = HashSet::new();
        for account in &self.account_ids {
            if !seen_accounts.insert(account) {
                return Err(ValidationError::DuplicateAccount(account.clone()));
            }
        }

        let mut seen_stores = HashSet::new();
        for key in &self.store_keys {
            if !seen_stores.insert(key) {
                return Err(ValidationError::DuplicateStore(key.clone()));
            }
            if !registry.contains(key) {
                return Err(ValidationError::UnknownStore(key.clone()));
            }
        }

        Ok(())
    }

    /// Destination URL with a scheme, defaulting to `https://`.
    #[must_use]
    pub fn normalized_destination_url(&self) -> String {
        let url = self.destination_url.trim();
        if url.starts_with("http://") || url.starts_with("https://") {
            url.to_string()
        } else {
            format!("https://{url}")
        }
    }

    /// Scheduled start: `start_date` at [`LAUNCH_HOUR`]:00 in `tz`.
    ///
    /// When a DST fold makes the local time ambiguous the earlier instant is
    /// used.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::InvalidLaunchTime`] if the local time is
    /// skipped by a DST gap.
    pub fn launch_time<Tz: TimeZone>(&self, tz: &Tz) -> Result<DateTime<Tz>, ValidationError> {
        let launch = NaiveTime::from_hms_opt(LAUNCH_HOUR, 0, 0).unwrap_or(NaiveTime::MIN);
        tz.from_local_datetime(&self.start_date.and_time(launch))
            .earliest()
            .ok_or(ValidationError::InvalidLaunchTime {
                date: self.start_date,
                hour: LAUNCH_HOUR,
            })
    }

    /// Replace headline and body with the given copy.
    pub fn apply_copy(&mut self, copy: &AdCopy) {
        self.headline.clone_from(&copy.headline);
        self.body.clone_from(&copy.body);
    }
}
