//! Graph API request specs and response types.
//!
//! Requests are form-encoded; nested values (targeting, story specs) are
//! JSON strings inside the form, as the Graph API expects.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use serde_json::json;

use campaign_launcher_core::{
    Budget, CallToAction, CampaignId, CountryCode, Gender, MediaRef, PageId, PixelId,
    UploadedMedia,
};

/// Created objects are always paused; nothing is ever auto-activated.
pub const STATUS_PAUSED: &str = "PAUSED";
pub const OBJECTIVE_SALES: &str = "OUTCOME_SALES";
pub const BID_STRATEGY_LOWEST_COST: &str = "LOWEST_COST_WITHOUT_CAP";
pub const BILLING_EVENT_IMPRESSIONS: &str = "IMPRESSIONS";
pub const OPTIMIZATION_GOAL_CONVERSIONS: &str = "OFFSITE_CONVERSIONS";
pub const CONVERSION_EVENT_PURCHASE: &str = "PURCHASE";
pub const DESTINATION_WEBSITE: &str = "WEBSITE";
pub const AGE_MIN: u8 = 18;
pub const AGE_MAX: u8 = 65;

// =============================================================================
// Responses
// =============================================================================

/// Error payload embedded in a response body.
#[derive(Debug, Clone, Deserialize)]
pub struct ErrorEnvelope {
    pub error: ApiErrorBody,
}

/// Platform error details.
#[derive(Debug, Clone, Deserialize)]
pub struct ApiErrorBody {
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub code: Option<i64>,
    #[serde(default, rename = "type")]
    pub error_type: Option<String>,
}

/// Response of every creation endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct CreatedObject {
    pub id: Option<String>,
}

/// `GET /me/adaccounts` response.
#[derive(Debug, Clone, Deserialize)]
pub struct AdAccountsResponse {
    pub data: Option<Vec<AdAccountEntry>>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AdAccountEntry {
    pub account_id: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub currency: Option<String>,
}

impl AdAccountEntry {
    /// Label shown to users, e.g. `Tienda Principal (COP)`.
    #[must_use]
    pub fn label(&self) -> String {
        format!(
            "{} ({})",
            self.name.as_deref().unwrap_or(&self.account_id),
            self.currency.as_deref().unwrap_or("?")
        )
    }
}

/// `POST /{account}/adimages` response, keyed by uploaded file name.
#[derive(Debug, Clone, Deserialize)]
pub struct ImageUploadResponse {
    pub images: HashMap<String, ImageEntry>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ImageEntry {
    pub hash: String,
}

/// `GET /{video}?fields=status,picture` response.
#[derive(Debug, Clone, Deserialize)]
pub struct VideoStatusResponse {
    #[serde(default)]
    pub status: Option<VideoStatus>,
    #[serde(default)]
    pub picture: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct VideoStatus {
    #[serde(default)]
    pub video_status: Option<VideoState>,
}

/// Transcoding state of an uploaded video.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VideoState {
    Ready,
    Error,
    #[serde(other)]
    Processing,
}

impl VideoStatusResponse {
    /// Current state; a missing status counts as still processing.
    #[must_use]
    pub fn state(&self) -> VideoState {
        self.status
            .as_ref()
            .and_then(|s| s.video_status)
            .unwrap_or(VideoState::Processing)
    }
}

// =============================================================================
// Request specs
// =============================================================================

/// Campaign to create under an ad account.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CampaignSpec {
    pub name: String,
    /// Set only when the budget is pooled at campaign level.
    pub daily_budget: Option<Budget>,
}

impl CampaignSpec {
    /// Form parameters for `POST /{account}/campaigns`.
    #[must_use]
    pub fn to_form(&self) -> Vec<(&'static str, String)> {
        let mut form = vec![
            ("name", self.name.clone()),
            ("objective", OBJECTIVE_SALES.to_string()),
            ("status", STATUS_PAUSED.to_string()),
            ("special_ad_categories", "[]".to_string()),
        ];
        if let Some(budget) = self.daily_budget {
            form.push(("daily_budget", budget.minor_units().to_string()));
            form.push(("bid_strategy", BID_STRATEGY_LOWEST_COST.to_string()));
        }
        form
    }
}

/// Audience targeting: one country, fixed age band, optional gender.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Targeting {
    pub geo_locations: GeoLocations,
    pub age_min: u8,
    pub age_max: u8,
    /// Omitted entirely when unrestricted.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub genders: Option<Vec<u8>>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GeoLocations {
    pub countries: Vec<CountryCode>,
}

impl Targeting {
    #[must_use]
    pub fn new(country: CountryCode, gender: Gender) -> Self {
        Self {
            geo_locations: GeoLocations {
                countries: vec![country],
            },
            age_min: AGE_MIN,
            age_max: AGE_MAX,
            genders: gender.platform_code().map(|code| vec![code]),
        }
    }
}

/// Ad set to create under a campaign.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdSetSpec {
    pub name: String,
    pub campaign_id: CampaignId,
    pub targeting: Targeting,
    /// Scheduled start as a unix timestamp.
    pub start_time: i64,
    pub pixel_id: PixelId,
    /// Set only when the budget lives on the ad set.
    pub daily_budget: Option<Budget>,
}

impl AdSetSpec {
    /// Form parameters for `POST /{account}/adsets`.
    #[must_use]
    pub fn to_form(&self) -> Vec<(&'static str, String)> {
        let mut form = vec![
            ("name", self.name.clone()),
            ("campaign_id", self.campaign_id.to_string()),
            ("status", STATUS_PAUSED.to_string()),
            ("targeting", json!(self.targeting).to_string()),
            ("start_time", self.start_time.to_string()),
            ("billing_event", BILLING_EVENT_IMPRESSIONS.to_string()),
            ("optimization_goal", OPTIMIZATION_GOAL_CONVERSIONS.to_string()),
            (
                "promoted_object",
                json!({
                    "pixel_id": self.pixel_id,
                    "custom_event_type": CONVERSION_EVENT_PURCHASE,
                })
                .to_string(),
            ),
            ("destination_type", DESTINATION_WEBSITE.to_string()),
            (
                "attribution_spec",
                json!([
                    {"event_type": "CLICK_THROUGH", "window_days": 7},
                    {"event_type": "VIEW_THROUGH", "window_days": 1},
                ])
                .to_string(),
            ),
            ("bid_strategy", BID_STRATEGY_LOWEST_COST.to_string()),
        ];
        if let Some(budget) = self.daily_budget {
            form.push(("daily_budget", budget.minor_units().to_string()));
        }
        form
    }
}

/// Ad creative: uploaded media plus copy and call to action.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreativeSpec {
    pub name: String,
    pub page_id: PageId,
    pub media: UploadedMedia,
    pub link: String,
    pub headline: String,
    pub body: String,
    pub call_to_action: CallToAction,
}

impl CreativeSpec {
    /// Story spec: video variant for videos, link variant for images.
    #[must_use]
    pub fn object_story_spec(&self) -> serde_json::Value {
        match &self.media.media {
            MediaRef::Video {
                video_id,
                thumbnail_url,
            } => {
                let mut video_data = json!({
                    "video_id": video_id,
                    "message": self.body,
                    "title": self.headline,
                    "call_to_action": {
                        "type": self.call_to_action.as_str(),
                        "value": {"link": self.link},
                    },
                });
                if !thumbnail_url.is_empty() {
                    video_data["image_url"] = json!(thumbnail_url);
                }
                json!({"page_id": self.page_id, "video_data": video_data})
            }
            MediaRef::Image { hash } => json!({
                "page_id": self.page_id,
                "link_data": {
                    "image_hash": hash,
                    "link": self.link,
                    "message": self.body,
                    "name": self.headline,
                    "call_to_action": {"type": self.call_to_action.as_str()},
                },
            }),
        }
    }

    /// Form parameters for `POST /{account}/adcreatives`.
    #[must_use]
    pub fn to_form(&self) -> Vec<(&'static str, String)> {
        vec![
            ("name", self.name.clone()),
            ("object_story_spec", self.object_story_spec().to_string()),
        ]
    }
}
