//! Object names and expected object counts for a request.

use chrono::NaiveDate;
use serde::Serialize;

use campaign_launcher_core::{CampaignRequest, FanoutStrategy, StoreProfile};

/// Campaign name: `{COUNTRY} - {PRODUCT} - {TAG} - {dd/mm}`.
#[must_use]
pub fn campaign_name(
    profile: &StoreProfile,
    product: &str,
    strategy: FanoutStrategy,
    run_date: NaiveDate,
) -> String {
    format!(
        "{} - {} - {} - {}",
        profile.country_name,
        product,
        strategy.tag(),
        run_date.format("%d/%m")
    )
}

/// Shared ad set name under ABO/CBO.
#[must_use]
pub fn open_ad_set_name(profile: &StoreProfile) -> String {
    format!("{} - OPEN", profile.country_name)
}

/// Per-creative ad set name; `index` is zero-based.
#[must_use]
pub fn test_ad_set_name(profile: &StoreProfile, index: usize, creative_name: &str) -> String {
    format!("{} - TEST {} ({creative_name})", profile.country_name, index + 1)
}

/// Creative object name for an ad.
#[must_use]
pub fn creative_name(ad_name: &str) -> String {
    format!("Creative - {ad_name}")
}

/// Objects a request will attempt to create.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct LaunchPlan {
    /// (account, store) units.
    pub units: usize,
    pub campaigns: usize,
    pub ad_sets: usize,
    /// Media uploads; every account gets its own copy of every asset.
    pub uploads: usize,
    pub creatives: usize,
    pub ads: usize,
}

impl LaunchPlan {
    /// Counts for N accounts, M stores and K creatives.
    #[must_use]
    pub fn for_request(request: &CampaignRequest) -> Self {
        let units = request.account_ids.len() * request.store_keys.len();
        let k = request.creatives.len();
        Self {
            units,
            campaigns: units,
            ad_sets: units * request.strategy.ad_sets_per_campaign(k),
            uploads: units * k,
            creatives: units * k,
            ads: units * k,
        }
    }
}
