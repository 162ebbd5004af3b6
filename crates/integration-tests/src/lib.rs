//! Integration test support for the campaign launcher.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p campaign-launcher-integration-tests
//! ```
//!
//! Nothing here talks to the real ad platform: orchestrator tests run against
//! [`FakePlatform`], client tests against local axum servers from [`mock`].
//!
//! # Test Categories
//!
//! - `orchestrator_fanout` - Object counts and naming per strategy
//! - `orchestrator_failures` - Failure isolation and cancellation
//! - `graph_client` - HTTP client against a mock Graph API
//! - `copy_generation` - Copy writer against a mock `OpenAI` API

#![cfg_attr(not(test), forbid(unsafe_code))]
#![allow(clippy::missing_panics_doc, clippy::expect_used)]

pub mod fake;
pub mod mock;

use std::time::Duration;

use chrono::{FixedOffset, NaiveDate};

use campaign_launcher::{LaunchTimezone, OrchestratorSettings};
use campaign_launcher_core::{
    AdAccountId, Budget, CallToAction, CampaignRequest, CreativeAsset, FanoutStrategy, Gender,
    MediaKind, StoreKey,
};

pub use fake::{Call, FakePlatform};

/// Fixed launch date used by every request fixture.
#[must_use]
pub fn launch_date() -> NaiveDate {
    NaiveDate::from_ymd_opt(2026, 3, 14).expect("valid date")
}

/// Bogota, UTC-5 with no DST.
#[must_use]
pub fn bogota() -> FixedOffset {
    FixedOffset::west_opt(5 * 3600).expect("valid offset")
}

/// Settings with no pauses, a fixed clock and a fixed timezone.
#[must_use]
pub fn settings() -> OrchestratorSettings {
    OrchestratorSettings {
        ad_creation_delay: Duration::ZERO,
        max_parallel_accounts: 1,
        run_date: Some(NaiveDate::from_ymd_opt(2026, 3, 13).expect("valid date")),
        timezone: LaunchTimezone::Fixed(bogota()),
    }
}

#[must_use]
pub fn account(n: u64) -> AdAccountId {
    AdAccountId::parse(&n.to_string()).expect("valid account")
}

/// Local JPEG creative.
#[must_use]
pub fn image(name: &str) -> CreativeAsset {
    CreativeAsset::local(
        format!("{name}.jpg"),
        vec![0xFF, 0xD8, 0xFF, 0xE0, 1, 2, 3],
        MediaKind::Image,
        "image/jpeg",
        format!("{name} - LAMPARA"),
    )
}

/// Local MP4 creative.
#[must_use]
pub fn video(name: &str) -> CreativeAsset {
    CreativeAsset::local(
        format!("{name}.mp4"),
        vec![0, 0, 0, 0x18, b'f', b't', b'y', b'p'],
        MediaKind::Video,
        "video/mp4",
        format!("{name} - LAMPARA"),
    )
}

/// A valid request for the given fan-out.
#[must_use]
pub fn request(
    strategy: FanoutStrategy,
    accounts: &[u64],
    stores: &[&str],
    creatives: Vec<CreativeAsset>,
) -> CampaignRequest {
    CampaignRequest {
        account_ids: accounts.iter().copied().map(account).collect(),
        store_keys: stores.iter().map(|s| StoreKey::new(s)).collect(),
        start_date: launch_date(),
        gender: Gender::All,
        product_name: "LAMPARA".to_string(),
        destination_url: "shop.example.com/lampara".to_string(),
        strategy,
        budget: Budget::new(40_000).expect("valid budget"),
        headline: "¡Pide hoy y Paga en Casa!".to_string(),
        body: "Envío gratis".to_string(),
        call_to_action: CallToAction::OrderNow,
        creatives,
    }
}
