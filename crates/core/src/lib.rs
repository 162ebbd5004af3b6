//! Campaign Launcher Core - Shared types library.
//!
//! This crate provides the types shared by every launcher component:
//! - `launcher` - Graph API client, copy generation and the orchestrator
//! - `cli` - Command-line entry point
//!
//! # Architecture
//!
//! The core crate contains only types and pure functions - no I/O, no HTTP
//! clients. This keeps it lightweight and allows it to be used anywhere.
//!
//! # Modules
//!
//! - [`types`] - Newtype wrappers for IDs, codes, budgets and enums
//! - [`store`] - Store registry with per-brand pixel/page identifiers
//! - [`request`] - Campaign request, creative assets, ad copy and validation
//! - [`media`] - Account-scoped uploaded media references
//! - [`report`] - Per-unit outcomes and the run report

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod media;
pub mod report;
pub mod request;
pub mod store;
pub mod types;

pub use media::{MediaRef, UploadedMedia};
pub use report::{CreativeReport, CreativeStage, RunOutcome, RunReport, UnitReport};
pub use request::{
    AdCopy, AssetSource, CampaignRequest, CopySource, CreativeAsset, LAUNCH_HOUR,
    ValidationError,
};
pub use store::{StoreKey, StoreProfile, StoreRegistry, StoreRegistryError};
pub use types::*;
