//! Campaign Launcher library.
//!
//! Creates paused campaign → ad set → creative → ad hierarchies on the ad
//! platform's Graph API for many accounts and stores at once.
//!
//! # Security
//!
//! This crate handles HIGH PRIVILEGE credentials:
//! - Graph API access token (creates objects in every visible ad account)
//! - `OpenAI` API key (copy generation)
//!
//! Both are held as `SecretString` and redacted from `Debug` output.
//!
//! # Modules
//!
//! - [`config`] - Environment configuration
//! - [`graph`] - Graph API client
//! - [`platform`] - `AdPlatform` trait the orchestrator drives
//! - [`copy`] - Best-effort ad copy generation
//! - [`orchestrator`] - Fan-out, per-creative pipeline and progress events
//! - [`request_file`] - YAML launch requests

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod config;
pub mod copy;
pub mod error;
pub mod graph;
pub mod orchestrator;
pub mod platform;
pub mod request_file;

pub use config::LauncherConfig;
pub use copy::CopyWriter;
pub use error::LaunchError;
pub use graph::{GraphClient, GraphError};
pub use orchestrator::{
    LaunchPlan, LaunchTimezone, Orchestrator, OrchestratorSettings, ProgressEvent, ProgressSink,
};
pub use platform::AdPlatform;
