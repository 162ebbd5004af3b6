//! Per-unit outcomes and the aggregate run report.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::store::StoreKey;
use crate::types::{AdAccountId, AdId};

/// Outcome of one unit of work.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum RunOutcome {
    Success,
    Failure { reason: String },
}

impl RunOutcome {
    #[must_use]
    pub fn failure(reason: impl Into<String>) -> Self {
        Self::Failure {
            reason: reason.into(),
        }
    }

    #[must_use]
    pub const fn is_success(&self) -> bool {
        matches!(self, Self::Success)
    }

    /// Failure reason, if any.
    #[must_use]
    pub fn reason(&self) -> Option<&str> {
        match self {
            Self::Success => None,
            Self::Failure { reason } => Some(reason),
        }
    }
}

/// Steps a single creative goes through inside one (account, store) unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CreativeStage {
    Uploading,
    /// Only under the per-creative strategy.
    CreatingAdSet,
    CreatingCreative,
    CreatingAd,
    Done,
}

impl fmt::Display for CreativeStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Uploading => "uploading media",
            Self::CreatingAdSet => "creating ad set",
            Self::CreatingCreative => "creating creative",
            Self::CreatingAd => "creating ad",
            Self::Done => "done",
        };
        f.write_str(label)
    }
}

/// What happened to one creative in one unit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreativeReport {
    /// Position of the creative in the request.
    pub index: usize,
    pub name: String,
    /// Last stage entered; `Done` on success, the failing stage otherwise.
    pub reached: CreativeStage,
    pub ad_id: Option<AdId>,
    pub outcome: RunOutcome,
}

/// Result of one (account, store) unit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnitReport {
    pub account_id: AdAccountId,
    pub store_key: StoreKey,
    pub outcome: RunOutcome,
    pub creatives: Vec<CreativeReport>,
}

impl UnitReport {
    /// Creatives that did not reach `Done`.
    pub fn failed_creatives(&self) -> impl Iterator<Item = &CreativeReport> {
        self.creatives.iter().filter(|c| !c.outcome.is_success())
    }
}

/// Aggregate report for one orchestrator run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunReport {
    pub run_id: Uuid,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub units: Vec<UnitReport>,
}

impl RunReport {
    #[must_use]
    pub fn succeeded(&self) -> usize {
        self.units.iter().filter(|u| u.outcome.is_success()).count()
    }

    #[must_use]
    pub fn failed(&self) -> usize {
        self.units.len() - self.succeeded()
    }

    /// Number of ads created across all units.
    #[must_use]
    pub fn ads_created(&self) -> usize {
        self.units
            .iter()
            .flat_map(|u| &u.creatives)
            .filter(|c| c.ad_id.is_some())
            .count()
    }

    /// Failed units with their reasons.
    pub fn failures(&self) -> impl Iterator<Item = (&UnitReport, &str)> {
        self.units
            .iter()
            .filter_map(|u| u.outcome.reason().map(|reason| (u, reason)))
    }

    #[must_use]
    pub fn is_success(&self) -> bool {
        self.failed() == 0
    }
}
