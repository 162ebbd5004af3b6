//! Campaign orchestrator.
//!
//! Fans a [`CampaignRequest`] out over accounts × stores × creatives and
//! drives an [`AdPlatform`] through the creation sequence:
//!
//! ```text
//! account ─┬─ store ── campaign ─┬─ (ABO/CBO) shared ad set ─┬─ creative pipeline
//!          │                     │                           └─ creative pipeline
//!          │                     └─ (TEST) creative pipeline with its own ad set
//!          └─ store ── ...
//! ```
//!
//! Every (account, store) unit is isolated: whatever goes wrong inside it is
//! recorded in the [`RunReport`] and the run moves on.

pub mod plan;
pub mod progress;

mod pipeline;

pub use plan::LaunchPlan;
pub use progress::{
    ChannelSink, EventStatus, NullSink, Phase, ProgressEvent, ProgressSink, TracingSink, UnitId,
};

use std::fmt::Display;
use std::future::Future;
use std::time::Duration;

use chrono::{FixedOffset, Local, NaiveDate, Utc};
use futures::stream::{self, StreamExt};
use thiserror::Error;
use tokio_util::sync::CancellationToken;
use tracing::{info, instrument};
use uuid::Uuid;

use crate::config::LauncherConfig;
use crate::error::LaunchError;
use crate::graph::{CampaignSpec, GraphError, Targeting};
use crate::platform::AdPlatform;
use campaign_launcher_core::{
    AdAccountId, CampaignRequest, CreativeAsset, CreativeReport, CreativeStage, RunOutcome,
    RunReport, StoreKey, StoreRegistry, StoreRegistryError, UnitReport, ValidationError,
};
use pipeline::UnitContext;

const CANCELLED: &str = "run cancelled";

/// Timezone the 05:00 launch time is interpreted in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LaunchTimezone {
    /// The machine's local timezone.
    #[default]
    Local,
    Fixed(FixedOffset),
}

impl LaunchTimezone {
    /// Unix timestamp of the request's launch time.
    ///
    /// # Errors
    ///
    /// Returns `ValidationError::InvalidLaunchTime` if 05:00 does not exist
    /// on that date.
    pub fn launch_timestamp(self, request: &CampaignRequest) -> Result<i64, ValidationError> {
        match self {
            Self::Local => request.launch_time(&Local).map(|t| t.timestamp()),
            Self::Fixed(offset) => request.launch_time(&offset).map(|t| t.timestamp()),
        }
    }

    /// Current calendar date in this timezone.
    #[must_use]
    pub fn today(self) -> NaiveDate {
        match self {
            Self::Local => Local::now().date_naive(),
            Self::Fixed(offset) => Utc::now().with_timezone(&offset).date_naive(),
        }
    }
}

/// Tunables for one orchestrator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrchestratorSettings {
    /// Pause after every ad creation.
    pub ad_creation_delay: Duration,
    /// Accounts processed concurrently; 1 runs them in order.
    pub max_parallel_accounts: usize,
    /// Date stamped into campaign names; today when `None`.
    pub run_date: Option<NaiveDate>,
    pub timezone: LaunchTimezone,
}

impl Default for OrchestratorSettings {
    fn default() -> Self {
        Self {
            ad_creation_delay: Duration::from_secs(1),
            max_parallel_accounts: 1,
            run_date: None,
            timezone: LaunchTimezone::Local,
        }
    }
}

impl OrchestratorSettings {
    #[must_use]
    pub fn from_config(config: &LauncherConfig) -> Self {
        Self {
            ad_creation_delay: config.ad_creation_delay,
            max_parallel_accounts: config.max_parallel_accounts,
            ..Self::default()
        }
    }
}

/// Why a unit step failed.
#[derive(Debug, Error)]
pub(crate) enum StepError {
    #[error(transparent)]
    Platform(#[from] GraphError),
    #[error(transparent)]
    Store(#[from] StoreRegistryError),
    #[error("run cancelled")]
    Cancelled,
}

/// Await a platform call unless the run is cancelled first.
pub(crate) async fn guarded<T>(
    cancel: &CancellationToken,
    call: impl Future<Output = Result<T, GraphError>>,
) -> Result<T, StepError> {
    if cancel.is_cancelled() {
        return Err(StepError::Cancelled);
    }
    tokio::select! {
        biased;
        () = cancel.cancelled() => Err(StepError::Cancelled),
        result = call => Ok(result?),
    }
}

/// Per-run values shared by every unit.
struct RunContext<'r> {
    request: &'r CampaignRequest,
    start_time: i64,
    run_date: NaiveDate,
    destination_url: String,
}

/// Drives campaign creation for one request at a time.
pub struct Orchestrator<'a> {
    platform: &'a dyn AdPlatform,
    registry: &'a StoreRegistry,
    sink: &'a dyn ProgressSink,
    settings: OrchestratorSettings,
    cancel: CancellationToken,
}

impl<'a> Orchestrator<'a> {
    #[must_use]
    pub fn new(
        platform: &'a dyn AdPlatform,
        registry: &'a StoreRegistry,
        sink: &'a dyn ProgressSink,
    ) -> Self {
        Self {
            platform,
            registry,
            sink,
            settings: OrchestratorSettings::default(),
            cancel: CancellationToken::new(),
        }
    }

    #[must_use]
    pub fn with_settings(mut self, settings: OrchestratorSettings) -> Self {
        self.settings = settings;
        self
    }

    /// Use an externally owned token; cancelling it stops the run.
    #[must_use]
    pub fn with_cancellation(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    /// Token that cancels this orchestrator's runs.
    #[must_use]
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Launch a request across every selected account and store.
    ///
    /// Per-unit failures never surface here; they are recorded in the
    /// returned report.
    ///
    /// # Errors
    ///
    /// Returns `LaunchError::Validation` or `LaunchError::Schedule` before any
    /// remote call if the request is unusable, and `LaunchError::Cancelled`
    /// if cancellation happened before the run started.
    #[instrument(skip_all, fields(product = %request.product_name, strategy = %request.strategy))]
    pub async fn run(&self, request: &CampaignRequest) -> Result<RunReport, LaunchError> {
        request.validate(self.registry)?;
        let start_time = self
            .settings
            .timezone
            .launch_timestamp(request)
            .map_err(|e| LaunchError::Schedule(e.to_string()))?;
        if self.cancel.is_cancelled() {
            return Err(LaunchError::Cancelled);
        }

        let run_id = Uuid::new_v4();
        let started_at = Utc::now();
        let plan = LaunchPlan::for_request(request);
        info!(%run_id, units = plan.units, ads = plan.ads, start_time, "Starting launch");
        self.sink.emit(
            ProgressEvent::new(None, Phase::Run, EventStatus::Started).with_detail(format!(
                "{} units, {} ads planned",
                plan.units, plan.ads
            )),
        );

        let ctx = RunContext {
            request,
            start_time,
            run_date: self
                .settings
                .run_date
                .unwrap_or_else(|| self.settings.timezone.today()),
            destination_url: request.normalized_destination_url(),
        };
        let ctx = &ctx;

        let mut per_account: Vec<(usize, Vec<UnitReport>)> =
            stream::iter(request.account_ids.iter().enumerate())
                .map(|(position, account)| async move {
                    (position, self.run_account(ctx, account).await)
                })
                .buffer_unordered(self.settings.max_parallel_accounts.max(1))
                .collect()
                .await;
        per_account.sort_by_key(|(position, _)| *position);

        let report = RunReport {
            run_id,
            started_at,
            finished_at: Utc::now(),
            units: per_account
                .into_iter()
                .flat_map(|(_, units)| units)
                .collect(),
        };

        let mut summary = format!(
            "{} succeeded, {} failed, {} ads created",
            report.succeeded(),
            report.failed(),
            report.ads_created()
        );
        let reasons: Vec<String> = report
            .failures()
            .map(|(unit, reason)| format!("{} / {}: {reason}", unit.account_id, unit.store_key))
            .collect();
        if !reasons.is_empty() {
            summary.push_str("; failures: ");
            summary.push_str(&reasons.join("; "));
        }
        let status = if report.is_success() {
            EventStatus::Succeeded
        } else {
            EventStatus::Failed(format!("{} of {} units failed", report.failed(), report.units.len()))
        };
        self.sink
            .emit(ProgressEvent::new(None, Phase::Run, status).with_detail(summary));

        Ok(report)
    }

    /// Every store of one account, in request order.
    async fn run_account(&self, ctx: &RunContext<'_>, account: &AdAccountId) -> Vec<UnitReport> {
        let mut units = Vec::with_capacity(ctx.request.store_keys.len());
        for store in &ctx.request.store_keys {
            units.push(self.run_unit(ctx, account, store).await);
        }
        units
    }

    /// One (account, store) unit. Never fails; errors become the outcome.
    #[instrument(skip_all, fields(account = %account, store = %store))]
    async fn run_unit(
        &self,
        ctx: &RunContext<'_>,
        account: &AdAccountId,
        store: &StoreKey,
    ) -> UnitReport {
        let unit = UnitId::unit(account.clone(), store.clone());

        let (outcome, creatives) = if self.cancel.is_cancelled() {
            (RunOutcome::failure(CANCELLED), Vec::new())
        } else {
            self.sink.emit(ProgressEvent::new(
                Some(unit.clone()),
                Phase::Unit,
                EventStatus::Started,
            ));
            match self.launch_unit(ctx, account, store, &unit).await {
                Ok(creatives) => (Self::unit_outcome(&creatives), creatives),
                Err(e) => (RunOutcome::failure(e.to_string()), Vec::new()),
            }
        };

        let status = match &outcome {
            RunOutcome::Success => EventStatus::Succeeded,
            RunOutcome::Failure { reason } => EventStatus::Failed(reason.clone()),
        };
        self.sink
            .emit(ProgressEvent::new(Some(unit), Phase::Unit, status));

        UnitReport {
            account_id: account.clone(),
            store_key: store.clone(),
            outcome,
            creatives,
        }
    }

    /// Campaign, optional shared ad set, then every creative pipeline.
    ///
    /// Errors returned here fail the whole unit; creative failures are
    /// recorded in the returned reports.
    async fn launch_unit(
        &self,
        ctx: &RunContext<'_>,
        account: &AdAccountId,
        store: &StoreKey,
        unit: &UnitId,
    ) -> Result<Vec<CreativeReport>, StepError> {
        let request = ctx.request;
        let profile = self.registry.get(store)?;

        let campaign = CampaignSpec {
            name: plan::campaign_name(
                profile,
                &request.product_name,
                request.strategy,
                ctx.run_date,
            ),
            daily_budget: request.strategy.campaign_budget(request.budget),
        };
        let campaign_id = self
            .step(
                unit,
                Phase::Campaign,
                self.platform.create_campaign(account, &campaign),
            )
            .await?;

        let unit_ctx = UnitContext {
            platform: self.platform,
            sink: self.sink,
            cancel: &self.cancel,
            request,
            profile,
            account,
            unit: unit.clone(),
            campaign_id,
            targeting: Targeting::new(profile.country_code.clone(), request.gender),
            start_time: ctx.start_time,
            destination_url: &ctx.destination_url,
            ad_creation_delay: self.settings.ad_creation_delay,
        };

        let shared_ad_set = if request.strategy.ad_set_per_creative() {
            None
        } else {
            let spec = unit_ctx.ad_set_spec(plan::open_ad_set_name(profile));
            Some(
                self.step(
                    unit,
                    Phase::SharedAdSet,
                    self.platform.create_ad_set(account, &spec),
                )
                .await?,
            )
        };

        let mut reports = Vec::with_capacity(request.creatives.len());
        for (index, asset) in request.creatives.iter().enumerate() {
            let report = if self.cancel.is_cancelled() {
                cancelled_creative(index, asset)
            } else {
                pipeline::run_creative(&unit_ctx, shared_ad_set.as_ref(), index, asset).await
            };
            reports.push(report);
        }
        Ok(reports)
    }

    /// Run one unit-level platform call with progress events around it.
    async fn step<T: Display>(
        &self,
        unit: &UnitId,
        phase: Phase,
        call: impl Future<Output = Result<T, GraphError>>,
    ) -> Result<T, StepError> {
        self.sink
            .emit(ProgressEvent::new(Some(unit.clone()), phase, EventStatus::Started));
        match guarded(&self.cancel, call).await {
            Ok(id) => {
                self.sink.emit(
                    ProgressEvent::new(Some(unit.clone()), phase, EventStatus::Succeeded)
                        .with_detail(format!("id {id}")),
                );
                Ok(id)
            }
            Err(e) => {
                self.sink.emit(ProgressEvent::new(
                    Some(unit.clone()),
                    phase,
                    EventStatus::Failed(e.to_string()),
                ));
                Err(e)
            }
        }
    }

    /// Unit outcome from its creative reports.
    fn unit_outcome(creatives: &[CreativeReport]) -> RunOutcome {
        let failed: Vec<&CreativeReport> = creatives
            .iter()
            .filter(|c| !c.outcome.is_success())
            .collect();
        if failed.is_empty() {
            return RunOutcome::Success;
        }
        if failed.iter().all(|c| c.outcome.reason() == Some(CANCELLED)) {
            return RunOutcome::failure(CANCELLED);
        }

        let details: Vec<String> = failed
            .iter()
            .map(|c| {
                format!(
                    "#{} {} ({}): {}",
                    c.index + 1,
                    c.name,
                    c.reached,
                    c.outcome.reason().unwrap_or_default()
                )
            })
            .collect();
        RunOutcome::failure(format!(
            "{} of {} creatives failed: {}",
            failed.len(),
            creatives.len(),
            details.join("; ")
        ))
    }
}

fn cancelled_creative(index: usize, asset: &CreativeAsset) -> CreativeReport {
    CreativeReport {
        index,
        name: asset.display_name.clone(),
        reached: CreativeStage::Uploading,
        ad_id: None,
        outcome: RunOutcome::failure(CANCELLED),
    }
}
