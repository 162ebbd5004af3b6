//! Per-creative pipeline: upload → (ad set) → creative → ad.
//!
//! Each creative moves through an explicit state machine. A failure stops
//! only this creative; the caller moves on to the next one.

use std::time::Duration;

use tokio_util::sync::CancellationToken;

use super::progress::{EventStatus, Phase, ProgressEvent, ProgressSink, UnitId};
use super::{StepError, guarded, plan};
use crate::graph::{AdSetSpec, CreativeSpec, Targeting};
use crate::platform::AdPlatform;
use campaign_launcher_core::{
    AdAccountId, AdId, AdSetId, CampaignId, CampaignRequest, CreativeAsset, CreativeId,
    CreativeReport, CreativeStage, RunOutcome, StoreProfile, UploadedMedia,
};

/// Everything a creative pipeline needs from its (account, store) unit.
pub(super) struct UnitContext<'a> {
    pub platform: &'a dyn AdPlatform,
    pub sink: &'a dyn ProgressSink,
    pub cancel: &'a CancellationToken,
    pub request: &'a CampaignRequest,
    pub profile: &'a StoreProfile,
    pub account: &'a AdAccountId,
    pub unit: UnitId,
    pub campaign_id: CampaignId,
    pub targeting: Targeting,
    pub start_time: i64,
    pub destination_url: &'a str,
    pub ad_creation_delay: Duration,
}

impl UnitContext<'_> {
    /// Ad set under this unit's campaign; the budget follows the strategy.
    pub fn ad_set_spec(&self, name: String) -> AdSetSpec {
        AdSetSpec {
            name,
            campaign_id: self.campaign_id.clone(),
            targeting: self.targeting.clone(),
            start_time: self.start_time,
            pixel_id: self.profile.pixel_id.clone(),
            daily_budget: self.request.strategy.ad_set_budget(self.request.budget),
        }
    }

    pub fn emit(&self, event: ProgressEvent) {
        self.sink.emit(event);
    }
}

enum PipelineState {
    Uploading,
    CreatingAdSet {
        media: UploadedMedia,
    },
    CreatingCreative {
        media: UploadedMedia,
        ad_set: AdSetId,
    },
    CreatingAd {
        ad_set: AdSetId,
        creative: CreativeId,
    },
    Done {
        ad: AdId,
    },
}

impl PipelineState {
    const fn stage(&self) -> CreativeStage {
        match self {
            Self::Uploading => CreativeStage::Uploading,
            Self::CreatingAdSet { .. } => CreativeStage::CreatingAdSet,
            Self::CreatingCreative { .. } => CreativeStage::CreatingCreative,
            Self::CreatingAd { .. } => CreativeStage::CreatingAd,
            Self::Done { .. } => CreativeStage::Done,
        }
    }
}

/// Drive one creative to `Done` or to the stage where it failed.
///
/// `shared_ad_set` is the unit's single ad set under ABO/CBO; `None` makes
/// the pipeline create a dedicated ad set for this creative.
pub(super) async fn run_creative(
    ctx: &UnitContext<'_>,
    shared_ad_set: Option<&AdSetId>,
    index: usize,
    asset: &CreativeAsset,
) -> CreativeReport {
    let unit = ctx.unit.creative(index);
    let mut state = PipelineState::Uploading;

    let ad = loop {
        state = match state {
            PipelineState::Done { ad } => break ad,
            current => {
                let stage = current.stage();
                ctx.emit(ProgressEvent::new(
                    Some(unit.clone()),
                    Phase::Creative(stage),
                    EventStatus::Started,
                ));
                match advance(ctx, shared_ad_set, index, asset, current).await {
                    Ok(next) => next,
                    Err(e) => {
                        let reason = e.to_string();
                        ctx.emit(ProgressEvent::new(
                            Some(unit),
                            Phase::Creative(stage),
                            EventStatus::Failed(reason.clone()),
                        ));
                        return CreativeReport {
                            index,
                            name: asset.display_name.clone(),
                            reached: stage,
                            ad_id: None,
                            outcome: RunOutcome::Failure { reason },
                        };
                    }
                }
            }
        };
    };

    ctx.emit(
        ProgressEvent::new(
            Some(unit),
            Phase::Creative(CreativeStage::Done),
            EventStatus::Succeeded,
        )
        .with_detail(format!("ad {ad}")),
    );
    CreativeReport {
        index,
        name: asset.display_name.clone(),
        reached: CreativeStage::Done,
        ad_id: Some(ad),
        outcome: RunOutcome::Success,
    }
}

/// Run the remote call for `state` and return the following state.
async fn advance(
    ctx: &UnitContext<'_>,
    shared_ad_set: Option<&AdSetId>,
    index: usize,
    asset: &CreativeAsset,
    state: PipelineState,
) -> Result<PipelineState, StepError> {
    match state {
        PipelineState::Uploading => {
            let media = guarded(ctx.cancel, ctx.platform.upload_media(ctx.account, asset)).await?;
            Ok(match shared_ad_set {
                Some(ad_set) => PipelineState::CreatingCreative {
                    media,
                    ad_set: ad_set.clone(),
                },
                None => PipelineState::CreatingAdSet { media },
            })
        }
        PipelineState::CreatingAdSet { media } => {
            let spec =
                ctx.ad_set_spec(plan::test_ad_set_name(ctx.profile, index, &asset.display_name));
            let ad_set = guarded(ctx.cancel, ctx.platform.create_ad_set(ctx.account, &spec)).await?;
            Ok(PipelineState::CreatingCreative { media, ad_set })
        }
        PipelineState::CreatingCreative { media, ad_set } => {
            let spec = CreativeSpec {
                name: plan::creative_name(&asset.display_name),
                page_id: ctx.profile.page_id.clone(),
                media,
                link: ctx.destination_url.to_string(),
                headline: ctx.request.headline.clone(),
                body: ctx.request.body.clone(),
                call_to_action: ctx.request.call_to_action,
            };
            let creative =
                guarded(ctx.cancel, ctx.platform.create_ad_creative(ctx.account, &spec)).await?;
            Ok(PipelineState::CreatingAd { ad_set, creative })
        }
        PipelineState::CreatingAd { ad_set, creative } => {
            let ad = guarded(
                ctx.cancel,
                ctx.platform
                    .create_ad(ctx.account, &ad_set, &creative, &asset.display_name),
            )
            .await?;
            pause_after_ad(ctx.cancel, ctx.ad_creation_delay).await;
            Ok(PipelineState::Done { ad })
        }
        PipelineState::Done { ad } => Ok(PipelineState::Done { ad }),
    }
}

/// Fixed inter-request delay after each ad; cut short by cancellation.
async fn pause_after_ad(cancel: &CancellationToken, delay: Duration) {
    if delay.is_zero() {
        return;
    }
    tokio::select! {
        () = cancel.cancelled() => {}
        () = tokio::time::sleep(delay) => {}
    }
}
