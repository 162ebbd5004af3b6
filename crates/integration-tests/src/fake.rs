//! In-memory ad platform that records every call.

use std::collections::BTreeMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use campaign_launcher::AdPlatform;
use campaign_launcher::GraphError;
use campaign_launcher::graph::{AdSetSpec, CampaignSpec, CreativeSpec};
use campaign_launcher_core::{
    AdAccountId, AdId, AdSetId, AssetSource, CampaignId, CreativeAsset, CreativeId, ImageHash,
    MediaKind, UploadedMedia, VideoId,
};

/// Thumbnail returned for every processed video.
pub const THUMBNAIL_URL: &str = "https://cdn.example.com/thumb.jpg";

/// One recorded platform call.
#[derive(Debug, Clone)]
pub enum Call {
    ListAccounts,
    Upload {
        account: AdAccountId,
        kind: MediaKind,
        name: String,
        /// Bytes seen for a local file; `None` for remote URLs.
        bytes: Option<usize>,
    },
    Campaign {
        account: AdAccountId,
        spec: CampaignSpec,
    },
    AdSet {
        account: AdAccountId,
        spec: AdSetSpec,
    },
    Creative {
        account: AdAccountId,
        spec: CreativeSpec,
    },
    Ad {
        account: AdAccountId,
        ad_set: AdSetId,
        creative: CreativeId,
        name: String,
    },
}

/// Fake [`AdPlatform`] with scripted failures.
///
/// IDs are unique per call and embed the account, so media uploaded to two
/// accounts never share an identifier.
#[derive(Debug, Default)]
pub struct FakePlatform {
    calls: Mutex<Vec<Call>>,
    next_id: AtomicUsize,
    ads_created: AtomicUsize,
    failing_campaigns: Vec<String>,
    failing_creatives: Vec<String>,
    reject_videos: bool,
    cancel_after: Option<(usize, CancellationToken)>,
}

impl FakePlatform {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Reject campaigns whose name contains `fragment`.
    #[must_use]
    pub fn fail_campaigns_containing(mut self, fragment: &str) -> Self {
        self.failing_campaigns.push(fragment.to_string());
        self
    }

    /// Reject creatives whose name contains `fragment`.
    #[must_use]
    pub fn fail_creatives_containing(mut self, fragment: &str) -> Self {
        self.failing_creatives.push(fragment.to_string());
        self
    }

    /// Every video ends transcoding in the error state.
    #[must_use]
    pub const fn reject_videos(mut self) -> Self {
        self.reject_videos = true;
        self
    }

    /// Cancel `token` once `ads` ads have been created.
    #[must_use]
    pub fn cancel_after_ads(mut self, ads: usize, token: CancellationToken) -> Self {
        self.cancel_after = Some((ads, token));
        self
    }

    #[must_use]
    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().expect("calls lock").clone()
    }

    #[must_use]
    pub fn campaigns(&self) -> Vec<(AdAccountId, CampaignSpec)> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                Call::Campaign { account, spec } => Some((account, spec)),
                _ => None,
            })
            .collect()
    }

    #[must_use]
    pub fn ad_sets(&self) -> Vec<(AdAccountId, AdSetSpec)> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                Call::AdSet { account, spec } => Some((account, spec)),
                _ => None,
            })
            .collect()
    }

    #[must_use]
    pub fn creatives(&self) -> Vec<(AdAccountId, CreativeSpec)> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                Call::Creative { account, spec } => Some((account, spec)),
                _ => None,
            })
            .collect()
    }

    #[must_use]
    pub fn ads(&self) -> Vec<Call> {
        self.calls()
            .into_iter()
            .filter(|call| matches!(call, Call::Ad { .. }))
            .collect()
    }

    #[must_use]
    pub fn uploads(&self) -> Vec<Call> {
        self.calls()
            .into_iter()
            .filter(|call| matches!(call, Call::Upload { .. }))
            .collect()
    }

    fn record(&self, call: Call) {
        self.calls.lock().expect("calls lock").push(call);
    }

    fn id(&self, prefix: &str, account: &AdAccountId) -> String {
        let n = self.next_id.fetch_add(1, Ordering::SeqCst) + 1;
        format!("{prefix}-{}-{n}", account.numeric())
    }

    fn rejected(message: &str) -> GraphError {
        GraphError::Api {
            code: 100,
            message: message.to_string(),
        }
    }
}

#[async_trait]
impl AdPlatform for FakePlatform {
    async fn list_ad_accounts(&self) -> Result<BTreeMap<String, AdAccountId>, GraphError> {
        self.record(Call::ListAccounts);
        Ok(BTreeMap::from([
            ("Main (COP)".to_string(), crate::account(1)),
            ("Backup (USD)".to_string(), crate::account(2)),
        ]))
    }

    async fn upload_media(
        &self,
        account: &AdAccountId,
        asset: &CreativeAsset,
    ) -> Result<UploadedMedia, GraphError> {
        let bytes = match &asset.source {
            AssetSource::LocalFile { bytes, .. } => Some(bytes.len()),
            AssetSource::RemoteUrl(_) => None,
        };
        self.record(Call::Upload {
            account: account.clone(),
            kind: asset.kind,
            name: asset.display_name.clone(),
            bytes,
        });
        if bytes == Some(0) {
            return Err(Self::rejected("empty file"));
        }

        match asset.kind {
            MediaKind::Image => Ok(UploadedMedia::image(
                account.clone(),
                ImageHash::new(self.id("hash", account)),
            )),
            MediaKind::Video => {
                let video_id = self.id("video", account);
                if self.reject_videos {
                    return Err(GraphError::MediaProcessing { video_id });
                }
                Ok(UploadedMedia::video(
                    account.clone(),
                    VideoId::new(video_id),
                    THUMBNAIL_URL.to_string(),
                ))
            }
        }
    }

    async fn create_campaign(
        &self,
        account: &AdAccountId,
        spec: &CampaignSpec,
    ) -> Result<CampaignId, GraphError> {
        self.record(Call::Campaign {
            account: account.clone(),
            spec: spec.clone(),
        });
        if self.failing_campaigns.iter().any(|f| spec.name.contains(f)) {
            return Err(Self::rejected("campaign rejected"));
        }
        Ok(CampaignId::new(self.id("campaign", account)))
    }

    async fn create_ad_set(
        &self,
        account: &AdAccountId,
        spec: &AdSetSpec,
    ) -> Result<AdSetId, GraphError> {
        self.record(Call::AdSet {
            account: account.clone(),
            spec: spec.clone(),
        });
        Ok(AdSetId::new(self.id("adset", account)))
    }

    async fn create_ad_creative(
        &self,
        account: &AdAccountId,
        spec: &CreativeSpec,
    ) -> Result<CreativeId, GraphError> {
        self.record(Call::Creative {
            account: account.clone(),
            spec: spec.clone(),
        });
        if !spec.media.belongs_to(account) {
            return Err(GraphError::MediaScopeMismatch {
                uploaded_to: spec.media.account_id.clone(),
                account: account.clone(),
            });
        }
        if self.failing_creatives.iter().any(|f| spec.name.contains(f)) {
            return Err(Self::rejected("creative rejected"));
        }
        Ok(CreativeId::new(self.id("creative", account)))
    }

    async fn create_ad(
        &self,
        account: &AdAccountId,
        ad_set: &AdSetId,
        creative: &CreativeId,
        name: &str,
    ) -> Result<AdId, GraphError> {
        self.record(Call::Ad {
            account: account.clone(),
            ad_set: ad_set.clone(),
            creative: creative.clone(),
            name: name.to_string(),
        });
        let created = self.ads_created.fetch_add(1, Ordering::SeqCst) + 1;
        if let Some((limit, token)) = &self.cancel_after
            && created >= *limit
        {
            token.cancel();
        }
        Ok(AdId::new(self.id("ad", account)))
    }
}
