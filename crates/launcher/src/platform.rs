//! The ad platform operations the orchestrator drives.

use std::collections::BTreeMap;

use async_trait::async_trait;

use crate::graph::{AdSetSpec, CampaignSpec, CreativeSpec, GraphClient, GraphError};
use campaign_launcher_core::{
    AdAccountId, AdId, AdSetId, CampaignId, CreativeAsset, CreativeId, UploadedMedia,
};

/// Remote ad platform: account listing, media upload and object creation.
///
/// Implemented by [`GraphClient`] for the real API and by in-memory fakes in
/// tests.
#[async_trait]
pub trait AdPlatform: Send + Sync {
    /// Ad accounts visible to the credential, keyed by display label.
    async fn list_ad_accounts(&self) -> Result<BTreeMap<String, AdAccountId>, GraphError>;

    /// Upload one asset to one account; videos resolve once processed.
    async fn upload_media(
        &self,
        account: &AdAccountId,
        asset: &CreativeAsset,
    ) -> Result<UploadedMedia, GraphError>;

    async fn create_campaign(
        &self,
        account: &AdAccountId,
        spec: &CampaignSpec,
    ) -> Result<CampaignId, GraphError>;

    async fn create_ad_set(
        &self,
        account: &AdAccountId,
        spec: &AdSetSpec,
    ) -> Result<AdSetId, GraphError>;

    async fn create_ad_creative(
        &self,
        account: &AdAccountId,
        spec: &CreativeSpec,
    ) -> Result<CreativeId, GraphError>;

    async fn create_ad(
        &self,
        account: &AdAccountId,
        ad_set: &AdSetId,
        creative: &CreativeId,
        name: &str,
    ) -> Result<AdId, GraphError>;
}

#[async_trait]
impl AdPlatform for GraphClient {
    async fn list_ad_accounts(&self) -> Result<BTreeMap<String, AdAccountId>, GraphError> {
        Self::list_ad_accounts(self).await
    }

    async fn upload_media(
        &self,
        account: &AdAccountId,
        asset: &CreativeAsset,
    ) -> Result<UploadedMedia, GraphError> {
        Self::upload_media(self, account, asset).await
    }

    async fn create_campaign(
        &self,
        account: &AdAccountId,
        spec: &CampaignSpec,
    ) -> Result<CampaignId, GraphError> {
        Self::create_campaign(self, account, spec).await
    }

    async fn create_ad_set(
        &self,
        account: &AdAccountId,
        spec: &AdSetSpec,
    ) -> Result<AdSetId, GraphError> {
        Self::create_ad_set(self, account, spec).await
    }

    async fn create_ad_creative(
        &self,
        account: &AdAccountId,
        spec: &CreativeSpec,
    ) -> Result<CreativeId, GraphError> {
        Self::create_ad_creative(self, account, spec).await
    }

    async fn create_ad(
        &self,
        account: &AdAccountId,
        ad_set: &AdSetId,
        creative: &CreativeId,
        name: &str,
    ) -> Result<AdId, GraphError> {
        Self::create_ad(self, account, ad_set, creative, name).await
    }
}
