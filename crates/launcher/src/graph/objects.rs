//! Account listing and ad object creation.

use std::collections::BTreeMap;

use tracing::{info, instrument, warn};

use super::{AdAccountsResponse, AdSetSpec, CampaignSpec, CreatedObject, CreativeSpec};
use super::{GraphClient, GraphError, STATUS_PAUSED};
use campaign_launcher_core::{AdAccountId, AdId, AdSetId, CampaignId, CreativeId};

impl GraphClient {
    /// List ad accounts visible to the token, keyed by display label.
    ///
    /// Entries with malformed account IDs are skipped.
    ///
    /// # Errors
    ///
    /// Returns `GraphError::InvalidToken` if the token is rejected, or any
    /// other API error.
    #[instrument(skip(self))]
    pub async fn list_ad_accounts(&self) -> Result<BTreeMap<String, AdAccountId>, GraphError> {
        let response: AdAccountsResponse = self
            .get(
                "me/adaccounts",
                &[("fields", "name,account_id,currency"), ("limit", "100")],
            )
            .await?;

        let mut accounts = BTreeMap::new();
        for entry in response.data.unwrap_or_default() {
            match AdAccountId::parse(&entry.account_id) {
                Ok(id) => {
                    accounts.insert(entry.label(), id);
                }
                Err(e) => warn!(account_id = %entry.account_id, "Skipping ad account: {e}"),
            }
        }
        Ok(accounts)
    }

    /// Create a paused campaign.
    ///
    /// # Errors
    ///
    /// Returns error if the platform rejects the campaign.
    #[instrument(skip(self, spec), fields(account = %account, name = %spec.name))]
    pub async fn create_campaign(
        &self,
        account: &AdAccountId,
        spec: &CampaignSpec,
    ) -> Result<CampaignId, GraphError> {
        let id = self
            .create(&format!("{account}/campaigns"), &spec.to_form(), "campaign")
            .await?;
        info!(campaign_id = %id, "Campaign created");
        Ok(CampaignId::new(id))
    }

    /// Create a paused ad set under a campaign.
    ///
    /// # Errors
    ///
    /// Returns error if the platform rejects the ad set.
    #[instrument(skip(self, spec), fields(account = %account, name = %spec.name))]
    pub async fn create_ad_set(
        &self,
        account: &AdAccountId,
        spec: &AdSetSpec,
    ) -> Result<AdSetId, GraphError> {
        let id = self
            .create(&format!("{account}/adsets"), &spec.to_form(), "ad set")
            .await?;
        info!(ad_set_id = %id, "Ad set created");
        Ok(AdSetId::new(id))
    }

    /// Create an ad creative from media uploaded to the same account.
    ///
    /// # Errors
    ///
    /// Returns `GraphError::MediaScopeMismatch` if the media belongs to a
    /// different account, or error if the platform rejects the creative.
    #[instrument(skip(self, spec), fields(account = %account, name = %spec.name))]
    pub async fn create_ad_creative(
        &self,
        account: &AdAccountId,
        spec: &CreativeSpec,
    ) -> Result<CreativeId, GraphError> {
        if !spec.media.belongs_to(account) {
            return Err(GraphError::MediaScopeMismatch {
                uploaded_to: spec.media.account_id.clone(),
                account: account.clone(),
            });
        }
        let id = self
            .create(&format!("{account}/adcreatives"), &spec.to_form(), "creative")
            .await?;
        info!(creative_id = %id, "Creative created");
        Ok(CreativeId::new(id))
    }

    /// Create a paused ad binding a creative to an ad set.
    ///
    /// # Errors
    ///
    /// Returns error if the platform rejects the ad.
    #[instrument(skip(self), fields(account = %account))]
    pub async fn create_ad(
        &self,
        account: &AdAccountId,
        ad_set: &AdSetId,
        creative: &CreativeId,
        name: &str,
    ) -> Result<AdId, GraphError> {
        let form = vec![
            ("name", name.to_string()),
            ("adset_id", ad_set.to_string()),
            (
                "creative",
                serde_json::json!({ "creative_id": creative }).to_string(),
            ),
            ("status", STATUS_PAUSED.to_string()),
        ];
        let id = self.create(&format!("{account}/ads"), &form, "ad").await?;
        info!(ad_id = %id, "Ad created");
        Ok(AdId::new(id))
    }

    /// POST a creation form and extract the new object's ID.
    async fn create(
        &self,
        path: &str,
        form: &[(&str, String)],
        object: &'static str,
    ) -> Result<String, GraphError> {
        let response: CreatedObject = self.post_form(path, form).await?;
        response
            .id
            .filter(|id| !id.is_empty())
            .ok_or(GraphError::MissingId { object })
    }
}
