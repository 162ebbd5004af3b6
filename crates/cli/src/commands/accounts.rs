//! List ad accounts visible to the access token.

use tracing::info;

use campaign_launcher::{GraphClient, LauncherConfig};

/// Print every ad account as `label -> act_id`.
///
/// # Errors
///
/// Returns an error if the access token is missing or the Graph API call fails.
pub async fn list(config: &LauncherConfig) -> Result<(), Box<dyn std::error::Error>> {
    let client = GraphClient::new(&config.graph)?;
    let accounts = client.list_ad_accounts().await?;

    if accounts.is_empty() {
        info!("No ad accounts visible to this token");
        return Ok(());
    }

    for (label, id) in &accounts {
        info!(account = %id, "{label}");
    }
    info!(count = accounts.len(), "Ad accounts listed");
    Ok(())
}
