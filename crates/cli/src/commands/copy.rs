//! Generate ad copy without launching anything.

use tracing::{info, warn};

use campaign_launcher::{CopyWriter, LauncherConfig};

/// Generate and print a headline and body. Falls back to the default copy.
pub async fn generate(config: &LauncherConfig, product: &str, context: &str) {
    let writer = CopyWriter::new(config.openai());
    if !writer.is_enabled() {
        warn!("OPENAI_API_KEY not set, showing default copy");
    }

    let copy = writer.generate(product, context).await;
    info!(fallback = copy.is_fallback(), "Headline: {}", copy.headline);
    info!("Body: {}", copy.body);
}
