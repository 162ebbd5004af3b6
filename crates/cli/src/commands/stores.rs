//! Show the store registry in use.

use tracing::info;

use campaign_launcher::LauncherConfig;

/// Print every configured store profile.
///
/// # Errors
///
/// Returns an error if `STORE_REGISTRY_PATH` points at an unreadable file.
pub fn list(config: &LauncherConfig) -> Result<(), Box<dyn std::error::Error>> {
    let registry = config.store_registry()?;
    let source = config
        .store_registry_path
        .as_ref()
        .map_or_else(|| "built-in".to_owned(), |p| p.display().to_string());

    for store in registry.iter() {
        info!(
            pixel = %store.pixel_id,
            page = %store.page_id,
            currency = store.currency.as_str(),
            country = store.country_code.as_str(),
            "{} ({})",
            store.key,
            store.country_name,
        );
    }
    info!(count = registry.len(), source = %source, "Stores listed");
    Ok(())
}
