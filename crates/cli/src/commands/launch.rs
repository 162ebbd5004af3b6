//! Plan and launch commands driven by a YAML request file.

use std::path::Path;

use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use campaign_launcher::orchestrator::TracingSink;
use campaign_launcher::request_file::{self, LoadedRequest};
use campaign_launcher::{
    CopyWriter, GraphClient, LaunchPlan, LauncherConfig, Orchestrator, OrchestratorSettings,
};
use campaign_launcher_core::RunReport;

/// Validate a request file and log the objects it would create.
///
/// # Errors
///
/// Returns an error if the file cannot be loaded or fails validation.
pub async fn plan(config: &LauncherConfig, path: &Path) -> Result<(), Box<dyn std::error::Error>> {
    let registry = config.store_registry()?;
    let LoadedRequest { request, .. } = request_file::load(path).await?;
    request.validate(&registry)?;

    let plan = LaunchPlan::for_request(&request);
    info!(
        product = %request.product_name,
        strategy = %request.strategy,
        budget = %request.budget,
        start_date = %request.start_date,
        "Request is valid"
    );
    info!("{}", serde_json::to_string_pretty(&plan)?);
    Ok(())
}

/// Run a launch. Ctrl+C cancels outstanding work; created objects stay paused.
///
/// # Errors
///
/// Returns an error if the request cannot be loaded or validated, the Graph
/// client cannot be built, or any unit failed.
pub async fn launch(
    config: &LauncherConfig,
    path: &Path,
    generate_copy: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let registry = config.store_registry()?;
    let LoadedRequest {
        mut request,
        context,
    } = request_file::load(path).await?;

    if generate_copy {
        let writer = CopyWriter::new(config.openai());
        let copy = writer.generate(&request.product_name, &context).await;
        if copy.is_fallback() {
            warn!("Using default copy");
        }
        request.apply_copy(&copy);
    }

    let client = GraphClient::new(&config.graph)?;
    let cancel = CancellationToken::new();
    spawn_interrupt_handler(cancel.clone());

    let sink = TracingSink;
    let orchestrator = Orchestrator::new(&client, &registry, &sink)
        .with_settings(OrchestratorSettings::from_config(config))
        .with_cancellation(cancel);

    let report = orchestrator.run(&request).await?;
    log_report(&report);

    if report.is_success() {
        Ok(())
    } else {
        Err(format!("{} of {} units failed", report.failed(), report.units.len()).into())
    }
}

fn spawn_interrupt_handler(cancel: CancellationToken) {
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Interrupt received, cancelling launch");
            cancel.cancel();
        }
    });
}

fn log_report(report: &RunReport) {
    for unit in &report.units {
        match unit.outcome.reason() {
            None => info!(
                account = %unit.account_id,
                store = %unit.store_key,
                ads = unit.creatives.iter().filter(|c| c.ad_id.is_some()).count(),
                "Unit succeeded"
            ),
            Some(reason) => warn!(
                account = %unit.account_id,
                store = %unit.store_key,
                "Unit failed: {reason}"
            ),
        }
    }
    info!(
        run_id = %report.run_id,
        succeeded = report.succeeded(),
        failed = report.failed(),
        ads = report.ads_created(),
        "Launch finished"
    );
}
