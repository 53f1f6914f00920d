mod amazon;
mod catalog;
mod classifier;
mod http;
mod llm;
mod metrics;
mod models;
mod pacing;
mod payload;
mod pipeline;
mod settings;
mod source;
#[cfg(test)]
mod test_support;

use amazon::SpApiClient;
use eyre::{WrapErr, bail};
use llm::{GeminiClient, LlmConfig};
use models::RunSummary;
use pipeline::{Pipeline, PipelineConfig, PipelineError, PipelineErrorKind};
use std::sync::Arc;
use tracing::{error, info};
use tracing_subscriber::{EnvFilter, fmt};

#[tokio::main]
async fn main() {
    if let Err(err) = run().await {
        error!(target = "listing.pipeline", "run aborted: {err:#}");
        std::process::exit(exit_code(&err));
    }
}

async fn run() -> eyre::Result<()> {
    dotenvy::dotenv().ok();
    init_tracing();

    let config = PipelineConfig::from_env();
    if let Err(err) = config.validate() {
        error!(
            target = "listing.pipeline",
            stage = err.stage(),
            detail = err.detail(),
            "invalid configuration"
        );
        return Err(err.into());
    }

    let llm = GeminiClient::new(LlmConfig::from_env()).wrap_err("text service unavailable")?;
    let sp_api = Arc::new(SpApiClient::from_env().wrap_err("marketplace client unavailable")?);

    let rows = source::load_rows(&config.source)
        .await
        .wrap_err("reading inventory")?;
    info!(
        target = "listing.pipeline",
        rows = rows.len(),
        dry_run = config.dry_run,
        "starting run"
    );

    let mut pipeline = Pipeline::new(config, Arc::new(llm), sp_api.clone(), sp_api);
    let report = pipeline.run(&rows).await?;

    println!("{}", report.summary);
    if let RunSummary::SubmissionFailed { error, .. } = &report.summary {
        bail!("feed submission failed: {error}");
    }
    Ok(())
}

/// 2 for bad input or configuration, 1 for everything else.
fn exit_code(err: &eyre::Report) -> i32 {
    match err.downcast_ref::<PipelineError>().map(PipelineError::kind) {
        Some(PipelineErrorKind::InvalidInput) => 2,
        _ => 1,
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = fmt().with_env_filter(filter).try_init();
}
