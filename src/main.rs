//! Legacy Converter - Main Entry Point
//!
//! Configuration comes from the environment (and an optional `.env` file).

use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use legacy_converter::types::LogFormat;
use legacy_converter::{ConversionPipeline, ConverterConfig, HttpConverter};

fn init_tracing(format: LogFormat) {
    let filter = tracing_subscriber::EnvFilter::new(
        std::env::var("RUST_LOG").unwrap_or_else(|_| "legacy_converter=info".into()),
    );
    let registry = tracing_subscriber::registry().with(filter);

    match format {
        LogFormat::Json => registry
            .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
            .init(),
        LogFormat::Text => registry
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init(),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration
    dotenvy::dotenv().ok();
    let config = ConverterConfig::from_env();

    init_tracing(config.log_format);

    info!("Starting Legacy Converter v{}", env!("CARGO_PKG_VERSION"));
    info!(
        source = %config.source_dir.display(),
        output = %config.output_dir.display(),
        target = %config.target_language,
        dry_run = config.dry_run,
        "Configuration loaded"
    );

    config.validate().context("invalid configuration")?;

    let converter = HttpConverter::from_config(&config).context("failed to create model client")?;
    if !config.dry_run && !converter.health_check().await {
        warn!(url = %config.llm_api_url, "Model service did not answer the health check");
    }

    let pipeline = ConversionPipeline::from_config(&config, Arc::new(converter))?;
    let report = pipeline.run().await.context("conversion run failed")?;

    println!("{}", serde_json::to_string_pretty(&report)?);

    if report.failed > 0 {
        warn!(failed = report.failed, "Some files could not be converted");
    }

    Ok(())
}
