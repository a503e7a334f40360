//! Intrinsic Valuation - One-pager valuation service.
//!
//! Serves historical-multiples and DCF valuations with news sentiment for
//! listed companies, backed by Alpha Vantage.

use anyhow::Result;
use std::sync::Arc;
use intrinsic_common::config::Config;
use intrinsic_common::logging::init_logging_with_exclusions;
use intrinsic_valuation::data::AlphaVantageAdapter;
use intrinsic_valuation::ValuationService;

#[tokio::main]
async fn main() -> Result<()> {
    // Start timing immediately for cold-start measurement
    let startup_start = std::time::Instant::now();

    // Load and validate configuration
    let config = Config::load_and_validate()?;

    // Initialize logging
    init_logging_with_exclusions(
        &config.observability.log_level,
        &config.observability.log_format,
        &config.observability.excluded_targets,
    );

    tracing::info!("Intrinsic Valuation v{}", env!("CARGO_PKG_VERSION"));

    if config.alpha_vantage_api_key().is_none() {
        tracing::warn!(
            "No Alpha Vantage API key configured; set ALPHA_VANTAGE_API_KEY or secrets.external.alpha_vantage"
        );
    }

    let provider = Arc::new(AlphaVantageAdapter::from_config(&config));
    let service = Arc::new(ValuationService::from_config(&config, provider));

    // Log startup timing before entering the server loop
    let startup_duration = startup_start.elapsed();
    tracing::info!(
        duration_ms = startup_duration.as_millis() as u64,
        "Service initialized in {:?}",
        startup_duration
    );

    intrinsic_valuation::start(&config, service).await
}
