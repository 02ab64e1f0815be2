mod driver;
mod report;

use anyhow::Result;
use clap::Parser;
use driver::StreamDriver;
use sdo_anomaly::{DetectorConfig, SdoDetector, SharedDetector};
use sdo_config::ConfigManager;
use sdo_core::{AppConfig, SourceKind};
use sdo_feed::{source_from_settings, PriceStream};
use std::{path::PathBuf, time::Duration};
use tokio::signal;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to configuration file
    #[arg(short, long, env = "SDO_MONITOR_CONFIG")]
    config: Option<PathBuf>,

    /// Ticker symbol to fetch from Yahoo Finance
    #[arg(short, long)]
    ticker: Option<String>,

    /// Read prices from a CSV file instead of Yahoo Finance
    #[arg(long)]
    csv: Option<PathBuf>,

    /// Seed for reproducible observer sampling
    #[arg(long)]
    seed: Option<u64>,

    /// Anomaly threshold override
    #[arg(long)]
    threshold: Option<f64>,

    /// Stream points without pacing delay
    #[arg(long)]
    no_delay: bool,

    /// Print the final summary as JSON
    #[arg(long)]
    json: bool,

    /// Enable debug logging
    #[arg(short, long)]
    debug: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    init_logging(args.debug);

    info!("Starting SDO stream monitor");

    let config = load_config(&args)?;
    let source = source_from_settings(&config.source)?;

    let detector_config = DetectorConfig::from_settings(&config.detector)?;
    let detector: SharedDetector =
        SdoDetector::from_seed(detector_config, config.detector.seed).into();

    info!("Fetching historical data from {}", source.name());
    let series = source.fetch().await?;

    let mut driver = StreamDriver::new(detector.clone(), config.stream.clone());
    driver.ensure_enough_data(series.len())?;

    let mut stream = PriceStream::new(series);
    driver.warm_up(&mut stream)?;
    info!(
        observers = detector.snapshot().len(),
        "Observers initialized with initial data window"
    );

    let delay = if args.no_delay {
        Duration::ZERO
    } else {
        Duration::from_millis(config.stream.delay_ms)
    };

    info!(
        "Starting data stream for {} points",
        config.stream.stream_length
    );

    let json = args.json;
    let points = stream.paced(delay);
    tokio::select! {
        result = driver.run(points, |record| {
            if !json {
                println!("{}", report::format_alert(record));
            }
            info!("{}", record.description);
        }) => result?,
        _ = signal::ctrl_c() => {
            warn!("Received Ctrl+C, stopping stream early");
        }
    }

    let summary = driver.summary();
    if args.json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
    } else {
        println!("{}", report::format_summary(&source.name(), &summary));
    }

    info!("SDO stream monitor stopped");
    Ok(())
}

fn init_logging(debug: bool) {
    let env_filter = if debug { "debug" } else { "info" };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| env_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

fn load_config(args: &Args) -> Result<AppConfig> {
    let mut manager = match &args.config {
        Some(path) => ConfigManager::from_file(path)?,
        None => ConfigManager::from_env()?,
    };

    let config = manager.get_config_mut();
    if let Some(ticker) = &args.ticker {
        config.source.kind = SourceKind::Yahoo;
        config.source.ticker = ticker.clone();
    }
    if let Some(path) = &args.csv {
        config.source.kind = SourceKind::Csv;
        config.source.path = Some(path.clone());
    }
    if let Some(seed) = args.seed {
        config.detector.seed = Some(seed);
    }
    if let Some(threshold) = args.threshold {
        config.detector.threshold = threshold;
    }

    manager.validate()?;
    Ok(manager.into_config())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_overrides_config() {
        let args = Args::parse_from([
            "sdo-monitor",
            "--csv",
            "prices.csv",
            "--seed",
            "9",
            "--threshold",
            "3.5",
        ]);

        let config = load_config(&args).unwrap();
        assert_eq!(config.source.kind, SourceKind::Csv);
        assert_eq!(config.source.path, Some(PathBuf::from("prices.csv")));
        assert_eq!(config.detector.seed, Some(9));
        assert_eq!(config.detector.threshold, 3.5);
    }

    #[test]
    fn test_invalid_threshold_rejected() {
        let args = Args::parse_from(["sdo-monitor", "--threshold=-1"]);
        assert!(load_config(&args).is_err());
    }
}
