use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::{info, warn};

use inboundai::integrations::{HuggingFaceClient, KakaoClient, NaverBlogClient, TourApiClient};
use inboundai::{App, DataStore, ForecastSelector, InboundAiConfig, PersistentCache, Services};

#[derive(Parser, Debug)]
#[command(
    name = "inboundai",
    version,
    about = "Inbound tourism demand forecasting and AI itinerary planning"
)]
struct Cli {
    /// Path to a TOML configuration file
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Debug logging for this crate
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Serve the planning API
    Serve {
        /// Overrides `server.port`
        #[arg(long)]
        port: Option<u16>,
    },
    /// Forecast every country in a history file and write the combined dataset
    Forecast {
        /// Defaults to `data.history_path`
        #[arg(long)]
        history: Option<PathBuf>,
        /// Defaults to `data.combined_path`
        #[arg(long)]
        output: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut config = InboundAiConfig::load_from_path(cli.config)?;
    inboundai::logging::init(&config.logging, cli.verbose)?;

    match cli.command {
        Commands::Serve { port } => {
            if let Some(port) = port {
                config.server.port = port;
            }
            serve(config).await
        }
        Commands::Forecast { history, output } => {
            let history = history.unwrap_or_else(|| config.data.history_path.clone());
            let output = output.unwrap_or_else(|| config.data.combined_path.clone());
            forecast(&config, &history, &output)
        }
    }
}

async fn serve(config: InboundAiConfig) -> Result<()> {
    let cache = if config.cache.enabled {
        let cache = PersistentCache::open(&config.cache.location)
            .with_context(|| format!("Failed to open cache at {}", config.cache.location))?;
        Some(Arc::new(cache))
    } else {
        None
    };

    if config.llm.api_key.is_none() {
        warn!("llm.api_key is not set, itinerary generation will fail");
    }

    let data = DataStore::load(&config).context("Failed to load visitor data")?;
    info!(records = data.records().len(), "Visitor data loaded");

    let services = Services {
        data: Arc::new(data),
        tourism: Arc::new(TourApiClient::new(&config, cache.clone())?),
        places: Arc::new(KakaoClient::new(&config)?),
        blogs: Arc::new(NaverBlogClient::new(&config, cache)?),
        chat: Arc::new(HuggingFaceClient::new(&config)?),
        config: Arc::new(config.clone()),
    };

    let app = Arc::new(App::new(services));
    inboundai::web::run(&config.server, app).await
}

fn forecast(config: &InboundAiConfig, history: &Path, output: &Path) -> Result<()> {
    let records = inboundai::dataset::load_visitor_records(history)
        .with_context(|| format!("Failed to read history from {}", history.display()))?;

    let run = ForecastSelector::new(config.forecast.clone()).build_combined(records)?;
    for outcome in &run.outcomes {
        info!(country = %outcome.country, model = ?outcome.model, months = outcome.records.len(), "Forecast ready");
    }
    for (country, reason) in &run.skipped {
        warn!(country, %reason, "Country skipped");
    }

    inboundai::dataset::save_visitor_records(output, &run.records)
        .with_context(|| format!("Failed to write {}", output.display()))?;
    println!(
        "Wrote {} records for {} countries to {}",
        run.records.len(),
        run.outcomes.len(),
        output.display()
    );
    Ok(())
}
