//! Price direction predictor
//!
//! Serves the prediction API or runs one-off predictions from the terminal.

use clap::{Parser, Subcommand};
use price_direction::{
    api::{self, AppState},
    client::{CachedQuotes, FundamentalsLookup, HistoryProvider, LivePriceLookup, YahooClient},
    config::Config,
    ml::Predictor,
    symbols::{display_symbol, normalize_symbol},
};
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "price-direction")]
#[command(about = "Short-horizon price direction predictor for NSE/BSE symbols")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Config file path
    #[arg(short, long, default_value = "config.toml")]
    config: String,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the HTTP API
    Serve,
    /// Predict the next move for a symbol and print it as JSON
    Predict {
        /// Symbol, e.g. RELIANCE, NIFTY, ITC.NS
        symbol: String,
    },
    /// Show recent bars for a symbol
    History {
        symbol: String,

        /// Bar interval
        #[arg(short, long, default_value = "15m")]
        interval: String,

        /// Lookback period, e.g. 5d
        #[arg(short, long, default_value = "5d")]
        period: String,

        /// Number of most recent bars to print
        #[arg(short, long, default_value = "20")]
        limit: usize,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    // Initialize logging
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();

    // Load configuration
    let config = Config::load(&cli.config)?;

    match cli.command {
        Commands::Serve => serve(config).await,
        Commands::Predict { symbol } => predict(config, &symbol).await,
        Commands::History {
            symbol,
            interval,
            period,
            limit,
        } => show_history(config, &symbol, &interval, &period, limit).await,
    }
}

struct Collaborators {
    history: Arc<dyn HistoryProvider>,
    quotes: Arc<dyn LivePriceLookup>,
    fundamentals: Arc<dyn FundamentalsLookup>,
}

fn collaborators(config: &Config) -> anyhow::Result<Collaborators> {
    let yahoo = Arc::new(YahooClient::new(&config.yahoo)?);
    let quotes = CachedQuotes::new(
        YahooClient::clone(&yahoo),
        Duration::from_secs(config.quotes.cache_ttl_secs),
    );
    Ok(Collaborators {
        history: yahoo.clone(),
        quotes: Arc::new(quotes),
        fundamentals: yahoo,
    })
}

async fn serve(config: Config) -> anyhow::Result<()> {
    tracing::info!("Starting price direction API");

    let c = collaborators(&config)?;
    let state = Arc::new(AppState::new(&config, c.history, c.quotes, c.fundamentals));

    api::start_server(state, &config.server)
        .await
        .map_err(|e| anyhow::anyhow!("API server failed: {}", e))
}

async fn predict(config: Config, raw_symbol: &str) -> anyhow::Result<()> {
    let symbol = normalize_symbol(raw_symbol);
    if symbol.is_empty() {
        anyhow::bail!("symbol must not be empty");
    }

    let c = collaborators(&config)?;
    let predictor = Predictor::from_config(&config, c.history, c.quotes);

    let mut result = predictor.predict(&symbol).await?;
    result.symbol = display_symbol(raw_symbol);

    println!("{}", serde_json::to_string_pretty(&result)?);
    Ok(())
}

async fn show_history(
    config: Config,
    raw_symbol: &str,
    interval: &str,
    period: &str,
    limit: usize,
) -> anyhow::Result<()> {
    let symbol = normalize_symbol(raw_symbol);
    let history = collaborators(&config)?.history;
    let bars = history.get_history(&symbol, interval, period).await?;

    println!("\n📈 {} ({}): {} bars at {}\n", raw_symbol.to_uppercase(), symbol, bars.len(), interval);
    println!(
        "{:<22} {:>10} {:>10} {:>10} {:>10} {:>12}",
        "Time (UTC)", "Open", "High", "Low", "Close", "Volume"
    );
    println!("{}", "-".repeat(80));

    let skip = bars.len().saturating_sub(limit);
    for bar in &bars[skip..] {
        println!(
            "{:<22} {:>10.2} {:>10.2} {:>10.2} {:>10.2} {:>12.0}",
            bar.timestamp.format("%Y-%m-%d %H:%M"),
            bar.open,
            bar.high,
            bar.low,
            bar.close,
            bar.volume
        );
    }

    Ok(())
}
