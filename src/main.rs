use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{error, info};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use stock_elo::analysis::{ScoringConfig, WeightPreset};
use stock_elo::api::AlphaVantageClient;
use stock_elo::models::{Config, TimeFrame};
use stock_elo::ranking_engine::{parse_symbol_list, RankingEngine, RankingRequest};
use stock_elo::report::{self, OutputFormat};
use stock_elo::ui::{self, LeaderboardApp};

/// Rank stocks by a synthetic Elo rating built from fundamentals, technicals and price change
#[derive(Parser)]
#[command(name = "stock-elo")]
#[command(version = "0.1.0")]
#[command(about = "Score and rank stock symbols by an Elo-style rating")]
#[command(long_about = "
Fetches fundamentals and daily prices from Alpha Vantage, computes RSI, MACD and
SMA deviation, and combines them with P/E, ROE, EPS, market cap and the price
change over the selected time frame into a single rating around 1000.

Requires ALPHAVANTAGE_API_KEY in the environment or a .env file.

Examples:
  stock-elo rank AAPL MSFT TSLA --frame 3m
  stock-elo rank \"Apple, Microsoft\" --resolve-names --format json
  stock-elo rank AAPL GOOG --format csv --output rankings.csv
  stock-elo tui
")]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Print a leaderboard for the given symbols
    Rank(RankArgs),
    /// Interactive leaderboard (default)
    Tui(TuiArgs),
}

#[derive(Args)]
struct CommonArgs {
    /// Time frame for the price change component (1w, 1m, 3m, 6m, 1y)
    #[arg(short, long, default_value = "1m")]
    frame: TimeFrame,

    /// Fundamental weight preset (canonical or legacy)
    #[arg(short, long)]
    weights: Option<WeightPreset>,

    /// Currency for the price column
    #[arg(short, long)]
    currency: Option<String>,

    /// Treat inputs as company names and look up their ticker symbols
    #[arg(long)]
    resolve_names: bool,
}

#[derive(Args)]
struct RankArgs {
    /// Symbols or company names; commas inside an argument also separate entries
    #[arg(required = true)]
    symbols: Vec<String>,

    /// Output format (table, json, csv)
    #[arg(long, default_value = "table")]
    format: OutputFormat,

    /// Write the report to a file instead of stdout
    #[arg(short, long)]
    output: Option<PathBuf>,

    #[command(flatten)]
    common: CommonArgs,
}

#[derive(Args)]
struct TuiArgs {
    /// Initial contents of the input line
    #[arg(short, long, default_value = ui::DEFAULT_INPUT)]
    symbols: String,

    #[command(flatten)]
    common: CommonArgs,
}

fn init_logging(default_directive: &str) -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_directive));
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .finish();

    tracing::subscriber::set_global_default(subscriber)?;
    Ok(())
}

fn apply_overrides(config: &mut Config, common: &CommonArgs) {
    if let Some(preset) = common.weights {
        config.weight_preset = preset;
    }
    if let Some(currency) = &common.currency {
        config.display_currency = currency.trim().to_uppercase();
    }
}

fn build_engine(config: &Config) -> Result<RankingEngine<AlphaVantageClient>> {
    let client = AlphaVantageClient::new(config)?;
    let scoring = ScoringConfig::with_preset(config.weight_preset);
    Ok(RankingEngine::new(client, scoring).with_concurrency(config.fetch_concurrency))
}

async fn run_rank(mut config: Config, args: RankArgs) -> Result<()> {
    apply_overrides(&mut config, &args.common);
    let engine = build_engine(&config)?;

    let inputs = parse_symbol_list(&args.symbols.join(","));
    let mut request = RankingRequest::new(inputs, args.common.frame);
    request.resolve_names = args.common.resolve_names;
    request.currency = config.display_currency.clone();

    let ranking = engine.rank(&request).await;

    match args.output {
        Some(path) => {
            let mut file = std::fs::File::create(&path)
                .with_context(|| format!("failed to create {}", path.display()))?;
            match args.format {
                OutputFormat::Csv => report::write_csv(&ranking, &mut file)?,
                format => file.write_all(report::render(&ranking, format)?.as_bytes())?,
            }
            info!("💾 Report written to {}", path.display());
        }
        None => print!("{}", report::render(&ranking, args.format)?),
    }

    Ok(())
}

async fn run_tui(mut config: Config, args: TuiArgs) -> Result<()> {
    apply_overrides(&mut config, &args.common);
    let engine = Arc::new(build_engine(&config)?);

    let mut app = LeaderboardApp::new(&args.symbols, args.common.frame, &config.display_currency);
    app.resolve_names = args.common.resolve_names;

    ui::run_app(engine, app).await
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let command = cli.command.unwrap_or_else(|| {
        Command::Tui(TuiArgs {
            symbols: ui::DEFAULT_INPUT.to_string(),
            common: CommonArgs {
                frame: TimeFrame::default(),
                weights: None,
                currency: None,
                resolve_names: false,
            },
        })
    });

    // Logs would corrupt the TUI screen
    match command {
        Command::Tui(_) => init_logging("stock_elo=error")?,
        Command::Rank(_) => init_logging("stock_elo=info")?,
    }

    let config = match Config::from_env() {
        Ok(config) => config,
        Err(e) => {
            error!("Failed to load configuration: {}", e);
            eprintln!("❌ Configuration Error: {}", e);
            eprintln!("Make sure you have a .env file with ALPHAVANTAGE_API_KEY set.");
            std::process::exit(1);
        }
    };

    match command {
        Command::Rank(args) => run_rank(config, args).await,
        Command::Tui(args) => run_tui(config, args).await,
    }
}
