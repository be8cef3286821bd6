//! `finhealth` command-line financial health checker.

use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Parser;
use finhealth::{Analyzer, AnalyzerConfig, HealthReport, PeriodType, ScoringPolicy};
use tracing::{debug, warn};
use tracing_subscriber::EnvFilter;

mod render;

/// Fetch a company's financial statements, compute key ratios and score its
/// financial health.
#[derive(Parser, Debug)]
#[command(name = "finhealth", author, version, about, long_about = None)]
struct Args {
    /// Ticker symbol, e.g. AAPL or BRK-B
    ticker: String,

    /// Scoring policy: tally or weighted
    #[arg(long)]
    policy: Option<ScoringPolicy>,

    /// Statement period: annual or quarterly
    #[arg(long)]
    period: Option<PeriodType>,

    /// Number of statement periods to fetch
    #[arg(long)]
    periods: Option<usize>,

    /// Price history lookback in days (0 to skip)
    #[arg(long)]
    price_days: Option<u32>,

    /// Disable the session cache
    #[arg(long)]
    no_cache: bool,

    /// Print the trend, latest ratios and verdict as JSON
    #[arg(long)]
    json: bool,
}

impl Args {
    fn apply(&self, mut config: AnalyzerConfig) -> Result<AnalyzerConfig> {
        if let Some(policy) = self.policy {
            config = config.with_policy(policy);
        }
        if let Some(period) = self.period {
            config = config.with_period_type(period);
        }
        if let Some(periods) = self.periods {
            config = config.with_periods(periods);
        }
        if let Some(days) = self.price_days {
            config = config.with_price_days(days);
        }
        if self.no_cache {
            config = config.with_cache(false);
        }
        config.validate()?;
        Ok(config)
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    // Missing .env is fine
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("finhealth=info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    match run(args).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e:#}");
            ExitCode::FAILURE
        }
    }
}

async fn run(args: Args) -> Result<()> {
    let config = args.apply(AnalyzerConfig::from_env().context("invalid FINHEALTH_* setting")?)?;
    debug!(?config, "Resolved configuration");

    let analyzer = Analyzer::from_config(config);
    let report = analyzer.analyze(&args.ticker).await?;

    if args.json {
        print_json(&report)
    } else {
        print_text(&report)
    }
}

fn print_json(report: &HealthReport) -> Result<()> {
    let value = serde_json::json!({
        "symbol": report.symbol,
        "trend": report.trend,
        "latest": report.latest,
        "verdict": report.verdict,
        "prices": report.price_summary(),
    });
    println!("{}", serde_json::to_string_pretty(&value)?);
    Ok(())
}

fn print_text(report: &HealthReport) -> Result<()> {
    println!("Financial Health Check: {}\n", report.symbol);

    println!("Financial statements");
    println!("{}\n", report.financials_frame()?);

    println!("Ratio trend");
    println!("{}\n", report.ratio_frame()?);

    match report.price_summary() {
        Some(summary) => println!("Price history: {}\n", render::price_summary(&summary)),
        None => println!("Price history: not available\n"),
    }

    let period = report
        .latest
        .period_end()
        .map_or_else(|| "latest period".to_string(), |d| d.to_string());
    println!("Ratios for {period}");
    print!("{}", render::latest_ratios(&report.latest));

    let missing = render::missing_core(&report.latest);
    if !missing.is_empty() {
        warn!(?missing, "Some core ratios could not be computed");
    }

    println!("\nScoring: {}", render::strategy(report.verdict.policy));
    println!("Verdict: {}", render::verdict(&report.verdict));
    Ok(())
}
