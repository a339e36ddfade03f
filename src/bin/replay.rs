use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use clap::{Parser, ValueEnum};
use flagbot::events::RecordingSink;
use flagbot::replay::{run_replay, Scenario, SyntheticTradeGenerator};
use flagbot::{Clock, Engine, EngineConfig};

/// Replay a synthetic trade stream through the decision engine and print
/// what it would have traded.
#[derive(Debug, Parser)]
#[command(name = "replay", version)]
struct Args {
    /// Market scenario to generate
    #[arg(long, value_enum, default_value_t = ScenarioArg::BullFlagBreakout)]
    scenario: ScenarioArg,

    /// RNG seed for the trade stream
    #[arg(long, default_value_t = 42)]
    seed: u64,

    /// Number of candle periods to generate
    #[arg(long, default_value_t = 60)]
    periods: usize,

    /// Candle interval in seconds
    #[arg(long, default_value_t = 60)]
    interval_secs: u64,

    /// Delay between trades in milliseconds (0 = run flat out)
    #[arg(long, default_value_t = 0)]
    pace_ms: u64,

    /// Optional TOML config file (environment overrides still apply)
    #[arg(long)]
    config: Option<PathBuf>,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum ScenarioArg {
    Choppy,
    BullFlagBreakout,
    BullFlagReversal,
}

impl From<ScenarioArg> for Scenario {
    fn from(arg: ScenarioArg) -> Self {
        match arg {
            ScenarioArg::Choppy => Scenario::Choppy,
            ScenarioArg::BullFlagBreakout => Scenario::BullFlagBreakout,
            ScenarioArg::BullFlagReversal => Scenario::BullFlagReversal,
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let args = Args::parse();
    let mut config = EngineConfig::load(args.config.as_deref())?;
    config.candle_interval_secs = args.interval_secs;

    let clock = Arc::new(Clock::new());
    let mut engine = Engine::new(&config, clock.clone(), RecordingSink::new())?;

    let trades = SyntheticTradeGenerator::new(args.seed).generate(
        args.scenario.into(),
        args.periods,
        args.interval_secs,
    );

    let pace = (args.pace_ms > 0).then(|| Duration::from_millis(args.pace_ms));
    let report = run_replay(&mut engine, &clock, &trades, pace).await?;

    let sink = engine.sink();
    tracing::info!(
        trades = report.trades,
        orders = report.orders.len(),
        bull_flags = sink.bull_flags.len(),
        shooting_stars = sink.shooting_stars.len(),
        opportunities = sink.opportunities.len(),
        completed_round_trips = sink.trade_results.len(),
        "replay summary"
    );

    for round_trip in &sink.trade_results {
        println!("{}", serde_json::to_string(round_trip)?);
    }
    Ok(())
}
