// Deterministic replay of historical trade streams
pub mod synthetic;

use std::time::Duration;

use crate::clock::Clock;
use crate::engine::Engine;
use crate::error::Result;
use crate::events::EventSink;
use crate::models::{Fill, Order, Trade};

pub use synthetic::{Scenario, SyntheticTradeGenerator};

/// Identity under which the replay driver claims the clock.
pub const REPLAY_DRIVER: &str = "replay-driver";

/// Summary of one replay run.
#[derive(Debug, Default)]
pub struct ReplayReport {
    pub trades: usize,
    pub orders: Vec<Order>,
    pub fills: usize,
}

/// Stand-in for the execution collaborator during replay: fills every
/// market order immediately and completely at the last traded price.
#[derive(Debug, Default)]
struct InstantFillSimulator {
    last_price: f64,
}

impl InstantFillSimulator {
    fn on_trade(&mut self, trade: &Trade) {
        self.last_price = trade.price;
    }

    fn fill(&self, order: &Order, clock: &Clock) -> Fill {
        Fill {
            order_id: order.client_order_id,
            side: order.side,
            price: order.price.unwrap_or(self.last_price),
            quantity: order.quantity,
            transaction_time: clock.now(),
        }
    }
}

/// Drive the engine from an ordered historical trade stream.
///
/// Claims clock admin once, then pins fake time to each trade's timestamp
/// before dispatching it, so every downstream decision is computed against
/// the trade's own time and the run reproduces live behavior exactly.
/// `pace` inserts an artificial delay between trades for watchable replays;
/// `None` runs as fast as the input drains.
pub async fn run_replay<S: EventSink>(
    engine: &mut Engine<S>,
    clock: &Clock,
    trades: &[Trade],
    pace: Option<Duration>,
) -> Result<ReplayReport> {
    clock.claim_admin(REPLAY_DRIVER)?;
    tracing::info!(trades = trades.len(), "starting replay");

    let mut simulator = InstantFillSimulator::default();
    let mut report = ReplayReport::default();

    for trade in trades {
        if let Some(delay) = pace {
            tokio::time::sleep(delay).await;
        }

        clock.use_fake_time(REPLAY_DRIVER, trade.transaction_time)?;
        simulator.on_trade(trade);
        report.trades += 1;

        for order in engine.on_trade(trade)? {
            let fill = simulator.fill(&order, clock);
            engine.on_fill(&fill);
            report.fills += 1;
            report.orders.push(order);
        }
    }

    tracing::info!(
        trades = report.trades,
        orders = report.orders.len(),
        fills = report.fills,
        "replay finished"
    );
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::EngineConfig;
    use crate::events::RecordingSink;
    use std::sync::Arc;

    #[tokio::test]
    async fn test_replay_claims_admin_and_advances_time() {
        let clock = Arc::new(Clock::new());
        let config = EngineConfig::default();
        let mut engine = Engine::new(&config, clock.clone(), RecordingSink::new()).unwrap();

        let mut generator = SyntheticTradeGenerator::new(7);
        let trades = generator.generate(Scenario::Choppy, 10, 60);

        let report = run_replay(&mut engine, &clock, &trades, None).await.unwrap();
        assert_eq!(report.trades, trades.len());

        // Clock stays pinned to the final trade's timestamp
        assert_eq!(clock.now(), trades.last().unwrap().transaction_time);

        // A second driver cannot take over the same clock
        assert!(clock.claim_admin("other").is_err());
    }

    #[tokio::test]
    async fn test_breakout_scenario_completes_a_round_trip() {
        let clock = Arc::new(Clock::new());
        let config = EngineConfig {
            atr_period: 3,
            score_cutoff: 0.4,
            ..EngineConfig::default()
        };
        let mut engine = Engine::new(&config, clock.clone(), RecordingSink::new()).unwrap();

        let mut generator = SyntheticTradeGenerator::new(7);
        let trades = generator.generate(Scenario::BullFlagBreakout, 30, 60);

        let report = run_replay(&mut engine, &clock, &trades, None).await.unwrap();
        assert!(!report.orders.is_empty(), "breakout must trigger a buy");
        assert_eq!(report.fills, report.orders.len());
        assert!(!engine.sink().trade_results.is_empty());
    }

    #[tokio::test]
    async fn test_same_seed_same_decisions() {
        async fn run(seed: u64) -> Vec<(chrono::DateTime<chrono::Utc>, f64)> {
            let clock = Arc::new(Clock::new());
            let config = EngineConfig {
                atr_period: 3,
                score_cutoff: 0.4,
                ..EngineConfig::default()
            };
            let mut engine =
                Engine::new(&config, clock.clone(), RecordingSink::new()).unwrap();
            let trades =
                SyntheticTradeGenerator::new(seed).generate(Scenario::BullFlagBreakout, 30, 60);
            let report = run_replay(&mut engine, &clock, &trades, None).await.unwrap();
            report
                .orders
                .iter()
                .map(|o| (o.creation_time, o.quantity))
                .collect()
        }

        // Same input stream, bit-identical order decisions
        assert_eq!(run(42).await, run(42).await);
    }
}
