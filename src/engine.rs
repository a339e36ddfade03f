use std::sync::Arc;

use crate::candles::{CandleAggregator, CandleWindow};
use crate::clock::Clock;
use crate::config::EngineConfig;
use crate::error::Result;
use crate::events::EventSink;
use crate::grading::OpportunityGrader;
use crate::models::{Candle, Fill, Order, Trade};
use crate::patterns::{BullFlagRecognizer, ShootingStarRecognizer};
use crate::risk::RiskLimiter;
use crate::strategy::{BullFlagStrategy, RoundTrip};

/// The full signal pipeline, dispatched synchronously.
///
/// Every incoming trade, candle or fill runs to completion inside its
/// handler: trades fold into candles, candles feed the recognizers, matches
/// are graded, graded opportunities drive the round-trip strategy, and the
/// orders to submit are handed back to the caller. The engine performs no
/// I/O and owns no threads; whoever drives it (live feed or replay) also
/// owns the clock.
pub struct Engine<S: EventSink> {
    aggregator: CandleAggregator,
    window: CandleWindow,
    bull_flag: BullFlagRecognizer,
    shooting_star: ShootingStarRecognizer,
    grader: OpportunityGrader,
    strategy: BullFlagStrategy,
    sink: S,
}

impl<S: EventSink> Engine<S> {
    pub fn new(config: &EngineConfig, clock: Arc<Clock>, sink: S) -> Result<Self> {
        let limiters = config
            .risk_limits
            .iter()
            .map(|limit| RiskLimiter::new(clock.clone(), limit.max_orders, limit.window_seconds))
            .collect();

        Ok(Self {
            aggregator: CandleAggregator::new(&config.symbol, config.candle_interval_secs)?,
            window: CandleWindow::new(config.window_capacity),
            bull_flag: BullFlagRecognizer::new(
                clock.clone(),
                config.bull_flag.clone(),
                config.window_capacity,
                config.verbose_patterns,
            ),
            shooting_star: ShootingStarRecognizer::new(
                clock.clone(),
                config.shooting_star.clone(),
            ),
            grader: OpportunityGrader::new(
                config.atr_period,
                config.atr_factor,
                config.reward_risk_ratio,
            ),
            strategy: BullFlagStrategy::new(
                clock,
                &config.symbol,
                config.min_order_quantity,
                config.score_cutoff,
                limiters,
            ),
            sink,
        })
    }

    /// Fold one trade and run the pipeline on the candle(s) it produced.
    /// Returns the orders to submit, in creation order.
    pub fn on_trade(&mut self, trade: &Trade) -> Result<Vec<Order>> {
        let (closed, forming) = self.aggregator.on_trade(trade)?;

        let mut orders = Vec::new();
        if let Some(closed) = closed {
            orders.extend(self.on_candle(closed)?);
        }
        orders.extend(self.on_candle(forming)?);
        Ok(orders)
    }

    /// Run the pipeline on one candle (also the entry point for feeds that
    /// deliver pre-aggregated candles).
    pub fn on_candle(&mut self, candle: Candle) -> Result<Vec<Order>> {
        self.window.insert(candle.clone())?;

        let mut orders = Vec::new();
        for pattern in self.bull_flag.on_candle(&candle)? {
            self.sink.on_bull_flag(&pattern);
            if let Some(opportunity) = self.grader.grade(&pattern, &self.window) {
                self.sink.on_opportunity(&opportunity);
                orders.extend(self.strategy.on_opportunity(opportunity));
            }
        }

        let stars = self.shooting_star.on_candle(&candle);
        for star in &stars {
            self.sink.on_shooting_star(star);
        }
        if !stars.is_empty() {
            orders.extend(self.strategy.on_forced_exit());
        }

        orders.extend(self.strategy.on_candle(&candle));
        Ok(orders)
    }

    /// Record a fill from the execution collaborator.
    pub fn on_fill(&mut self, fill: &Fill) {
        if let Some(closed) = self.strategy.on_fill(fill) {
            self.sink.on_trade_result(&closed);
        }
    }

    pub fn round_trips(&self) -> &[RoundTrip] {
        self.strategy.round_trips()
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }
}
