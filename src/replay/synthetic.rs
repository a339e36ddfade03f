use chrono::{DateTime, Duration, TimeZone, Utc};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::models::{Trade, TradeSide};

/// Market scenarios for synthetic replay streams.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scenario {
    /// Sideways noise, no tradeable structure.
    Choppy,
    /// Gentle uptrend, a sharp flag candle, tight consolidation, breakout
    /// through the profit target.
    BullFlagBreakout,
    /// Same setup, but the consolidation resolves into a shooting star and
    /// a decline instead of a breakout.
    BullFlagReversal,
}

/// Generates ordered trade streams for replay runs, seeded for
/// reproducibility. Each candle period receives four trades: open, high,
/// low and close, at fixed offsets inside the period.
pub struct SyntheticTradeGenerator {
    rng: StdRng,
    base_price: f64,
    base_quantity: f64,
}

impl SyntheticTradeGenerator {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
            base_price: 100.0,
            base_quantity: 1.0,
        }
    }

    /// Generate `periods` candle periods' worth of trades at the given
    /// interval, starting from a fixed epoch so runs are comparable.
    pub fn generate(&mut self, scenario: Scenario, periods: usize, interval_secs: u64) -> Vec<Trade> {
        let start = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let plan = match scenario {
            Scenario::Choppy => self.plan_choppy(periods),
            Scenario::BullFlagBreakout => self.plan_breakout(periods),
            Scenario::BullFlagReversal => self.plan_reversal(periods),
        };

        let mut trades = Vec::with_capacity(plan.len() * 4);
        for (i, &(open, high, low, close)) in plan.iter().enumerate() {
            let period_start = start + Duration::seconds(i as i64 * interval_secs as i64);
            self.push_period(&mut trades, period_start, interval_secs, open, high, low, close);
        }
        trades
    }

    fn plan_choppy(&mut self, periods: usize) -> Vec<(f64, f64, f64, f64)> {
        let mut plan = Vec::with_capacity(periods);
        let mut price = self.base_price;
        for _ in 0..periods {
            plan.push(self.quiet_candle(&mut price, 0.0));
        }
        plan
    }

    fn plan_breakout(&mut self, periods: usize) -> Vec<(f64, f64, f64, f64)> {
        let warmup = periods.saturating_sub(9).max(4);
        let mut plan = Vec::with_capacity(periods);
        let mut price = self.base_price;

        for _ in 0..warmup {
            plan.push(self.quiet_candle(&mut price, 0.0005));
        }
        plan.push(flag_candle(&mut price));
        for _ in 0..2 {
            plan.push(self.quiet_candle(&mut price, 0.0));
        }
        while plan.len() < periods {
            plan.push(trend_candle(&mut price, 0.02));
        }
        plan
    }

    fn plan_reversal(&mut self, periods: usize) -> Vec<(f64, f64, f64, f64)> {
        let warmup = periods.saturating_sub(9).max(4);
        let mut plan = Vec::with_capacity(periods);
        let mut price = self.base_price;

        for _ in 0..warmup {
            plan.push(self.quiet_candle(&mut price, 0.0005));
        }
        plan.push(flag_candle(&mut price));
        // Deep-wicked consolidation widens the stop so the star's upper
        // shadow stays short of the profit target
        plan.push(wicked_consolidation(&mut price));
        plan.push(shooting_star_candle(&mut price));
        while plan.len() < periods {
            plan.push(trend_candle(&mut price, -0.01));
        }
        plan
    }

    /// A small-bodied candle with wiggles sized so it can never classify as
    /// a shooting star (the lower wiggle dominates the upper one).
    fn quiet_candle(&mut self, price: &mut f64, drift: f64) -> (f64, f64, f64, f64) {
        let open = *price;
        let noise: f64 = self.rng.gen_range(-0.0002..0.0002);
        // Positive drift keeps the candle bullish so the trend context
        // feeding the grader stays intact
        let body = if drift > 0.0 { drift + noise.abs() } else { noise };
        let close = open * (1.0 + body);
        let high = open.max(close) + 0.02;
        let low = open.min(close) - 0.03;
        *price = close;
        (open, high, low, close)
    }

    fn push_period(
        &mut self,
        trades: &mut Vec<Trade>,
        period_start: DateTime<Utc>,
        interval_secs: u64,
        open: f64,
        high: f64,
        low: f64,
        close: f64,
    ) {
        let quarter = (interval_secs / 4).max(1) as i64;
        let legs = [(0, open), (1, high), (2, low), (3, close)];
        for (step, price) in legs {
            let time = period_start + Duration::seconds(step * quarter);
            let quantity = self.base_quantity * self.rng.gen_range(0.5..1.5);
            trades.push(Trade {
                id: format!("syn-{}-{step}", time.timestamp()),
                symbol: "BTC-USD".to_string(),
                side: if price >= open { TradeSide::Buy } else { TradeSide::Sell },
                price,
                quantity,
                transaction_time: time,
            });
        }
    }
}

/// Sharp +5% up-move, the flag.
fn flag_candle(price: &mut f64) -> (f64, f64, f64, f64) {
    let open = *price;
    let close = open * 1.05;
    *price = close;
    (open, close, open, close)
}

/// Steady trend leg, full-bodied.
fn trend_candle(price: &mut f64, rate: f64) -> (f64, f64, f64, f64) {
    let open = *price;
    let close = open * (1.0 + rate);
    *price = close;
    (open, open.max(close), open.min(close), close)
}

/// Tight body with a long probing lower wick. The wick drags the support
/// stop well below the entry without disturbing the body-ratio math.
fn wicked_consolidation(price: &mut f64) -> (f64, f64, f64, f64) {
    let open = *price;
    let close = open - 0.01;
    *price = close;
    (open, open + 0.02, open - 1.0, close)
}

/// Long upper shadow, sliver of a body and lower shadow.
fn shooting_star_candle(price: &mut f64) -> (f64, f64, f64, f64) {
    let open = *price;
    let close = open - 0.05;
    let high = open * 1.015;
    let low = close - 0.02;
    *price = close;
    (open, high, low, close)
}
