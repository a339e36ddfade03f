use chrono::{DateTime, Duration, TimeZone, Utc};

use crate::error::{EngineError, Result};
use crate::models::{Candle, Trade};

/// Folds an ordered trade stream into fixed-interval candles.
///
/// One instance per (symbol, interval). Purely trade-time driven: a period
/// closes when the first trade beyond its end arrives, so replay and live
/// runs fold identically.
#[derive(Debug)]
pub struct CandleAggregator {
    symbol: String,
    interval: Duration,
    current: Option<Candle>,
}

impl CandleAggregator {
    /// Intervals must be at most 60 seconds or an exact multiple of 60
    /// seconds, so that period boundaries land on round clock times.
    pub fn new(symbol: impl Into<String>, interval_secs: u64) -> Result<Self> {
        if interval_secs == 0 || (interval_secs > 60 && interval_secs % 60 != 0) {
            return Err(EngineError::InvalidInterval(interval_secs));
        }
        Ok(Self {
            symbol: symbol.into(),
            interval: Duration::seconds(interval_secs as i64),
            current: None,
        })
    }

    /// Fold one trade.
    ///
    /// Returns `(closed, forming)`: `closed` is the final version of the
    /// previous period's candle when this trade opened a new period, and
    /// `forming` is a snapshot of the candle the trade landed in. Trades
    /// earlier than the forming candle's window are an ordering violation.
    pub fn on_trade(&mut self, trade: &Trade) -> Result<(Option<Candle>, Candle)> {
        if let Some(current) = self.current.as_mut() {
            if current.add_trade(trade.price, trade.quantity, trade.transaction_time) {
                return Ok((None, current.clone()));
            }
            if trade.transaction_time < current.start_time {
                return Err(EngineError::OutOfOrderTrade {
                    symbol: trade.symbol.clone(),
                    received: trade.transaction_time,
                    current_start: current.start_time,
                });
            }
        }

        // The forming candle (if any) rejected a later trade: its period is
        // over, emit it as final and open the period the trade belongs to.
        let closed = self.current.take();
        let start = self.floor_to_interval(trade.transaction_time);
        let mut candle = Candle::empty(self.symbol.clone(), start, self.interval);
        let accepted = candle.add_trade(trade.price, trade.quantity, trade.transaction_time);
        debug_assert!(accepted, "freshly floored candle must accept its own trade");

        self.current = Some(candle.clone());
        Ok((closed, candle))
    }

    /// Snapshot of the currently forming candle, if a trade has arrived.
    pub fn current(&self) -> Option<&Candle> {
        self.current.as_ref()
    }

    fn floor_to_interval(&self, time: DateTime<Utc>) -> DateTime<Utc> {
        let interval_secs = self.interval.num_seconds();
        let floored = time.timestamp() - time.timestamp().rem_euclid(interval_secs);
        Utc.timestamp_opt(floored, 0).unwrap()
    }
}
