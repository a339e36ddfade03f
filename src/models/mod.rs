use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Tolerance for clock skew when deciding whether a candle period has ended.
/// A candle counts as completed slightly before its nominal end time so a
/// feed whose clock runs marginally behind still closes periods on time.
const COMPLETION_SKEW: i64 = 100; // milliseconds

/// A single market trade as delivered by the market-data collaborator.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Trade {
    pub id: String,
    pub symbol: String,
    pub side: TradeSide,
    pub price: f64,
    pub quantity: f64,
    pub transaction_time: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TradeSide {
    Buy,
    Sell,
}

/// OHLCV summary of the trades inside one fixed time window.
///
/// `volume == 0.0` is the "not yet opened" sentinel: the first accepted
/// trade sets open/high/low/close to its price. Identity is `start_time`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Candle {
    pub symbol: String,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
}

impl Candle {
    /// Create an empty (not yet opened) candle covering
    /// `[start_time, start_time + duration]`.
    pub fn empty(symbol: impl Into<String>, start_time: DateTime<Utc>, duration: Duration) -> Self {
        Self {
            symbol: symbol.into(),
            start_time,
            end_time: start_time + duration,
            open: 0.0,
            high: 0.0,
            low: 0.0,
            close: 0.0,
            volume: 0.0,
        }
    }

    /// Fold one trade into this candle.
    ///
    /// Accepts only trades with `start_time <= transaction_time <= end_time`;
    /// returns false without mutating anything otherwise. The first accepted
    /// trade opens the candle at its price.
    pub fn add_trade(&mut self, price: f64, quantity: f64, transaction_time: DateTime<Utc>) -> bool {
        if transaction_time < self.start_time || transaction_time > self.end_time {
            return false;
        }

        if self.volume == 0.0 {
            self.open = price;
            self.high = price;
            self.low = price;
        } else {
            self.high = self.high.max(price);
            self.low = self.low.min(price);
        }
        self.close = price;
        self.volume += quantity;
        true
    }

    /// Whether this candle's period has ended as of `now`.
    pub fn is_completed(&self, now: DateTime<Utc>) -> bool {
        now >= self.end_time - Duration::milliseconds(COMPLETION_SKEW)
    }

    /// Absolute size of the candle body.
    pub fn body(&self) -> f64 {
        (self.open - self.close).abs()
    }

    pub fn is_bullish(&self) -> bool {
        self.close > self.open
    }

    /// Close-over-open return; zero for a candle that never opened.
    pub fn return_pct(&self) -> f64 {
        if self.open == 0.0 {
            0.0
        } else {
            (self.close - self.open) / self.open
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OrderSide {
    Buy,
    Sell,
}

/// An order submitted to the execution collaborator. Immutable once sent.
/// `price == None` means a market order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Order {
    pub client_order_id: Uuid,
    pub symbol: String,
    pub side: OrderSide,
    pub price: Option<f64>,
    pub quantity: f64,
    pub creation_time: DateTime<Utc>,
}

/// A fill notification from the execution collaborator, referencing a
/// previously submitted order. One order may fill in several parts.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Fill {
    pub order_id: Uuid,
    pub side: OrderSide,
    pub price: f64,
    pub quantity: f64,
    pub transaction_time: DateTime<Utc>,
}
