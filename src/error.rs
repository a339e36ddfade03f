use chrono::{DateTime, Utc};
use thiserror::Error;

/// Errors surfaced by the decision engine.
///
/// Ordering violations and clock misuse are fatal to the run and carry
/// enough context to show what was expected versus what arrived. Everything
/// recoverable (insufficient data, risk denial, duplicate opportunities) is
/// expressed as a normal negative return, not an error.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("clock admin already claimed by '{holder}', rejected claim from '{claimant}'")]
    ClockAlreadyClaimed { holder: String, claimant: String },

    #[error("'{identity}' is not the clock admin and may not set time")]
    NotClockAdmin { identity: String },

    #[error(
        "candle interval of {0}s is invalid: must be at most 60s or an exact multiple of 60s"
    )]
    InvalidInterval(u64),

    #[error(
        "out-of-order trade for {symbol}: transaction time {received} precedes \
         current candle start {current_start}"
    )]
    OutOfOrderTrade {
        symbol: String,
        received: DateTime<Utc>,
        current_start: DateTime<Utc>,
    },

    #[error(
        "out-of-order candle insert: start {received} precedes last stored start {last_start}"
    )]
    OutOfOrderCandle {
        received: DateTime<Utc>,
        last_start: DateTime<Utc>,
    },

    #[error(
        "gap in candle history: previous candle ends at {expected_start} but \
         next candle starts at {received}"
    )]
    CandleGap {
        expected_start: DateTime<Utc>,
        received: DateTime<Utc>,
    },
}

pub type Result<T> = std::result::Result<T, EngineError>;
