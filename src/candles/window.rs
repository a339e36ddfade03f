use std::collections::VecDeque;

use crate::error::{EngineError, Result};
use crate::indicators::calculate_atr;
use crate::models::Candle;

/// How an insert changed the window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InsertOutcome {
    /// A new period was added at the back.
    Appended,
    /// The still-forming candle at the back was replaced in place.
    Merged,
}

/// Capacity-bounded, time-ordered history of candles for one symbol.
///
/// Inserting a candle whose `start_time` matches the last stored candle
/// replaces it (the forming candle being updated trade by trade); a strictly
/// later candle is appended, evicting the oldest once capacity is reached.
/// Earlier candles and non-contiguous candles are programming errors: the
/// pattern and ATR math downstream assumes a gapless ordered history.
#[derive(Debug)]
pub struct CandleWindow {
    candles: VecDeque<Candle>,
    capacity: usize,
}

impl CandleWindow {
    pub fn new(capacity: usize) -> Self {
        Self {
            candles: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    pub fn insert(&mut self, candle: Candle) -> Result<InsertOutcome> {
        if let Some(last) = self.candles.back() {
            if candle.start_time == last.start_time {
                *self.candles.back_mut().unwrap() = candle;
                return Ok(InsertOutcome::Merged);
            }
            if candle.start_time < last.start_time {
                return Err(EngineError::OutOfOrderCandle {
                    received: candle.start_time,
                    last_start: last.start_time,
                });
            }
            if candle.start_time != last.end_time {
                return Err(EngineError::CandleGap {
                    expected_start: last.end_time,
                    received: candle.start_time,
                });
            }
        }

        self.candles.push_back(candle);
        while self.candles.len() > self.capacity {
            self.candles.pop_front();
        }
        Ok(InsertOutcome::Appended)
    }

    /// Average True Range over the last `period` candles, or None when the
    /// window holds fewer candles than that.
    pub fn atr(&self, period: usize) -> Option<f64> {
        let candles: Vec<Candle> = self.candles.iter().cloned().collect();
        calculate_atr(&candles, period)
    }

    pub fn len(&self) -> usize {
        self.candles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.candles.is_empty()
    }

    pub fn last(&self) -> Option<&Candle> {
        self.candles.back()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Candle> {
        self.candles.iter()
    }
}
