use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::candles::{CandleWindow, InsertOutcome};
use crate::clock::Clock;
use crate::error::Result;
use crate::models::Candle;

/// Tunables for bull-flag detection.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BullFlagParams {
    /// Candles before the flag that the flag must dwarf.
    pub pre_count: usize,
    /// The flag body must exceed this multiple of every pre-candle body.
    pub extreme_threshold: f64,
    /// Minimum close-over-open return of the flag candle.
    pub min_return_pct: f64,
    /// Largest tolerated consolidation body, as a fraction of the flag body.
    pub consolidation_cutoff: f64,
    /// Candidate windows with more consolidation candles than this are too
    /// old to be actionable and are skipped.
    pub max_consolidation_count: usize,
}

impl Default for BullFlagParams {
    fn default() -> Self {
        Self {
            pre_count: 1,
            extreme_threshold: 2.0,
            min_return_pct: 0.001,
            consolidation_cutoff: 0.2,
            max_consolidation_count: 4,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BullFlagResult {
    Unknown,
    BullFlag,
    NoExtremeBullish,
    NoConsolidationPeriod,
}

/// Outcome of classifying one candidate window. Emitted for every scanned
/// window in verbose mode (to diagnose near-misses), or only on a match.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BullFlagPattern {
    pub pre_candles: Vec<Candle>,
    pub flag_candle: Candle,
    pub consolidation_candles: Vec<Candle>,
    pub consolidation_max_ratio: f64,
    pub result: BullFlagResult,
}

impl BullFlagPattern {
    pub fn start(&self) -> DateTime<Utc> {
        self.flag_candle.start_time
    }

    pub fn end(&self) -> DateTime<Utc> {
        self.consolidation_candles
            .last()
            .map(|c| c.end_time)
            .unwrap_or(self.flag_candle.end_time)
    }
}

/// Detects a sharp up-move followed by a low-volatility consolidation.
///
/// Holds a private candle window; every appended candle triggers a rescan of
/// all candidate windows ending at the newest completed candle, longest
/// consolidation first. The still-forming candle never participates.
pub struct BullFlagRecognizer {
    clock: Arc<Clock>,
    window: CandleWindow,
    params: BullFlagParams,
    verbose: bool,
}

impl BullFlagRecognizer {
    pub fn new(clock: Arc<Clock>, params: BullFlagParams, capacity: usize, verbose: bool) -> Self {
        Self {
            clock,
            window: CandleWindow::new(capacity),
            params,
            verbose,
        }
    }

    /// Feed the next candle (forming snapshots included) and collect the
    /// patterns the updated history produces.
    pub fn on_candle(&mut self, candle: &Candle) -> Result<Vec<BullFlagPattern>> {
        if self.window.insert(candle.clone())? == InsertOutcome::Merged {
            // In-place update of the forming candle; nothing new to scan.
            return Ok(Vec::new());
        }

        let now = self.clock.now();
        let completed: Vec<&Candle> = self
            .window
            .iter()
            .filter(|c| c.is_completed(now))
            .collect();

        let mut patterns = Vec::new();
        for consolidation_count in (1..=self.params.max_consolidation_count).rev() {
            let needed = self.params.pre_count + 1 + consolidation_count;
            if completed.len() < needed {
                continue;
            }

            let candidate = &completed[completed.len() - needed..];
            let pattern = self.classify(candidate, consolidation_count);
            if self.verbose || pattern.result == BullFlagResult::BullFlag {
                patterns.push(pattern);
            }
        }
        Ok(patterns)
    }

    fn classify(&self, candidate: &[&Candle], consolidation_count: usize) -> BullFlagPattern {
        let pre_candles: Vec<Candle> = candidate[..self.params.pre_count]
            .iter()
            .map(|c| (*c).clone())
            .collect();
        let flag_candle = candidate[self.params.pre_count].clone();
        let consolidation_candles: Vec<Candle> = candidate[self.params.pre_count + 1..]
            .iter()
            .map(|c| (*c).clone())
            .collect();
        debug_assert_eq!(consolidation_candles.len(), consolidation_count);

        let mut pattern = BullFlagPattern {
            pre_candles,
            flag_candle,
            consolidation_candles,
            consolidation_max_ratio: 0.0,
            result: BullFlagResult::Unknown,
        };

        let extremely_bullish = pattern.flag_candle.return_pct() > self.params.min_return_pct
            && pattern.pre_candles.iter().all(|pre| {
                pattern.flag_candle.body() > self.params.extreme_threshold * pre.body()
            });
        if !extremely_bullish {
            pattern.result = BullFlagResult::NoExtremeBullish;
            return pattern;
        }

        let flag_body = pattern.flag_candle.body();
        let max_ratio = pattern
            .consolidation_candles
            .iter()
            .map(|c| {
                if flag_body == 0.0 {
                    // A zero-body flag tolerates only zero-body consolidation
                    if c.body() == 0.0 {
                        0.0
                    } else {
                        f64::INFINITY
                    }
                } else {
                    c.body() / flag_body
                }
            })
            .fold(0.0, f64::max);

        pattern.consolidation_max_ratio = max_ratio;
        pattern.result = if max_ratio > self.params.consolidation_cutoff {
            BullFlagResult::NoConsolidationPeriod
        } else {
            BullFlagResult::BullFlag
        };
        pattern
    }
}
