use serde::{Deserialize, Serialize};

use crate::candles::CandleWindow;
use crate::patterns::{BullFlagPattern, BullFlagResult};

/// Score deducted when the window leading into the pattern is not itself
/// bullish (half or fewer of the preceding candles closed up).
const WEAK_CONTEXT_PENALTY: f64 = 0.5;

/// A scored, fully priced trading opportunity derived from a bull flag.
/// Immutable once constructed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TradeOpportunity {
    pub pattern: BullFlagPattern,
    pub expected_trade_price: f64,
    pub stop_loss_from_atr: f64,
    pub stop_loss_from_support: f64,
    pub stop_loss_price: f64,
    pub profit_price: f64,
    pub score: f64,
}

impl TradeOpportunity {
    pub fn good(&self, cutoff: f64) -> bool {
        self.score > cutoff
    }
}

/// Prices and scores confirmed bull-flag patterns.
#[derive(Debug, Clone)]
pub struct OpportunityGrader {
    atr_period: usize,
    atr_factor: f64,
    reward_risk_ratio: f64,
}

impl OpportunityGrader {
    pub fn new(atr_period: usize, atr_factor: f64, reward_risk_ratio: f64) -> Self {
        Self {
            atr_period,
            atr_factor,
            reward_risk_ratio,
        }
    }

    /// Grade a pattern against the current candle history.
    ///
    /// Only `BullFlag` results qualify; anything else, or a window too short
    /// for ATR, yields no opportunity.
    pub fn grade(&self, pattern: &BullFlagPattern, window: &CandleWindow) -> Option<TradeOpportunity> {
        if pattern.result != BullFlagResult::BullFlag {
            return None;
        }
        let atr = window.atr(self.atr_period)?;

        let expected_trade_price = pattern.consolidation_candles.last()?.close;
        let stop_loss_from_atr = expected_trade_price - self.atr_factor * atr;
        let stop_loss_from_support = pattern
            .consolidation_candles
            .iter()
            .map(|c| c.low)
            .fold(f64::INFINITY, f64::min);

        // The flag candle's open floors the stop: a stop below the entire
        // up-move would be unrealistically generous.
        let stop_loss_price = stop_loss_from_atr
            .min(stop_loss_from_support)
            .max(pattern.flag_candle.open);
        let profit_price = expected_trade_price
            + self.reward_risk_ratio * (expected_trade_price - stop_loss_price);

        let score = 1.0 - self.weak_context_penalty(pattern, window);

        Some(TradeOpportunity {
            pattern: pattern.clone(),
            expected_trade_price,
            stop_loss_from_atr,
            stop_loss_from_support,
            stop_loss_price,
            profit_price,
            score,
        })
    }

    /// Discount patterns that fire without a bullish trend behind them:
    /// candles strictly before the flag candle count, and half or fewer of
    /// them closing up costs the penalty. No preceding candles, no penalty.
    fn weak_context_penalty(&self, pattern: &BullFlagPattern, window: &CandleWindow) -> f64 {
        let preceding: Vec<_> = window
            .iter()
            .filter(|c| c.start_time < pattern.start())
            .collect();
        if preceding.is_empty() {
            return 0.0;
        }

        let bullish = preceding.iter().filter(|c| c.is_bullish()).count();
        if (bullish as f64) / (preceding.len() as f64) <= 0.5 {
            WEAK_CONTEXT_PENALTY
        } else {
            0.0
        }
    }
}
