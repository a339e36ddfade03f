use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::clock::Clock;
use crate::models::Candle;

/// Floor applied to every divisor so degenerate candles (zero body, zero
/// range) classify safely instead of dividing by zero.
const RATIO_EPSILON: f64 = 0.01;

/// Tunables for shooting-star classification.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ShootingStarParams {
    /// Body must stay below this fraction of the full range.
    pub max_body_ratio: f64,
    /// Upper shadow must be at least this multiple of the body.
    pub min_upper_shadow_ratio: f64,
    /// Lower shadow must stay below this fraction of the full range.
    pub max_lower_shadow_ratio: f64,
}

impl Default for ShootingStarParams {
    fn default() -> Self {
        Self {
            max_body_ratio: 0.33,
            min_upper_shadow_ratio: 2.0,
            max_lower_shadow_ratio: 0.1,
        }
    }
}

/// A completed candle classified as a shooting star: small body, long upper
/// shadow, negligible lower shadow. A bearish reversal signal.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShootingStarPattern {
    pub candle: Candle,
    pub body_ratio: f64,
    pub upper_shadow_ratio: f64,
    pub lower_shadow_ratio: f64,
}

/// Classifies single completed candles, holding at most the one most
/// recently seen candle that has not completed yet.
pub struct ShootingStarRecognizer {
    clock: Arc<Clock>,
    params: ShootingStarParams,
    pending: Option<Candle>,
}

impl ShootingStarRecognizer {
    pub fn new(clock: Arc<Clock>, params: ShootingStarParams) -> Self {
        Self {
            clock,
            params,
            pending: None,
        }
    }

    /// Feed the next candle. A pending candle that has since completed is
    /// classified first; a completed incoming candle is classified
    /// immediately; a forming one becomes the new pending candle.
    pub fn on_candle(&mut self, candle: &Candle) -> Vec<ShootingStarPattern> {
        let now = self.clock.now();
        let mut patterns = Vec::new();

        if let Some(pending) = self.pending.take() {
            // An incoming candle for the same period supersedes the stale
            // pending snapshot; classifying both would double-report.
            if pending.start_time != candle.start_time && pending.is_completed(now) {
                patterns.extend(self.classify(&pending));
            }
        }

        if candle.is_completed(now) {
            patterns.extend(self.classify(candle));
        } else {
            self.pending = Some(candle.clone());
        }
        patterns
    }

    fn classify(&self, candle: &Candle) -> Option<ShootingStarPattern> {
        let range = candle.high - candle.low;
        let body = candle.body();

        let body_ratio = body / RATIO_EPSILON.max(range);
        let upper_shadow_ratio =
            (candle.high - candle.open.max(candle.close)) / RATIO_EPSILON.max(body);
        let lower_shadow_ratio =
            (candle.open.min(candle.close) - candle.low) / RATIO_EPSILON.max(range);

        let is_match = body_ratio > 0.0
            && body_ratio < self.params.max_body_ratio
            && upper_shadow_ratio >= self.params.min_upper_shadow_ratio
            && lower_shadow_ratio > 0.0
            && lower_shadow_ratio < self.params.max_lower_shadow_ratio;

        if !is_match {
            return None;
        }

        Some(ShootingStarPattern {
            candle: candle.clone(),
            body_ratio,
            upper_shadow_ratio,
            lower_shadow_ratio,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{DateTime, Duration, TimeZone, Utc};

    fn at(m: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 1, 12, m, 0).unwrap()
    }

    fn candle(minute: u32, open: f64, high: f64, low: f64, close: f64) -> Candle {
        let mut c = Candle::empty("BTC-USD", at(minute), Duration::seconds(60));
        c.open = open;
        c.high = high;
        c.low = low;
        c.close = close;
        c.volume = 1.0;
        c
    }

    fn clock_at(minute: u32) -> Arc<Clock> {
        let clock = Arc::new(Clock::new());
        clock.claim_admin("test").unwrap();
        clock.use_fake_time("test", at(minute)).unwrap();
        clock
    }

    fn recognizer(clock: Arc<Clock>) -> ShootingStarRecognizer {
        ShootingStarRecognizer::new(clock, ShootingStarParams::default())
    }

    #[test]
    fn test_classifies_completed_shooting_star() {
        let mut rec = recognizer(clock_at(10));

        // Small bearish body, towering upper shadow, sliver of lower shadow
        let patterns = rec.on_candle(&candle(0, 100.0, 105.0, 99.4, 99.5));
        assert_eq!(patterns.len(), 1);

        let p = &patterns[0];
        assert!(p.body_ratio > 0.0 && p.body_ratio < 0.33);
        assert!(p.upper_shadow_ratio >= 2.0);
        assert!(p.lower_shadow_ratio > 0.0 && p.lower_shadow_ratio < 0.1);
    }

    #[test]
    fn test_zero_body_candle_is_not_a_shooting_star() {
        let mut rec = recognizer(clock_at(10));

        // open == close: the epsilon guard must not manufacture a match
        let patterns = rec.on_candle(&candle(0, 100.0, 105.0, 99.9, 100.0));
        assert!(patterns.is_empty());
    }

    #[test]
    fn test_bullish_wide_body_rejected() {
        let mut rec = recognizer(clock_at(10));
        let patterns = rec.on_candle(&candle(0, 100.0, 105.0, 100.0, 104.0));
        assert!(patterns.is_empty());
    }

    #[test]
    fn test_long_lower_shadow_rejected() {
        let mut rec = recognizer(clock_at(10));
        let patterns = rec.on_candle(&candle(0, 100.0, 105.0, 95.0, 99.5));
        assert!(patterns.is_empty());
    }

    #[test]
    fn test_forming_candle_waits_until_completed() {
        let clock = clock_at(0);
        let mut rec = recognizer(clock.clone());

        // Candle for minute 0 is still forming at minute 0
        assert!(rec.on_candle(&candle(0, 100.0, 105.0, 99.4, 99.5)).is_empty());

        // Next candle arrives after the period ended: pending classifies
        clock.use_fake_time("test", at(1)).unwrap();
        let patterns = rec.on_candle(&candle(1, 99.5, 99.6, 99.4, 99.5));
        assert_eq!(patterns.len(), 1);
        assert_eq!(patterns[0].candle.start_time, at(0));
    }

    #[test]
    fn test_merged_update_does_not_double_classify() {
        let clock = clock_at(0);
        let mut rec = recognizer(clock.clone());

        rec.on_candle(&candle(0, 100.0, 104.0, 99.5, 99.8));

        // The same period arrives again, now completed: classified once
        clock.use_fake_time("test", at(1)).unwrap();
        let patterns = rec.on_candle(&candle(0, 100.0, 105.0, 99.4, 99.5));
        assert_eq!(patterns.len(), 1);
        assert_eq!(patterns[0].candle.high, 105.0);
    }
}
