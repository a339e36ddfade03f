/// Average True Range (ATR) indicator
///
/// Measures volatility as the average of true ranges over the most recent
/// `period` candles. True Range is the greatest of:
/// - Current High - Current Low
/// - Abs(Current High - Previous Close)
/// - Abs(Current Low - Previous Close)
use crate::models::Candle;

/// Calculate ATR over the last `period` candles.
///
/// The previous close for the oldest candle in the lookback is unknown, so
/// the `period - 1` adjacent true ranges are averaged over `period`.
/// Returns None when fewer than `period` candles are available.
pub fn calculate_atr(candles: &[Candle], period: usize) -> Option<f64> {
    if period < 2 || candles.len() < period {
        return None;
    }

    let recent = &candles[candles.len() - period..];
    let mut sum = 0.0;
    for i in 1..recent.len() {
        let high = recent[i].high;
        let low = recent[i].low;
        let prev_close = recent[i - 1].close;

        let tr = (high - low)
            .max((high - prev_close).abs())
            .max((low - prev_close).abs());

        sum += tr;
    }

    Some(sum / period as f64)
}
