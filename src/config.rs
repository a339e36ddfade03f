use std::path::Path;

use serde::Deserialize;

use crate::patterns::{BullFlagParams, ShootingStarParams};

/// One sliding-window order budget: at most `max_orders` order submissions
/// inside any `window_seconds` span.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RiskLimitConfig {
    pub max_orders: usize,
    pub window_seconds: u64,
}

impl Default for RiskLimitConfig {
    fn default() -> Self {
        Self {
            max_orders: 1,
            window_seconds: 60,
        }
    }
}

/// Static engine configuration, loaded once at startup.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub symbol: String,
    pub candle_interval_secs: u64,
    /// Candles retained in the shared history window.
    pub window_capacity: usize,
    /// Emit every scanned bull-flag window, not just matches.
    pub verbose_patterns: bool,
    pub bull_flag: BullFlagParams,
    pub shooting_star: ShootingStarParams,
    pub atr_period: usize,
    pub atr_factor: f64,
    pub reward_risk_ratio: f64,
    pub score_cutoff: f64,
    pub min_order_quantity: f64,
    pub risk_limits: Vec<RiskLimitConfig>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            symbol: "BTC-USD".to_string(),
            candle_interval_secs: 60,
            window_capacity: 120,
            verbose_patterns: false,
            bull_flag: BullFlagParams::default(),
            shooting_star: ShootingStarParams::default(),
            atr_period: 14,
            atr_factor: 1.0,
            reward_risk_ratio: 2.0,
            score_cutoff: 0.75,
            min_order_quantity: 0.01,
            risk_limits: vec![RiskLimitConfig::default()],
        }
    }
}

impl EngineConfig {
    /// Load configuration from an optional TOML file with
    /// `FLAGBOT__`-prefixed environment variable overrides
    /// (e.g. `FLAGBOT__SCORE_CUTOFF=0.9`).
    pub fn load(path: Option<&Path>) -> anyhow::Result<Self> {
        let mut builder = config::Config::builder();
        if let Some(path) = path {
            builder = builder.add_source(config::File::from(path));
        }
        let settings = builder
            .add_source(config::Environment::with_prefix("FLAGBOT").separator("__"))
            .build()?;

        Ok(settings.try_deserialize()?)
    }
}
