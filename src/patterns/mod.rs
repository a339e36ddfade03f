// Candlestick pattern recognizers
pub mod bull_flag;
pub mod shooting_star;

pub use bull_flag::{BullFlagParams, BullFlagPattern, BullFlagRecognizer, BullFlagResult};
pub use shooting_star::{ShootingStarParams, ShootingStarPattern, ShootingStarRecognizer};
