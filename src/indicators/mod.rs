// Technical indicators over candle history
pub mod atr;

pub use atr::calculate_atr;
