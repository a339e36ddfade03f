// Trade-to-candle folding and rolling candle history
pub mod aggregator;
pub mod window;

pub use aggregator::CandleAggregator;
pub use window::{CandleWindow, InsertOutcome};
