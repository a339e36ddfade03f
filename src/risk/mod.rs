// Order-rate risk management
pub mod limiter;

pub use limiter::RiskLimiter;
