// Core modules
pub mod candles;
pub mod clock;
pub mod config;
pub mod engine;
pub mod error;
pub mod events;
pub mod grading;
pub mod indicators;
pub mod models;
pub mod patterns;
pub mod replay;
pub mod risk;
pub mod strategy;

// Re-export commonly used types
pub use clock::Clock;
pub use config::EngineConfig;
pub use engine::Engine;
pub use error::{EngineError, Result};
pub use models::*;
