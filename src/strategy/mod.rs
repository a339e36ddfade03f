// Round-trip trading strategy
pub mod bull_flag;
pub mod round_trip;

pub use bull_flag::BullFlagStrategy;
pub use round_trip::{RoundTrip, RoundTripStatus};
