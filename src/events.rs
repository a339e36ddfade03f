use crate::grading::TradeOpportunity;
use crate::patterns::{BullFlagPattern, ShootingStarPattern};
use crate::strategy::RoundTrip;

/// Typed observability boundary.
///
/// The engine pushes each pattern, opportunity and completed round trip
/// through this interface exactly once, as a plain data snapshot with no
/// acknowledgement expected. Persistence, alerting and bookkeeping live on
/// the other side of it.
pub trait EventSink {
    fn on_bull_flag(&mut self, _pattern: &BullFlagPattern) {}
    fn on_shooting_star(&mut self, _pattern: &ShootingStarPattern) {}
    fn on_opportunity(&mut self, _opportunity: &TradeOpportunity) {}
    fn on_trade_result(&mut self, _round_trip: &RoundTrip) {}
}

/// Discards every event.
#[derive(Debug, Default)]
pub struct NullSink;

impl EventSink for NullSink {}

/// Collects every event in memory, for tests and replay summaries.
#[derive(Debug, Default)]
pub struct RecordingSink {
    pub bull_flags: Vec<BullFlagPattern>,
    pub shooting_stars: Vec<ShootingStarPattern>,
    pub opportunities: Vec<TradeOpportunity>,
    pub trade_results: Vec<RoundTrip>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }
}

impl EventSink for RecordingSink {
    fn on_bull_flag(&mut self, pattern: &BullFlagPattern) {
        self.bull_flags.push(pattern.clone());
    }

    fn on_shooting_star(&mut self, pattern: &ShootingStarPattern) {
        self.shooting_stars.push(pattern.clone());
    }

    fn on_opportunity(&mut self, opportunity: &TradeOpportunity) {
        self.opportunities.push(opportunity.clone());
    }

    fn on_trade_result(&mut self, round_trip: &RoundTrip) {
        self.trade_results.push(round_trip.clone());
    }
}
