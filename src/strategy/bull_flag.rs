use std::collections::HashSet;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::clock::Clock;
use crate::grading::TradeOpportunity;
use crate::models::{Candle, Fill, Order, OrderSide};
use crate::risk::RiskLimiter;
use crate::strategy::round_trip::RoundTrip;

/// The round-trip decision engine: turns graded opportunities into a
/// buy/sell order lifecycle and tracks every round trip to completion.
///
/// Buys are gated by the score cutoff, by idempotency on the pattern's
/// start time (overlapping detections of the same flag must not stack
/// positions) and by every risk limiter. Exits are never risk-limited: a
/// stop-loss or profit target hit, or a shooting-star forced exit, always
/// produces the sell order. At most one sell order ever exists per round
/// trip, and round trips are retained for the life of the run.
pub struct BullFlagStrategy {
    clock: Arc<Clock>,
    symbol: String,
    min_order_quantity: f64,
    score_cutoff: f64,
    limiters: Vec<RiskLimiter>,
    round_trips: Vec<RoundTrip>,
    pattern_starts: HashSet<DateTime<Utc>>,
}

impl BullFlagStrategy {
    pub fn new(
        clock: Arc<Clock>,
        symbol: impl Into<String>,
        min_order_quantity: f64,
        score_cutoff: f64,
        limiters: Vec<RiskLimiter>,
    ) -> Self {
        Self {
            clock,
            symbol: symbol.into(),
            min_order_quantity,
            score_cutoff,
            limiters,
            round_trips: Vec::new(),
            pattern_starts: HashSet::new(),
        }
    }

    /// Consider entering on a graded opportunity. Returns the buy order to
    /// submit, already recorded against a fresh round trip.
    pub fn on_opportunity(&mut self, opportunity: TradeOpportunity) -> Option<Order> {
        if !opportunity.good(self.score_cutoff) {
            tracing::debug!(
                score = opportunity.score,
                cutoff = self.score_cutoff,
                "opportunity below score cutoff"
            );
            return None;
        }

        let start = opportunity.pattern.start();
        if self.pattern_starts.contains(&start) {
            tracing::debug!(%start, "round trip already open for this pattern start");
            return None;
        }

        if !self.limiters.iter_mut().all(RiskLimiter::can_send) {
            tracing::debug!(%start, "risk limiter denied buy order");
            return None;
        }

        let order = market_order(
            &self.symbol,
            OrderSide::Buy,
            self.min_order_quantity,
            self.clock.now(),
        );

        // The round trip is recorded before the order counts as sent
        let mut round_trip = RoundTrip::new(opportunity);
        round_trip.buy_order = Some(order.clone());
        self.pattern_starts.insert(start);
        self.round_trips.push(round_trip);
        for limiter in &mut self.limiters {
            limiter.do_send();
        }

        tracing::info!(
            order_id = %order.client_order_id,
            quantity = order.quantity,
            "buy order created for bull-flag opportunity"
        );
        Some(order)
    }

    /// Check every open position against the latest close: stop loss first,
    /// then profit target.
    pub fn on_candle(&mut self, candle: &Candle) -> Vec<Order> {
        let now = self.clock.now();
        let mut orders = Vec::new();

        for round_trip in &mut self.round_trips {
            if !round_trip.has_open_position() {
                continue;
            }

            let reason = if candle.close <= round_trip.opportunity.stop_loss_price {
                Some("limiting loss")
            } else if candle.close >= round_trip.opportunity.profit_price {
                Some("taking profit")
            } else {
                None
            };

            if let Some(reason) = reason {
                let order = market_order(
                    &self.symbol,
                    OrderSide::Sell,
                    round_trip.filled_buy_quantity(),
                    now,
                );
                tracing::info!(
                    order_id = %order.client_order_id,
                    close = candle.close,
                    reason,
                    "sell order created"
                );
                round_trip.sell_order = Some(order.clone());
                orders.push(order);
            }
        }
        orders
    }

    /// Forced exit: a shooting star sells every open position immediately,
    /// independent of price.
    pub fn on_forced_exit(&mut self) -> Vec<Order> {
        let now = self.clock.now();
        let mut orders = Vec::new();

        for round_trip in &mut self.round_trips {
            if !round_trip.has_open_position() {
                continue;
            }

            let order = market_order(
                &self.symbol,
                OrderSide::Sell,
                round_trip.filled_buy_quantity(),
                now,
            );
            tracing::info!(
                order_id = %order.client_order_id,
                "sell order created on forced exit"
            );
            round_trip.sell_order = Some(order.clone());
            orders.push(order);
        }
        orders
    }

    /// Record a fill against the round trip that owns its order. Returns the
    /// completed round trip when this fill closes it.
    pub fn on_fill(&mut self, fill: &Fill) -> Option<RoundTrip> {
        for round_trip in &mut self.round_trips {
            let matches_buy = round_trip
                .buy_order
                .as_ref()
                .is_some_and(|o| o.client_order_id == fill.order_id);
            let matches_sell = round_trip
                .sell_order
                .as_ref()
                .is_some_and(|o| o.client_order_id == fill.order_id);

            if matches_buy {
                round_trip.buy_fills.push(fill.clone());
            } else if matches_sell {
                round_trip.sell_fills.push(fill.clone());
            } else {
                continue;
            }

            if round_trip.is_closed() {
                tracing::info!(
                    round_trip_id = %round_trip.id,
                    buy_quantity = round_trip.filled_buy_quantity(),
                    sell_quantity = round_trip.filled_sell_quantity(),
                    "round trip closed"
                );
                return Some(round_trip.clone());
            }
            return None;
        }

        tracing::warn!(order_id = %fill.order_id, "fill does not match any known order");
        None
    }

    /// Full audit trail of every round trip this run has created.
    pub fn round_trips(&self) -> &[RoundTrip] {
        &self.round_trips
    }
}

fn market_order(symbol: &str, side: OrderSide, quantity: f64, now: DateTime<Utc>) -> Order {
    Order {
        client_order_id: Uuid::new_v4(),
        symbol: symbol.to_string(),
        side,
        price: None,
        quantity,
        creation_time: now,
    }
}
