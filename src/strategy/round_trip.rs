use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::grading::TradeOpportunity;
use crate::models::{Fill, Order};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RoundTripStatus {
    /// Opportunity graded, no order yet.
    Opened,
    /// Buy order submitted.
    BuySent,
    /// At least one buy fill recorded (possibly partial).
    BuyFilled,
    /// Sell order submitted.
    SellSent,
    /// Both orders filled to their full quantity; the trade result is final.
    Closed,
}

/// One buy-then-sell position lifecycle, kept for the life of the run as an
/// audit trail. Mutated only by the owning strategy as orders and fills
/// arrive; never deleted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoundTrip {
    pub id: Uuid,
    pub opportunity: TradeOpportunity,
    pub buy_order: Option<Order>,
    pub buy_fills: Vec<Fill>,
    pub sell_order: Option<Order>,
    pub sell_fills: Vec<Fill>,
}

impl RoundTrip {
    pub fn new(opportunity: TradeOpportunity) -> Self {
        Self {
            id: Uuid::new_v4(),
            opportunity,
            buy_order: None,
            buy_fills: Vec::new(),
            sell_order: None,
            sell_fills: Vec::new(),
        }
    }

    pub fn filled_buy_quantity(&self) -> f64 {
        self.buy_fills.iter().map(|f| f.quantity).sum()
    }

    pub fn filled_sell_quantity(&self) -> f64 {
        self.sell_fills.iter().map(|f| f.quantity).sum()
    }

    /// Current lifecycle state, derived from orders and fills.
    pub fn status(&self) -> RoundTripStatus {
        if self.is_closed() {
            RoundTripStatus::Closed
        } else if self.sell_order.is_some() {
            RoundTripStatus::SellSent
        } else if !self.buy_fills.is_empty() {
            RoundTripStatus::BuyFilled
        } else if self.buy_order.is_some() {
            RoundTripStatus::BuySent
        } else {
            RoundTripStatus::Opened
        }
    }

    /// Closed once both orders exist and each is filled to its quantity.
    pub fn is_closed(&self) -> bool {
        match (&self.buy_order, &self.sell_order) {
            (Some(buy), Some(sell)) => {
                self.filled_buy_quantity() >= buy.quantity
                    && self.filled_sell_quantity() >= sell.quantity
            }
            _ => false,
        }
    }

    /// Holding an unsold position: bought (at least partially) but no sell
    /// order out yet.
    pub fn has_open_position(&self) -> bool {
        self.buy_order.is_some() && self.sell_order.is_none() && !self.buy_fills.is_empty()
    }
}
