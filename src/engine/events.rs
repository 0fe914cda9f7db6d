//! Typed real-time events and the rooms they fan out through.
//!
//! Every state change the engine commits is mirrored to subscribers as one
//! of these variants; payloads are fixed and documented rather than
//! open-ended maps, so every consumer decodes the same shape.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::marketplace::{BidderId, OrderId, PaymentStatus, ProductId};

/// A broadcast group scoped to one auction or one order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Room {
    Auction(ProductId),
    Order(OrderId),
}

impl fmt::Display for Room {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Auction(product) => write!(f, "auction/{product}"),
            Self::Order(order) => write!(f, "order/{order}"),
        }
    }
}

/// Fulfilment progress of an order, as shown to its buyer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum OrderProgress {
    Placed,
    AwaitingPayment,
    PayOnDelivery,
    Paid,
}

/// A state change published to a room.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event")]
pub enum Event {
    /// A new highest bid was committed.
    #[serde(rename = "bid-update", rename_all = "camelCase")]
    BidUpdate {
        product_id: ProductId,
        current_bid: u64,
        bidder: BidderId,
    },

    /// The auction closed; `winner` is absent when nobody bid.
    #[serde(rename = "auction-ended", rename_all = "camelCase")]
    AuctionEnded {
        product_id: ProductId,
        winner: Option<BidderId>,
        final_bid: Option<u64>,
    },

    /// The order's payment state changed.
    #[serde(rename = "payment:status", rename_all = "camelCase")]
    PaymentUpdate {
        order_id: OrderId,
        payment_status: PaymentStatus,
    },

    /// The order's fulfilment progress changed.
    #[serde(rename = "order:status", rename_all = "camelCase")]
    OrderUpdate {
        order_id: OrderId,
        status: OrderProgress,
    },

    /// Human-readable message for the room's viewers.
    #[serde(rename = "notification:new", rename_all = "camelCase")]
    Notification { message: String },
}
