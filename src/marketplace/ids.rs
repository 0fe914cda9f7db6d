//! Identifier newtypes for the auction engine.
//!
//! Bids, rooms, and order lines are keyed by the product a listing sells;
//! a timed auction is embedded in exactly one product, so the product id
//! doubles as the auction id.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifier of a product (and of the auction embedded in it, if any).
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub struct ProductId(pub u64);

/// Identifier of a registered bidder / buyer.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub struct BidderId(pub u64);

/// Identifier of a payable order.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub struct OrderId(pub u64);

impl fmt::Display for ProductId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "product-{}", self.0)
    }
}

impl fmt::Display for BidderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "bidder-{}", self.0)
    }
}

impl fmt::Display for OrderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "order-{}", self.0)
    }
}
