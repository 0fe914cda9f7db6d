//! Timed-auction bidding and settlement engine.
//!
//! The engine admits concurrent bid attempts under per-auction
//! serialization, drives auctions through their lifecycle on the clock,
//! fans out committed state changes to room subscribers, and reconciles
//! winning bids into payable orders with exactly-once payment application.

pub mod config;
pub mod engine;
pub mod error;
pub mod marketplace;
pub mod traits;
pub mod util;

#[cfg(any(test, feature = "test-support"))]
pub mod mocks;

pub use engine::{
    AdmissionPolicy, AuctionHouse, AuctionStore, BidAdmission, BidLedger, Broadcaster, Event,
    OrderProgress, OrderStore, PaymentReconciler, Room, SettlementResult, VerifiedPayment,
};
pub use error::{AuctionError, GavelResult};
pub use marketplace::{
    AttemptOutcome, Auction, AuctionBuilder, AuctionStatus, Bid, BidderId, Order, OrderId,
    OrderLine, PaymentAttempt, PaymentFailure, PaymentMethod, PaymentStatus, Phase, ProductId,
    SaleMode,
};
pub use traits::{Clock, GatewayOrder, OfflineGateway, PaymentGateway, SystemClock};
