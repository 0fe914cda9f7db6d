//! Deterministic test harness for full-engine scenarios.
//!
//! Bundles an engine wired to a mock clock and mock gateway, with helpers
//! for listing auctions and driving bidders, so scenario tests read as a
//! sequence of marketplace actions.

use std::sync::Arc;

use gavel::mocks::{MockClock, MockGateway};
use gavel::{
    AdmissionPolicy, Auction, AuctionHouse, BidderId, GavelResult, Order, OrderId, ProductId,
};

pub const GATEWAY_SECRET: &str = "harness_gateway_secret";

/// Epoch all harness clocks start at.
pub const START_MILLIS: u64 = 1_000_000;

/// An engine plus the handles tests use to manipulate it.
pub struct EngineHarness {
    pub house: Arc<AuctionHouse<MockClock, MockGateway>>,
    pub clock: MockClock,
    pub gateway: MockGateway,
}

#[allow(dead_code)]
impl EngineHarness {
    /// Harness with the default admission policy and a sandbox gateway.
    pub fn new() -> Self {
        Self::with_policy(AdmissionPolicy::default())
    }

    /// Harness exercising the live signature path.
    pub fn with_live_gateway() -> Self {
        Self::build(AdmissionPolicy::default(), MockGateway::live())
    }

    pub fn with_policy(policy: AdmissionPolicy) -> Self {
        Self::build(policy, MockGateway::new())
    }

    fn build(policy: AdmissionPolicy, gateway: MockGateway) -> Self {
        let clock = MockClock::new(START_MILLIS);
        let house = Arc::new(AuctionHouse::new(
            clock.clone(),
            gateway.clone(),
            GATEWAY_SECRET,
            policy,
        ));
        Self {
            house,
            clock,
            gateway,
        }
    }

    /// List an auction opening now and closing after `duration_ms`.
    pub async fn open_auction(
        &self,
        product: u64,
        starting_bid: u64,
        min_increment: u64,
        duration_ms: u64,
    ) -> GavelResult<ProductId> {
        let id = ProductId(product);
        let auction = Auction::builder_with_clock(self.clock.clone())
            .id(id)
            .seller(BidderId(9_000 + product))
            .item(format!("Lot #{product}"))
            .starting_bid(starting_bid)
            .min_increment(min_increment)
            .duration_ms(duration_ms)
            .build()
            .map_err(gavel::AuctionError::Validation)?;
        self.house.list_auction(auction).await?;
        Ok(id)
    }

    /// Place a bid as the given bidder number.
    pub async fn bid(&self, product: ProductId, bidder: u64, amount: u64) -> GavelResult<u64> {
        self.house
            .place_bid(product, BidderId(bidder), amount)
            .await
            .map(|bid| bid.amount)
    }

    /// Jump the clock past the auction's close and run one sweep.
    pub async fn close_and_sweep(&self, product: ProductId) -> usize {
        let auction = self.house.auction(product).await.expect("auction listed");
        if self.clock.get() <= auction.closes_at {
            self.clock.set(auction.closes_at);
        }
        self.house.sweep_once().await
    }

    /// The order materialized for a settled auction's winner.
    pub async fn winning_order(&self, product: ProductId) -> Option<Order> {
        let settlement = self.house.settle(product).await.ok()?;
        match settlement.order {
            Some(id) => self.house.order(id).await,
            None => None,
        }
    }

    /// Fetch an order, panicking when it is missing.
    pub async fn order(&self, id: OrderId) -> Order {
        self.house.order(id).await.expect("order exists")
    }
}

impl Default for EngineHarness {
    fn default() -> Self {
        Self::new()
    }
}
