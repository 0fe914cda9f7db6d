//! The auction engine: admission, lifecycle, settlement, payments, fanout.
//!
//! [`AuctionHouse`] bundles the stores and the per-concern components
//! behind one handle. The collaborator surface is three interfaces: the
//! bid-submission call, the read path (`highest_bid` / `bid_history`), and
//! the per-room event stream (`subscribe`).

pub mod admission;
pub mod broadcast;
pub mod events;
pub mod ledger;
pub mod orders;
pub mod payment;
pub mod settlement;
pub mod store;
pub mod sweeper;

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::broadcast::Receiver;
use tokio::sync::RwLock;

use crate::error::GavelResult;
use crate::marketplace::{
    Auction, Bid, BidderId, Order, OrderId, OrderLine, PaymentAttempt, PaymentFailure,
    PaymentMethod, ProductId,
};
use crate::traits::{Clock, GatewayOrder, PaymentGateway};

pub use admission::{AdmissionPolicy, BidAdmission};
pub use broadcast::Broadcaster;
pub use events::{Event, OrderProgress, Room};
pub use ledger::BidLedger;
pub use orders::OrderStore;
pub use payment::{PaymentReconciler, VerifiedPayment};
pub use settlement::SettlementResult;
pub use store::AuctionStore;

/// One running auction engine instance.
pub struct AuctionHouse<C: Clock + Clone, G: PaymentGateway> {
    clock: C,
    store: AuctionStore,
    ledger: BidLedger,
    orders: OrderStore,
    broadcaster: Arc<Broadcaster>,
    admission: BidAdmission<C>,
    payments: PaymentReconciler<C, G>,
    settlements: Arc<RwLock<HashMap<ProductId, SettlementResult>>>,
}

impl<C: Clock + Clone, G: PaymentGateway> AuctionHouse<C, G> {
    /// Wire up a new engine instance.
    pub fn new(clock: C, gateway: G, key_secret: impl Into<String>, policy: AdmissionPolicy) -> Self {
        let store = AuctionStore::new();
        let ledger = BidLedger::new();
        let orders = OrderStore::new();
        let broadcaster = Arc::new(Broadcaster::new());

        let admission = BidAdmission::new(
            store.clone(),
            ledger.clone(),
            broadcaster.clone(),
            clock.clone(),
            policy,
        );
        let payments = PaymentReconciler::new(
            orders.clone(),
            broadcaster.clone(),
            gateway,
            clock.clone(),
            key_secret,
        );

        Self {
            clock,
            store,
            ledger,
            orders,
            broadcaster,
            admission,
            payments,
            settlements: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Register a new auction listing.
    pub async fn list_auction(&self, auction: Auction) -> GavelResult<()> {
        self.store.insert(auction).await
    }

    /// Snapshot of one auction.
    pub async fn auction(&self, product: ProductId) -> Option<Auction> {
        self.store.get(product).await
    }

    /// Submit a bid attempt.
    pub async fn place_bid(
        &self,
        product: ProductId,
        bidder: BidderId,
        amount: u64,
    ) -> GavelResult<Bid> {
        self.admission.place_bid(product, bidder, amount).await
    }

    /// The currently winning bid, if any.
    pub async fn highest_bid(&self, product: ProductId) -> Option<Bid> {
        self.ledger.highest(product).await
    }

    /// Bid history, newest first.
    pub async fn bid_history(&self, product: ProductId) -> Vec<Bid> {
        self.ledger.history(product).await
    }

    /// Join a room's event stream.
    pub fn subscribe(&self, room: Room) -> Receiver<Event> {
        self.broadcaster.subscribe(room)
    }

    /// Snapshot of one order.
    pub async fn order(&self, order: OrderId) -> Option<Order> {
        self.orders.get(order).await
    }

    /// Place an order directly, e.g. for fixed-price purchases. Auction
    /// wins never come through here; settlement materializes those itself.
    pub async fn place_order(
        &self,
        buyer: BidderId,
        lines: Vec<OrderLine>,
        method: PaymentMethod,
    ) -> GavelResult<Order> {
        let order = self
            .orders
            .create(buyer, lines, method, self.clock.now_millis())
            .await?;
        self.broadcaster.publish(
            Room::Order(order.id),
            Event::OrderUpdate {
                order_id: order.id,
                status: OrderProgress::Placed,
            },
        );
        Ok(order)
    }

    /// Register an order with the payment gateway.
    pub async fn create_payment_order(&self, order: OrderId) -> GavelResult<GatewayOrder> {
        self.payments.create_gateway_order(order).await
    }

    /// Verify and apply a gateway payment callback.
    pub async fn verify_payment(
        &self,
        order: OrderId,
        gateway_order_id: &str,
        gateway_payment_id: &str,
        gateway_signature: &str,
    ) -> GavelResult<VerifiedPayment> {
        self.payments
            .verify(order, gateway_order_id, gateway_payment_id, gateway_signature)
            .await
    }

    /// Journal a failed gateway callback.
    pub async fn record_payment_failure(
        &self,
        order: OrderId,
        gateway_order_id: &str,
        gateway_payment_id: &str,
        failure: PaymentFailure,
    ) -> GavelResult<()> {
        self.payments
            .record_failure(order, gateway_order_id, gateway_payment_id, failure)
            .await
    }

    /// Switch a pending order to cash-on-delivery.
    pub async fn mark_cash_on_delivery(&self, order: OrderId) -> GavelResult<()> {
        self.payments.mark_cash_on_delivery(order).await
    }

    /// Recorded verification attempts for one order.
    pub async fn payment_attempts(&self, order: OrderId) -> Vec<PaymentAttempt> {
        self.orders.attempts_for(order).await
    }

    pub(crate) fn clock(&self) -> &C {
        &self.clock
    }

    pub(crate) fn store(&self) -> &AuctionStore {
        &self.store
    }

    pub(crate) fn ledger(&self) -> &BidLedger {
        &self.ledger
    }

    pub(crate) fn orders(&self) -> &OrderStore {
        &self.orders
    }

    pub(crate) fn broadcaster(&self) -> &Broadcaster {
        &self.broadcaster
    }

    pub(crate) fn settlements(&self) -> &RwLock<HashMap<ProductId, SettlementResult>> {
        &self.settlements
    }
}
