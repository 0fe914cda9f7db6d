//! In-memory order store and payment-attempt journal.
//!
//! Only the payment reconciler transitions `payment_status` away from
//! `Pending`, and only through the compare-and-set in [`OrderStore::mark_paid`].
//! The attempt journal is append-only.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use tokio::sync::RwLock;
use tracing::info;

use crate::error::{AuctionError, GavelResult};
use crate::marketplace::{
    BidderId, Order, OrderId, OrderLine, PaymentAttempt, PaymentMethod, PaymentStatus,
};

/// Store of payable orders plus the diagnostic journal of gateway callbacks.
#[derive(Clone)]
pub struct OrderStore {
    orders: Arc<RwLock<HashMap<OrderId, Order>>>,
    attempts: Arc<RwLock<Vec<PaymentAttempt>>>,
    next_id: Arc<AtomicU64>,
}

impl OrderStore {
    pub fn new() -> Self {
        Self {
            orders: Arc::new(RwLock::new(HashMap::new())),
            attempts: Arc::new(RwLock::new(Vec::new())),
            next_id: Arc::new(AtomicU64::new(1)),
        }
    }

    /// Create a pending order from its line items.
    pub async fn create(
        &self,
        buyer: BidderId,
        lines: Vec<OrderLine>,
        method: PaymentMethod,
        now: u64,
    ) -> GavelResult<Order> {
        if lines.is_empty() {
            return Err(AuctionError::Validation(
                "an order needs at least one line".to_string(),
            ));
        }
        let id = OrderId(self.next_id.fetch_add(1, Ordering::SeqCst));
        let order = Order {
            id,
            buyer,
            total_amount: Order::total_of(&lines),
            lines,
            payment_method: method,
            payment_status: PaymentStatus::Pending,
            gateway_order_id: None,
            created_at: now,
        };
        info!(
            "Created {} for {} totalling {}",
            id, buyer, order.total_amount
        );
        self.orders.write().await.insert(id, order.clone());
        Ok(order)
    }

    /// Snapshot of one order.
    pub async fn get(&self, id: OrderId) -> Option<Order> {
        self.orders.read().await.get(&id).cloned()
    }

    /// Attach the gateway-side order handle once checkout starts.
    pub(crate) async fn set_gateway_order(
        &self,
        id: OrderId,
        gateway_order_id: &str,
    ) -> GavelResult<()> {
        let mut orders = self.orders.write().await;
        let order = orders
            .get_mut(&id)
            .ok_or_else(|| AuctionError::NotFound(format!("no order {id}")))?;
        order.gateway_order_id = Some(gateway_order_id.to_string());
        Ok(())
    }

    /// Compare-and-set `Pending -> Paid`. Returns true only for the caller
    /// that performed the transition; an already-paid order returns false.
    pub(crate) async fn mark_paid(&self, id: OrderId) -> GavelResult<bool> {
        let mut orders = self.orders.write().await;
        let order = orders
            .get_mut(&id)
            .ok_or_else(|| AuctionError::NotFound(format!("no order {id}")))?;
        match order.payment_status {
            PaymentStatus::Pending => {
                order.payment_status = PaymentStatus::Paid;
                info!("{} marked paid", id);
                Ok(true)
            }
            PaymentStatus::Paid => Ok(false),
            PaymentStatus::Failed => Err(AuctionError::InvalidState(
                "order payment is terminally failed".to_string(),
            )),
        }
    }

    /// Switch a pending order to cash-on-delivery.
    pub(crate) async fn set_cash_on_delivery(&self, id: OrderId) -> GavelResult<()> {
        let mut orders = self.orders.write().await;
        let order = orders
            .get_mut(&id)
            .ok_or_else(|| AuctionError::NotFound(format!("no order {id}")))?;
        if order.payment_status != PaymentStatus::Pending {
            return Err(AuctionError::InvalidState(
                "only a pending order can switch to cash on delivery".to_string(),
            ));
        }
        order.payment_method = PaymentMethod::CashOnDelivery;
        Ok(())
    }

    /// Append a verification attempt to the journal.
    pub(crate) async fn record_attempt(&self, attempt: PaymentAttempt) {
        self.attempts.write().await.push(attempt);
    }

    /// All recorded attempts for one order, oldest first.
    pub async fn attempts_for(&self, id: OrderId) -> Vec<PaymentAttempt> {
        self.attempts
            .read()
            .await
            .iter()
            .filter(|a| a.order == id)
            .cloned()
            .collect()
    }
}

impl Default for OrderStore {
    fn default() -> Self {
        Self::new()
    }
}
