//! Gateway payment verification and reconciliation.
//!
//! Verification is single-writer per order, so the `Pending -> Paid`
//! transition happens at most once even when the gateway delivers its
//! callback twice. Failures are journaled without ever touching the order's
//! payment status.

use std::collections::HashMap;
use std::sync::Arc;

use hmac::{Hmac, Mac};
use sha2::Sha256;
use tokio::sync::{Mutex, RwLock};
use tracing::{info, warn};

use crate::config::{MOCK_GATEWAY_ORDER_PREFIX, MOCK_GATEWAY_PAYMENT_PREFIX};
use crate::engine::broadcast::Broadcaster;
use crate::engine::events::{Event, OrderProgress, Room};
use crate::engine::orders::OrderStore;
use crate::error::{AuctionError, GavelResult};
use crate::marketplace::{
    AttemptOutcome, Order, OrderId, PaymentAttempt, PaymentFailure, PaymentStatus,
};
use crate::traits::{Clock, GatewayOrder, PaymentGateway};

type HmacSha256 = Hmac<Sha256>;

/// Successful, applied verification of one gateway payment.
#[derive(Debug, Clone)]
pub struct VerifiedPayment {
    pub order: OrderId,
    pub gateway_payment_id: String,
    pub amount: u64,
    pub verified_at: u64,
}

type GateMap = Mutex<HashMap<OrderId, Arc<Mutex<()>>>>;

/// Applies gateway callbacks to orders exactly once.
pub struct PaymentReconciler<C: Clock, G: PaymentGateway> {
    orders: OrderStore,
    broadcaster: Arc<Broadcaster>,
    gateway: G,
    clock: C,
    key_secret: String,
    verified: RwLock<HashMap<OrderId, VerifiedPayment>>,
    gates: GateMap,
}

impl<C: Clock, G: PaymentGateway> PaymentReconciler<C, G> {
    pub fn new(
        orders: OrderStore,
        broadcaster: Arc<Broadcaster>,
        gateway: G,
        clock: C,
        key_secret: impl Into<String>,
    ) -> Self {
        Self {
            orders,
            broadcaster,
            gateway,
            clock,
            key_secret: key_secret.into(),
            verified: RwLock::new(HashMap::new()),
            gates: Mutex::new(HashMap::new()),
        }
    }

    /// The single-writer gate for one order.
    async fn gate(&self, order: OrderId) -> Arc<Mutex<()>> {
        let mut gates = self.gates.lock().await;
        gates.entry(order).or_default().clone()
    }

    /// Register a pending order with the gateway and remember the handle.
    /// Gateway outages surface as retryable errors with no state mutated.
    pub async fn create_gateway_order(&self, order_id: OrderId) -> GavelResult<GatewayOrder> {
        let order = self.require_order(order_id).await?;
        if order.payment_status != PaymentStatus::Pending {
            return Err(AuctionError::InvalidState(
                "order is no longer payable".to_string(),
            ));
        }

        let handle = self
            .gateway
            .create_order(order.total_amount, &order_id.to_string())
            .await?;
        self.orders
            .set_gateway_order(order_id, &handle.gateway_order_id)
            .await?;
        info!(
            "Gateway order {} created for {} ({} {})",
            handle.gateway_order_id, order_id, handle.amount, handle.currency
        );
        Ok(handle)
    }

    /// Signature the gateway is expected to send for this order/payment
    /// pair: hex HMAC-SHA256 over `"{gateway_order_id}|{gateway_payment_id}"`.
    pub fn expected_signature(
        &self,
        gateway_order_id: &str,
        gateway_payment_id: &str,
    ) -> GavelResult<String> {
        let mut mac = HmacSha256::new_from_slice(self.key_secret.as_bytes())
            .map_err(|e| AuctionError::InvalidState(format!("unusable gateway secret: {e}")))?;
        mac.update(format!("{gateway_order_id}|{gateway_payment_id}").as_bytes());
        Ok(hex::encode(mac.finalize().into_bytes()))
    }

    /// Verify a gateway callback and apply it to the order exactly once.
    ///
    /// Re-verifying an already-paid order returns the originally applied
    /// result without touching state.
    pub async fn verify(
        &self,
        order_id: OrderId,
        gateway_order_id: &str,
        gateway_payment_id: &str,
        gateway_signature: &str,
    ) -> GavelResult<VerifiedPayment> {
        let gate = self.gate(order_id).await;
        let _serial = gate.lock().await;

        if let Some(prior) = self.verified.read().await.get(&order_id) {
            info!(
                "{} already settled by payment {}, returning prior result",
                order_id, prior.gateway_payment_id
            );
            return Ok(prior.clone());
        }

        let order = self.require_order(order_id).await?;

        if self.gateway.is_mock() {
            // Sandbox-only path: synthetic identifiers, no signature to
            // check. Unreachable unless the engine was wired with a mock
            // gateway, which production configuration never does.
            if !gateway_order_id.starts_with(MOCK_GATEWAY_ORDER_PREFIX)
                || !gateway_payment_id.starts_with(MOCK_GATEWAY_PAYMENT_PREFIX)
            {
                return Err(AuctionError::Validation(
                    "sandbox gateway requires synthetic identifiers".to_string(),
                ));
            }
            warn!(
                "Accepting sandbox payment {} for {} without signature verification",
                gateway_payment_id, order_id
            );
        } else {
            match order.gateway_order_id.as_deref() {
                Some(expected) if expected == gateway_order_id => {}
                Some(_) => {
                    return Err(AuctionError::Validation(
                        "callback names a different gateway order".to_string(),
                    ))
                }
                None => {
                    return Err(AuctionError::Validation(
                        "order has no gateway order to settle".to_string(),
                    ))
                }
            }

            let mut mac = HmacSha256::new_from_slice(self.key_secret.as_bytes())
                .map_err(|e| AuctionError::InvalidState(format!("unusable gateway secret: {e}")))?;
            mac.update(format!("{gateway_order_id}|{gateway_payment_id}").as_bytes());
            let provided = hex::decode(gateway_signature)
                .map_err(|_| AuctionError::SignatureInvalid)?;
            if mac.verify_slice(&provided).is_err() {
                warn!(
                    "Signature mismatch for {} (payment {})",
                    order_id, gateway_payment_id
                );
                return Err(AuctionError::SignatureInvalid);
            }
        }

        self.orders.mark_paid(order_id).await?;
        let now = self.clock.now_millis();
        let result = VerifiedPayment {
            order: order_id,
            gateway_payment_id: gateway_payment_id.to_string(),
            amount: order.total_amount,
            verified_at: now,
        };
        self.verified.write().await.insert(order_id, result.clone());
        self.orders
            .record_attempt(PaymentAttempt {
                order: order_id,
                gateway_order_id: gateway_order_id.to_string(),
                gateway_payment_id: gateway_payment_id.to_string(),
                outcome: AttemptOutcome::Verified,
                failure: None,
                recorded_at: now,
            })
            .await;

        info!("Payment {} applied to {}", gateway_payment_id, order_id);

        let room = Room::Order(order_id);
        self.broadcaster.publish(
            room,
            Event::PaymentUpdate {
                order_id,
                payment_status: PaymentStatus::Paid,
            },
        );
        self.broadcaster.publish(
            room,
            Event::OrderUpdate {
                order_id,
                status: OrderProgress::Paid,
            },
        );
        self.broadcaster.publish(
            room,
            Event::Notification {
                message: format!("Payment received for {order_id}"),
            },
        );

        Ok(result)
    }

    /// Journal a failed gateway callback. Purely observational: the order's
    /// payment status is left untouched and retries remain possible.
    pub async fn record_failure(
        &self,
        order_id: OrderId,
        gateway_order_id: &str,
        gateway_payment_id: &str,
        failure: PaymentFailure,
    ) -> GavelResult<()> {
        self.require_order(order_id).await?;

        let message = if failure.description.is_empty() {
            format!("Payment for {order_id} failed")
        } else {
            format!("Payment for {order_id} failed: {}", failure.description)
        };

        self.orders
            .record_attempt(PaymentAttempt {
                order: order_id,
                gateway_order_id: gateway_order_id.to_string(),
                gateway_payment_id: gateway_payment_id.to_string(),
                outcome: AttemptOutcome::Failed,
                failure: Some(failure),
                recorded_at: self.clock.now_millis(),
            })
            .await;

        warn!("Recorded failed payment attempt for {}", order_id);
        self.broadcaster
            .publish(Room::Order(order_id), Event::Notification { message });
        Ok(())
    }

    /// Switch a pending order to cash-on-delivery, bypassing the gateway.
    pub async fn mark_cash_on_delivery(&self, order_id: OrderId) -> GavelResult<()> {
        let gate = self.gate(order_id).await;
        let _serial = gate.lock().await;

        self.orders.set_cash_on_delivery(order_id).await?;
        info!("{} will be paid on delivery", order_id);
        self.broadcaster.publish(
            Room::Order(order_id),
            Event::OrderUpdate {
                order_id,
                status: OrderProgress::PayOnDelivery,
            },
        );
        Ok(())
    }

    async fn require_order(&self, order_id: OrderId) -> GavelResult<Order> {
        self.orders
            .get(order_id)
            .await
            .ok_or_else(|| AuctionError::NotFound(format!("no order {order_id}")))
    }
}
