//! Payment gateway abstraction.
//!
//! The gateway itself (card tokenization, hosted checkout) is an external
//! collaborator. The engine only needs two things from it: creating a
//! gateway-side order handle for a payable amount, and knowing whether the
//! configured gateway is a sandbox that issues synthetic identifiers.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::{AuctionError, GavelResult};

/// Handle returned when an order is registered with the payment gateway.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewayOrder {
    /// Gateway-side order identifier the client hands to the checkout flow.
    pub gateway_order_id: String,

    /// Amount in atomic currency units.
    pub amount: u64,

    /// ISO currency code.
    pub currency: String,

    /// True when this handle came from a sandbox gateway and the usual
    /// signature verification does not apply.
    pub is_mock: bool,
}

/// Trait for the gateway operations the engine depends on.
#[async_trait]
pub trait PaymentGateway: Send + Sync {
    /// Register an order with the gateway and return its handle.
    async fn create_order(&self, amount: u64, receipt: &str) -> GavelResult<GatewayOrder>;

    /// Whether this gateway issues synthetic identifiers that bypass
    /// signature verification. Must never be true in production wiring.
    fn is_mock(&self) -> bool;
}

/// Fallback implementation for deployments with no gateway configured.
///
/// Every order-creation attempt fails as retryable-unavailable, which keeps
/// the cash-on-delivery path usable while online payment stays switched off.
#[derive(Debug, Clone, Copy, Default)]
pub struct OfflineGateway;

impl OfflineGateway {
    pub const fn new() -> Self {
        Self
    }
}

#[async_trait]
impl PaymentGateway for OfflineGateway {
    async fn create_order(&self, _amount: u64, _receipt: &str) -> GavelResult<GatewayOrder> {
        Err(AuctionError::GatewayUnavailable(
            "no payment gateway configured".to_string(),
        ))
    }

    fn is_mock(&self) -> bool {
        false
    }
}
