//! Mock payment gateway with controllable failure modes.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::config::{GATEWAY_CURRENCY, MOCK_GATEWAY_ORDER_PREFIX, MOCK_GATEWAY_PAYMENT_PREFIX};
use crate::error::{AuctionError, GavelResult};
use crate::traits::{GatewayOrder, PaymentGateway};

/// Mock gateway issuing deterministic order handles.
///
/// In the default (sandbox) mode the handles use the synthetic-identifier
/// prefixes and `is_mock` is true; [`MockGateway::live`] builds one that
/// behaves like a production gateway for signature-path tests.
#[derive(Clone)]
pub struct MockGateway {
    counter: Arc<AtomicU64>,
    unavailable: Arc<AtomicBool>,
    sandbox: bool,
    issued: Arc<Mutex<Vec<GatewayOrder>>>,
}

impl MockGateway {
    /// Sandbox-mode gateway: synthetic identifiers, no signatures.
    pub fn new() -> Self {
        Self {
            counter: Arc::new(AtomicU64::new(1)),
            unavailable: Arc::new(AtomicBool::new(false)),
            sandbox: true,
            issued: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Gateway that reports itself as non-mock, for exercising the
    /// signature verification path.
    pub fn live() -> Self {
        Self {
            sandbox: false,
            ..Self::new()
        }
    }

    /// Make every subsequent call fail as unavailable.
    pub fn set_unavailable(&self, down: bool) {
        self.unavailable.store(down, Ordering::SeqCst);
    }

    /// All order handles issued so far.
    pub async fn issued_orders(&self) -> Vec<GatewayOrder> {
        self.issued.lock().await.clone()
    }

    /// A synthetic payment identifier the sandbox verification accepts.
    pub fn synthetic_payment_id(n: u64) -> String {
        format!("{MOCK_GATEWAY_PAYMENT_PREFIX}{n}")
    }
}

impl Default for MockGateway {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl PaymentGateway for MockGateway {
    async fn create_order(&self, amount: u64, _receipt: &str) -> GavelResult<GatewayOrder> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(AuctionError::GatewayUnavailable(
                "mock gateway switched off".to_string(),
            ));
        }

        let n = self.counter.fetch_add(1, Ordering::SeqCst);
        let prefix = if self.sandbox {
            MOCK_GATEWAY_ORDER_PREFIX
        } else {
            "order_live_"
        };
        let order = GatewayOrder {
            gateway_order_id: format!("{prefix}{n}"),
            amount,
            currency: GATEWAY_CURRENCY.to_string(),
            is_mock: self.sandbox,
        };
        self.issued.lock().await.push(order.clone());
        Ok(order)
    }

    fn is_mock(&self) -> bool {
        self.sandbox
    }
}
