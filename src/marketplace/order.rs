use serde::{Deserialize, Serialize};

use crate::error::GavelResult;
use crate::marketplace::ids::{BidderId, OrderId, ProductId};

/// How the product on an order line was sold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SaleMode {
    /// Bought at the listed price.
    FixedPrice,
    /// Won in a timed auction; the unit price is the final bid.
    Auction,
}

/// How the buyer settles the order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PaymentMethod {
    Online,
    CashOnDelivery,
}

/// Payment state of an order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PaymentStatus {
    Pending,
    Paid,
    Failed,
}

/// One product on an order, with the sale terms frozen at order time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderLine {
    pub product: ProductId,
    pub quantity: u32,
    /// Unit price in atomic units at the moment the order was placed.
    pub unit_price: u64,
    pub mode: SaleMode,
}

impl OrderLine {
    /// Line subtotal in atomic units.
    pub fn subtotal(&self) -> u64 {
        self.unit_price.saturating_mul(u64::from(self.quantity))
    }
}

/// A payable order. Auction wins materialize as a single-quantity line
/// whose unit price is the final bid.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Order {
    pub id: OrderId,
    pub buyer: BidderId,
    pub lines: Vec<OrderLine>,
    pub payment_method: PaymentMethod,
    pub payment_status: PaymentStatus,
    pub total_amount: u64,
    /// Gateway-side order handle, set once the buyer starts online checkout.
    pub gateway_order_id: Option<String>,
    pub created_at: u64,
}

impl Order {
    /// Sum of the line subtotals.
    pub fn total_of(lines: &[OrderLine]) -> u64 {
        lines.iter().map(OrderLine::subtotal).sum()
    }

    /// Serialize the order to CBOR bytes.
    pub fn to_cbor(&self) -> GavelResult<Vec<u8>> {
        crate::util::to_cbor(self)
    }

    /// Deserialize an order from CBOR bytes.
    pub fn from_cbor(data: &[u8]) -> GavelResult<Self> {
        crate::util::cbor_from_limited_reader(data, crate::config::MAX_RECORD_SIZE)
    }
}

/// Outcome of a recorded verification attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum AttemptOutcome {
    Verified,
    Failed,
}

/// Structured failure payload forwarded by the gateway.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentFailure {
    pub code: String,
    pub description: String,
    pub reason: String,
}

/// Diagnostic record of one gateway callback, successful or not.
/// Append-only; failures never touch the order's payment status.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentAttempt {
    pub order: OrderId,
    pub gateway_order_id: String,
    pub gateway_payment_id: String,
    pub outcome: AttemptOutcome,
    pub failure: Option<PaymentFailure>,
    pub recorded_at: u64,
}
