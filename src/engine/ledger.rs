//! Per-auction append-only ledger of accepted bids.
//!
//! The ledger is the source of truth for the current highest bid and the
//! bid history. Committed bids are never mutated or deleted. Commit
//! instants are assigned here and are strictly increasing per auction, so
//! equal wall-clock reads still produce a total order.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::RwLock;
use tracing::debug;

use crate::error::{AuctionError, GavelResult};
use crate::marketplace::{Bid, BidderId, ProductId};

type BidMap = Arc<RwLock<HashMap<ProductId, Vec<Bid>>>>;

/// Append-only store of accepted bids, keyed by product.
#[derive(Clone)]
pub struct BidLedger {
    bids: BidMap,
}

impl BidLedger {
    pub fn new() -> Self {
        Self {
            bids: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// The currently winning bid: highest amount, earliest commit on a tie.
    /// `None` when nothing has been accepted yet.
    pub async fn highest(&self, product: ProductId) -> Option<Bid> {
        let bids = self.bids.read().await;
        let entries = bids.get(&product)?;
        let mut best: Option<&Bid> = None;
        for bid in entries {
            match best {
                Some(current) if !bid.outranks(current) => {}
                _ => best = Some(bid),
            }
        }
        best.cloned()
    }

    /// Commit a bid. The commit instant is assigned here, clamped to stay
    /// strictly after the previous commit for this auction. Fails with
    /// `Conflict` when a concurrently committed bid already reached or
    /// passed the submitted amount.
    pub async fn append(
        &self,
        product: ProductId,
        bidder: BidderId,
        amount: u64,
        auto: bool,
        now: u64,
    ) -> GavelResult<Bid> {
        let mut bids = self.bids.write().await;
        let entries = bids.entry(product).or_default();

        if let Some(last) = entries.last() {
            if amount <= last.amount {
                debug!(
                    "Rejecting out-of-order commit on {}: {} <= {}",
                    product, amount, last.amount
                );
                return Err(AuctionError::Conflict);
            }
        }

        let placed_at = match entries.last() {
            Some(last) => now.max(last.placed_at + 1),
            None => now,
        };

        let bid = Bid {
            product,
            bidder,
            amount,
            placed_at,
            auto,
        };
        entries.push(bid.clone());
        Ok(bid)
    }

    /// Bid history for a product, newest first. Re-querying an unchanged
    /// ledger returns the same sequence.
    pub async fn history(&self, product: ProductId) -> Vec<Bid> {
        let bids = self.bids.read().await;
        let mut entries = bids.get(&product).cloned().unwrap_or_default();
        entries.reverse();
        entries
    }

    /// Number of accepted bids for a product.
    pub async fn bid_count(&self, product: ProductId) -> usize {
        let bids = self.bids.read().await;
        bids.get(&product).map_or(0, Vec::len)
    }
}

impl Default for BidLedger {
    fn default() -> Self {
        Self::new()
    }
}
