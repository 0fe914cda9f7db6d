//! In-memory registry of auctions and their stored status.
//!
//! The mutating methods are deliberately narrow: `record_high_bid` is only
//! called by admission under its per-auction gate, `close`/`cancel` are the
//! compare-and-set lifecycle transitions, and `assign_winner` is only
//! called by settlement. Everything else reads snapshots.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::RwLock;
use tracing::info;

use crate::error::{AuctionError, GavelResult};
use crate::marketplace::{Auction, AuctionStatus, BidderId, ProductId};

type AuctionMap = Arc<RwLock<HashMap<ProductId, Auction>>>;

/// Registry of every known auction.
#[derive(Clone)]
pub struct AuctionStore {
    auctions: AuctionMap,
}

impl AuctionStore {
    pub fn new() -> Self {
        Self {
            auctions: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Register a new auction. Product ids are unique.
    pub async fn insert(&self, auction: Auction) -> GavelResult<()> {
        let mut auctions = self.auctions.write().await;
        if auctions.contains_key(&auction.id) {
            return Err(AuctionError::Validation(format!(
                "auction already listed for {}",
                auction.id
            )));
        }
        info!("Listed auction '{}' as {}", auction.item, auction.id);
        auctions.insert(auction.id, auction);
        Ok(())
    }

    /// Snapshot of one auction.
    pub async fn get(&self, product: ProductId) -> Option<Auction> {
        self.auctions.read().await.get(&product).cloned()
    }

    /// Products whose bidding window has passed but whose stored status has
    /// not been flipped yet.
    pub async fn due_for_close(&self, now: u64) -> Vec<ProductId> {
        let auctions = self.auctions.read().await;
        auctions
            .values()
            .filter(|a| {
                matches!(
                    a.status,
                    AuctionStatus::Scheduled | AuctionStatus::Active
                ) && a.closes_at <= now
            })
            .map(|a| a.id)
            .collect()
    }

    /// Compare-and-set the stored status to `Ended`. Returns true only for
    /// the caller that performed the flip, so overlapping sweeps (or a
    /// sweep racing an admin cancel) settle an auction at most once.
    pub async fn close(&self, product: ProductId) -> bool {
        let mut auctions = self.auctions.write().await;
        match auctions.get_mut(&product) {
            Some(auction)
                if matches!(
                    auction.status,
                    AuctionStatus::Scheduled | AuctionStatus::Active
                ) =>
            {
                auction.status = AuctionStatus::Ended;
                true
            }
            _ => false,
        }
    }

    /// Administrative early-cancel. Terminal; an ended auction can no
    /// longer be cancelled, and cancelling twice is a no-op.
    pub async fn cancel(&self, product: ProductId) -> GavelResult<bool> {
        let mut auctions = self.auctions.write().await;
        let auction = auctions
            .get_mut(&product)
            .ok_or_else(|| AuctionError::NotFound(format!("no auction for {product}")))?;
        match auction.status {
            AuctionStatus::Ended => Err(AuctionError::InvalidState(
                "auction already ended".to_string(),
            )),
            AuctionStatus::Cancelled => Ok(false),
            _ => {
                auction.status = AuctionStatus::Cancelled;
                info!("Auction {} cancelled", product);
                Ok(true)
            }
        }
    }

    /// Record a newly committed highest bid. Monotonic: the stored amount
    /// never decreases.
    pub(crate) async fn record_high_bid(
        &self,
        product: ProductId,
        amount: u64,
    ) -> GavelResult<()> {
        let mut auctions = self.auctions.write().await;
        let auction = auctions
            .get_mut(&product)
            .ok_or_else(|| AuctionError::NotFound(format!("no auction for {product}")))?;
        let current = auction.leading_amount();
        auction.current_bid = Some(current.max(amount));
        Ok(())
    }

    /// Record the settlement outcome. Called exactly once per auction.
    pub(crate) async fn assign_winner(
        &self,
        product: ProductId,
        winner: Option<BidderId>,
        settled_at: u64,
    ) -> GavelResult<()> {
        let mut auctions = self.auctions.write().await;
        let auction = auctions
            .get_mut(&product)
            .ok_or_else(|| AuctionError::NotFound(format!("no auction for {product}")))?;
        auction.winner = winner;
        auction.settled_at = Some(settled_at);
        Ok(())
    }
}

impl Default for AuctionStore {
    fn default() -> Self {
        Self::new()
    }
}
