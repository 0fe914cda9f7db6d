//! Serialized bid admission.
//!
//! Exactly one bid per auction is admitted at a time: a per-auction async
//! mutex makes "read current highest, validate, commit" atomic with respect
//! to other bidders on the same auction, while different auctions admit
//! fully in parallel. On success the committed bid is handed to the
//! broadcaster before the call returns, so a caller observing success knows
//! the fanout has been enqueued.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::Mutex;
use tracing::{debug, info};

use crate::config::CONFLICT_RETRY_LIMIT;
use crate::engine::broadcast::Broadcaster;
use crate::engine::events::{Event, Room};
use crate::engine::ledger::BidLedger;
use crate::engine::store::AuctionStore;
use crate::error::{AuctionError, GavelResult};
use crate::marketplace::{Bid, BidderId, Phase, ProductId};
use crate::traits::Clock;

/// Tunable admission behavior.
#[derive(Debug, Clone, Copy)]
pub struct AdmissionPolicy {
    /// Reject a bid from whoever already holds the highest bid. When false,
    /// leaders may raise their own bid (e.g. to pre-empt snipers).
    pub reject_self_outbid: bool,

    /// Retry a lost commit race once before surfacing it. When false every
    /// race loss is surfaced to the caller for a manual retry.
    pub retry_on_conflict: bool,
}

impl Default for AdmissionPolicy {
    fn default() -> Self {
        Self {
            reject_self_outbid: true,
            retry_on_conflict: true,
        }
    }
}

type GateMap = Mutex<HashMap<ProductId, Arc<Mutex<()>>>>;

/// Admits or rejects bid attempts against the ledger and the clock.
pub struct BidAdmission<C: Clock> {
    store: AuctionStore,
    ledger: BidLedger,
    broadcaster: Arc<Broadcaster>,
    clock: C,
    policy: AdmissionPolicy,
    gates: GateMap,
}

impl<C: Clock> BidAdmission<C> {
    pub fn new(
        store: AuctionStore,
        ledger: BidLedger,
        broadcaster: Arc<Broadcaster>,
        clock: C,
        policy: AdmissionPolicy,
    ) -> Self {
        Self {
            store,
            ledger,
            broadcaster,
            clock,
            policy,
            gates: Mutex::new(HashMap::new()),
        }
    }

    /// The single-writer gate for one auction.
    async fn gate(&self, product: ProductId) -> Arc<Mutex<()>> {
        let mut gates = self.gates.lock().await;
        gates.entry(product).or_default().clone()
    }

    /// Validate and commit one bid attempt.
    ///
    /// A lost race never silently drops the bid: after the configured retry
    /// it surfaces as `BidTooLow` carrying the up-to-date floor so the
    /// client can bid again.
    pub async fn place_bid(
        &self,
        product: ProductId,
        bidder: BidderId,
        amount: u64,
    ) -> GavelResult<Bid> {
        let gate = self.gate(product).await;
        let _serial = gate.lock().await;

        let mut retries = 0;
        loop {
            match self.try_admit(product, bidder, amount).await {
                Err(AuctionError::Conflict) => {
                    if self.policy.retry_on_conflict && retries < CONFLICT_RETRY_LIMIT {
                        retries += 1;
                        debug!("Bid on {} lost a commit race, revalidating", product);
                        continue;
                    }
                    // Surface with fresh data instead of the internal race error.
                    let floor = self.current_floor(product).await?;
                    return Err(AuctionError::BidTooLow { floor });
                }
                other => return other,
            }
        }
    }

    /// The lowest admissible next amount, computed from the ledger.
    async fn current_floor(&self, product: ProductId) -> GavelResult<u64> {
        let auction = self
            .store
            .get(product)
            .await
            .ok_or_else(|| AuctionError::NotFound(format!("no auction for {product}")))?;
        let base = match self.ledger.highest(product).await {
            Some(top) => top.amount,
            None => auction.starting_bid,
        };
        Ok(base.saturating_add(auction.min_increment))
    }

    async fn try_admit(
        &self,
        product: ProductId,
        bidder: BidderId,
        amount: u64,
    ) -> GavelResult<Bid> {
        let auction = self
            .store
            .get(product)
            .await
            .ok_or_else(|| AuctionError::NotFound(format!("no auction for {product}")))?;

        let now = self.clock.now_millis();
        if auction.phase_at(now) != Phase::Active {
            return Err(AuctionError::NotActive);
        }

        let top = self.ledger.highest(product).await;
        let floor = top
            .as_ref()
            .map_or(auction.starting_bid, |b| b.amount)
            .saturating_add(auction.min_increment);
        if amount < floor {
            return Err(AuctionError::BidTooLow { floor });
        }

        if self.policy.reject_self_outbid {
            if let Some(leader) = top.as_ref() {
                if leader.bidder == bidder {
                    return Err(AuctionError::RedundantBid {
                        current: leader.amount,
                    });
                }
            }
        }

        let bid = self
            .ledger
            .append(product, bidder, amount, false, now)
            .await?;
        self.store.record_high_bid(product, amount).await?;

        info!(
            "Accepted bid of {} from {} on {} (floor was {})",
            amount, bidder, product, floor
        );

        // Enqueue the fanout before returning success to the caller.
        let room = Room::Auction(product);
        self.broadcaster.publish(
            room,
            Event::BidUpdate {
                product_id: product,
                current_bid: amount,
                bidder,
            },
        );
        if let Some(previous) = top {
            if previous.bidder != bidder {
                self.broadcaster.publish(
                    room,
                    Event::Notification {
                        message: format!(
                            "{} has been outbid on '{}': the price is now {}",
                            previous.bidder, auction.item, amount
                        ),
                    },
                );
            }
        }

        Ok(bid)
    }
}
