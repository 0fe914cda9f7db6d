//! Background lifecycle sweep.
//!
//! Scheduled-to-active transitions are lazy (computed on read). Closing is
//! not: winner assignment and the ended broadcast must happen exactly once,
//! so a recurring sweep flips due auctions via the store's compare-and-set
//! and settles whichever ones it won the flip for. Overlapping sweeps are
//! safe: the flip admits one winner per auction.

use std::sync::Arc;

use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};

use crate::config::SWEEP_INTERVAL_SECS;
use crate::engine::AuctionHouse;
use crate::traits::{Clock, PaymentGateway};

impl<C, G> AuctionHouse<C, G>
where
    C: Clock + Clone + 'static,
    G: PaymentGateway + 'static,
{
    /// Run one sweep: close and settle every auction whose window has
    /// passed. Returns how many auctions this call settled.
    pub async fn sweep_once(&self) -> usize {
        let now = self.clock().now_millis();
        let due = self.store().due_for_close(now).await;
        let mut settled = 0;

        for product in due {
            if !self.store().close(product).await {
                // Another sweep or an admin cancel beat us to the flip.
                debug!("Skipping {}: already transitioned", product);
                continue;
            }
            info!("Auction {} reached its deadline", product);
            match self.settle(product).await {
                Ok(result) => {
                    settled += 1;
                    debug!(
                        "Settled {} (winner: {:?})",
                        product, result.winner
                    );
                }
                Err(e) => {
                    // Scoped to this auction; the sweep moves on.
                    error!("Failed to settle {}: {}", product, e);
                }
            }
        }
        settled
    }

    /// Start the recurring sweep task.
    pub fn start_sweeper(self: Arc<Self>, token: CancellationToken) -> JoinHandle<()> {
        info!("Starting auction lifecycle sweeper");
        tokio::spawn(async move {
            loop {
                tokio::select! {
                    () = token.cancelled() => {
                        info!("Lifecycle sweeper shutting down");
                        break;
                    }
                    () = tokio::time::sleep(std::time::Duration::from_secs(SWEEP_INTERVAL_SECS)) => {}
                }
                self.sweep_once().await;
            }
        })
    }
}
