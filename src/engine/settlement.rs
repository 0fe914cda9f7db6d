//! Winner determination and order materialization for closed auctions,
//! plus administrative early-cancel.

use tracing::info;

use crate::engine::events::{Event, OrderProgress, Room};
use crate::engine::AuctionHouse;
use crate::error::{AuctionError, GavelResult};
use crate::marketplace::{
    AuctionStatus, BidderId, OrderId, OrderLine, PaymentMethod, ProductId, SaleMode,
};
use crate::traits::{Clock, PaymentGateway};

/// Outcome of settling one auction. Stable across repeated `settle` calls.
#[derive(Debug, Clone)]
pub struct SettlementResult {
    pub product: ProductId,
    pub winner: Option<BidderId>,
    pub final_bid: Option<u64>,
    /// Order materialized for the winner, absent when nobody bid.
    pub order: Option<OrderId>,
}

impl<C: Clock + Clone, G: PaymentGateway> AuctionHouse<C, G> {
    /// Settle a closed auction: pick the winner from the ledger, record it,
    /// materialize the payable order, and announce the result.
    ///
    /// Idempotent: settling an auction that already settled returns the
    /// recorded outcome and emits nothing.
    pub async fn settle(&self, product: ProductId) -> GavelResult<SettlementResult> {
        if let Some(prior) = self.settlements().read().await.get(&product) {
            return Ok(prior.clone());
        }

        let auction = self
            .store()
            .get(product)
            .await
            .ok_or_else(|| AuctionError::NotFound(format!("no auction for {product}")))?;
        if auction.status != AuctionStatus::Ended {
            return Err(AuctionError::InvalidState(
                "auction has not closed".to_string(),
            ));
        }

        let mut settlements = self.settlements().write().await;
        // Second check under the write lock: a concurrent settle may have
        // landed between the fast-path read and here.
        if let Some(prior) = settlements.get(&product) {
            return Ok(prior.clone());
        }

        let now = self.clock().now_millis();
        let top = self.ledger().highest(product).await;
        let winner = top.as_ref().map(|b| b.bidder);
        let final_bid = top.as_ref().map(|b| b.amount);
        self.store().assign_winner(product, winner, now).await?;

        let order = match &top {
            Some(winning) => {
                let order = self
                    .orders()
                    .create(
                        winning.bidder,
                        vec![OrderLine {
                            product,
                            quantity: 1,
                            unit_price: winning.amount,
                            mode: SaleMode::Auction,
                        }],
                        PaymentMethod::Online,
                        now,
                    )
                    .await?;
                info!(
                    "Auction {} won by {} at {}, payable as {}",
                    product, winning.bidder, winning.amount, order.id
                );
                self.broadcaster().publish(
                    Room::Order(order.id),
                    Event::OrderUpdate {
                        order_id: order.id,
                        status: OrderProgress::AwaitingPayment,
                    },
                );
                self.broadcaster().publish(
                    Room::Auction(product),
                    Event::Notification {
                        message: format!(
                            "{} won '{}' at {}",
                            winning.bidder, auction.item, winning.amount
                        ),
                    },
                );
                Some(order.id)
            }
            None => {
                info!("Auction {} closed without bids", product);
                None
            }
        };

        self.broadcaster().publish(
            Room::Auction(product),
            Event::AuctionEnded {
                product_id: product,
                winner,
                final_bid,
            },
        );

        let result = SettlementResult {
            product,
            winner,
            final_bid,
            order,
        };
        settlements.insert(product, result.clone());
        Ok(result)
    }

    /// Administrative early-cancel. Terminal, never settles, and announces
    /// the closure to the auction's room.
    pub async fn cancel_auction(&self, product: ProductId) -> GavelResult<()> {
        let flipped = self.store().cancel(product).await?;
        if !flipped {
            // Already cancelled; announcing again would duplicate events.
            return Ok(());
        }

        let room = Room::Auction(product);
        self.broadcaster().publish(
            room,
            Event::AuctionEnded {
                product_id: product,
                winner: None,
                final_bid: None,
            },
        );
        self.broadcaster().publish(
            room,
            Event::Notification {
                message: format!("Auction for {product} was cancelled"),
            },
        );
        Ok(())
    }
}
