use serde::{Deserialize, Serialize};

use crate::config::now_millis;
use crate::error::GavelResult;
use crate::marketplace::ids::{BidderId, ProductId};
use crate::traits::{Clock, SystemClock};

/// Stored status of a timed auction.
///
/// `Scheduled`/`Active` only record which side of the opening instant the
/// auction was on when written; the authoritative live state is always
/// computed from the clock via [`Auction::phase_at`]. `Ended` and
/// `Cancelled` are terminal and sticky.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AuctionStatus {
    /// Opening instant is still in the future.
    Scheduled,
    /// Auction window is (or was) open for bids.
    Active,
    /// Auction closed; winner determination may already have run.
    Ended,
    /// Auction was cancelled by the seller or an operator.
    Cancelled,
}

/// Effective lifecycle state of an auction at a given instant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Phase {
    Scheduled,
    Active,
    Ended,
}

/// A timed auction embedded in a product listing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Auction {
    /// Product this auction sells.
    pub id: ProductId,

    /// The seller listing the product.
    pub seller: BidderId,

    /// Display title of the item (publicly visible).
    pub item: String,

    /// Price floor before any bid has been accepted, in atomic units.
    pub starting_bid: u64,

    /// Minimum amount each accepted bid must add on top of the leader.
    pub min_increment: u64,

    /// Unix timestamp in milliseconds when bidding opens.
    pub opens_at: u64,

    /// Unix timestamp in milliseconds when bidding closes.
    pub closes_at: u64,

    /// Unix timestamp in milliseconds when the listing was created.
    pub created_at: u64,

    /// Stored status; `Ended`/`Cancelled` never revert.
    pub status: AuctionStatus,

    /// Highest accepted bid so far. `None` until the first bid commits;
    /// non-decreasing afterwards.
    pub current_bid: Option<u64>,

    /// Winning bidder, assigned exactly once at settlement.
    pub winner: Option<BidderId>,

    /// Instant the auction was settled, if it has been.
    pub settled_at: Option<u64>,
}

impl Auction {
    /// Create a new auction builder.
    pub const fn builder() -> AuctionBuilder<SystemClock> {
        AuctionBuilder::new(SystemClock::new())
    }

    /// Create a new auction builder with a custom clock.
    pub const fn builder_with_clock<C: Clock>(clock: C) -> AuctionBuilder<C> {
        AuctionBuilder::new(clock)
    }

    /// Compute the effective lifecycle state at a specific instant.
    ///
    /// A stored `Ended` or `Cancelled` short-circuits to `Ended` even when
    /// the clock math would otherwise say the window is open.
    pub fn phase_at(&self, now: u64) -> Phase {
        match self.status {
            AuctionStatus::Ended | AuctionStatus::Cancelled => Phase::Ended,
            AuctionStatus::Scheduled | AuctionStatus::Active => {
                if now < self.opens_at {
                    Phase::Scheduled
                } else if now < self.closes_at {
                    Phase::Active
                } else {
                    Phase::Ended
                }
            }
        }
    }

    /// Check if bids are admissible at a specific instant.
    pub fn is_open_at(&self, now: u64) -> bool {
        self.phase_at(now) == Phase::Active
    }

    /// Check if bids are admissible right now.
    pub fn is_open(&self) -> bool {
        self.is_open_at(now_millis())
    }

    /// Get milliseconds remaining until close (0 once closed or cancelled).
    pub fn time_remaining_at(&self, now: u64) -> u64 {
        match self.status {
            AuctionStatus::Ended | AuctionStatus::Cancelled => 0,
            _ => self.closes_at.saturating_sub(now),
        }
    }

    /// The amount currently leading the auction: the highest accepted bid,
    /// or the starting price when no bid has been accepted yet.
    pub fn leading_amount(&self) -> u64 {
        self.current_bid.unwrap_or(self.starting_bid)
    }

    /// The lowest amount the next bid must reach to be admissible.
    pub fn next_floor(&self) -> u64 {
        self.leading_amount().saturating_add(self.min_increment)
    }

    /// Serialize the auction to CBOR bytes.
    pub fn to_cbor(&self) -> GavelResult<Vec<u8>> {
        crate::util::to_cbor(self)
    }

    /// Deserialize an auction from CBOR bytes.
    pub fn from_cbor(data: &[u8]) -> GavelResult<Self> {
        crate::util::cbor_from_limited_reader(data, crate::config::MAX_RECORD_SIZE)
    }
}

/// Builder for creating new auctions.
pub struct AuctionBuilder<C: Clock> {
    clock: C,
    id: Option<ProductId>,
    seller: Option<BidderId>,
    item: Option<String>,
    starting_bid: Option<u64>,
    min_increment: Option<u64>,
    opens_at: Option<u64>,
    duration_ms: Option<u64>,
}

impl<C: Clock> AuctionBuilder<C> {
    /// Create a new builder with a clock.
    pub const fn new(clock: C) -> Self {
        Self {
            clock,
            id: None,
            seller: None,
            item: None,
            starting_bid: None,
            min_increment: None,
            opens_at: None,
            duration_ms: None,
        }
    }

    #[must_use]
    pub const fn id(mut self, id: ProductId) -> Self {
        self.id = Some(id);
        self
    }

    #[must_use]
    pub const fn seller(mut self, seller: BidderId) -> Self {
        self.seller = Some(seller);
        self
    }

    #[must_use]
    pub fn item(mut self, item: impl Into<String>) -> Self {
        self.item = Some(item.into());
        self
    }

    #[must_use]
    pub const fn starting_bid(mut self, amount: u64) -> Self {
        self.starting_bid = Some(amount);
        self
    }

    #[must_use]
    pub const fn min_increment(mut self, amount: u64) -> Self {
        self.min_increment = Some(amount);
        self
    }

    /// Set an explicit opening instant. Defaults to the creation instant.
    #[must_use]
    pub const fn opens_at(mut self, millis: u64) -> Self {
        self.opens_at = Some(millis);
        self
    }

    /// Set how long bidding stays open, measured from the opening instant.
    #[must_use]
    pub const fn duration_ms(mut self, millis: u64) -> Self {
        self.duration_ms = Some(millis);
        self
    }

    /// Build the auction (returns error if required fields are missing).
    pub fn build(self) -> Result<Auction, String> {
        let created_at = self.clock.now_millis();
        let opens_at = self.opens_at.unwrap_or(created_at);
        let duration = self.duration_ms.ok_or("duration_ms is required")?;
        if duration == 0 {
            return Err("duration_ms must be positive".to_string());
        }
        let min_increment = self.min_increment.ok_or("min_increment is required")?;
        if min_increment == 0 {
            return Err("min_increment must be positive".to_string());
        }

        let status = if opens_at > created_at {
            AuctionStatus::Scheduled
        } else {
            AuctionStatus::Active
        };

        Ok(Auction {
            id: self.id.ok_or("id is required")?,
            seller: self.seller.ok_or("seller is required")?,
            item: self.item.ok_or("item is required")?,
            starting_bid: self.starting_bid.ok_or("starting_bid is required")?,
            min_increment,
            opens_at,
            closes_at: opens_at + duration,
            created_at,
            status,
            current_bid: None,
            winner: None,
            settled_at: None,
        })
    }
}
