use serde::{Deserialize, Serialize};

use crate::error::GavelResult;
use crate::marketplace::ids::{BidderId, ProductId};

/// An accepted bid on a timed auction. Immutable once committed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Bid {
    /// Product the bid targets.
    pub product: ProductId,

    /// Who placed the bid.
    pub bidder: BidderId,

    /// Bid amount in atomic units.
    pub amount: u64,

    /// Commit instant assigned by the ledger, in Unix milliseconds.
    /// Strictly increasing across the bids of one auction.
    pub placed_at: u64,

    /// True when an auto-bidder placed this on the bidder's behalf.
    pub auto: bool,
}

impl Bid {
    /// Whether this bid ranks above `other` for winner determination:
    /// higher amount wins, and at equal amounts the earlier commit wins.
    pub fn outranks(&self, other: &Bid) -> bool {
        self.amount > other.amount
            || (self.amount == other.amount && self.placed_at < other.placed_at)
    }

    /// Serialize the bid to CBOR bytes.
    pub fn to_cbor(&self) -> GavelResult<Vec<u8>> {
        crate::util::to_cbor(self)
    }

    /// Deserialize a bid from CBOR bytes.
    pub fn from_cbor(data: &[u8]) -> GavelResult<Self> {
        crate::util::cbor_from_limited_reader(data, crate::config::MAX_RECORD_SIZE)
    }
}
