/// Domain-specific error types for the auction engine.
#[derive(Debug, thiserror::Error)]
pub enum AuctionError {
    #[error("not found: {0}")]
    NotFound(String),

    #[error("auction is not open for bidding")]
    NotActive,

    #[error("bid too low: the minimum acceptable bid is {floor}")]
    BidTooLow {
        /// The lowest amount the next bid must reach.
        floor: u64,
    },

    #[error("bidder already holds the highest bid at {current}")]
    RedundantBid { current: u64 },

    /// A concurrently committed bid raised the price past the submitted
    /// amount. Internal to admission; callers see `BidTooLow` instead.
    #[error("bid lost a concurrent commit race")]
    Conflict,

    #[error("payment signature rejected")]
    SignatureInvalid,

    #[error("payment gateway unavailable: {0}")]
    GatewayUnavailable(String),

    #[error("validation failed: {0}")]
    Validation(String),

    #[error("invalid state: {0}")]
    InvalidState(String),

    #[error("serialization failed: {0}")]
    Serialization(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Convenience type alias.
pub type GavelResult<T> = Result<T, AuctionError>;
