pub mod auction;
pub mod bid;
pub mod ids;
pub mod order;

pub use auction::{Auction, AuctionBuilder, AuctionStatus, Phase};
pub use bid::Bid;
pub use ids::{BidderId, OrderId, ProductId};
pub use order::{
    AttemptOutcome, Order, OrderLine, PaymentAttempt, PaymentFailure, PaymentMethod,
    PaymentStatus, SaleMode,
};
