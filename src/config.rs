//! Configuration constants for the auction engine.
//!
//! This module centralizes magic numbers and configuration values
//! to improve maintainability and enable easier tuning.

/// Interval in seconds between lifecycle sweeps for due auctions.
pub const SWEEP_INTERVAL_SECS: u64 = 2;

/// How many times admission silently retries a bid that lost a commit race
/// before surfacing the failure with refreshed floor data.
pub const CONFLICT_RETRY_LIMIT: u32 = 1;

/// Capacity of each room's event channel. Subscribers that fall further
/// behind than this miss events and must reconcile via the read path.
pub const ROOM_CHANNEL_CAPACITY: usize = 256;

/// Maximum size in bytes accepted when decoding a persisted record.
pub const MAX_RECORD_SIZE: usize = 32_768;

/// Identifier prefix the sandbox gateway assigns to synthetic orders.
pub const MOCK_GATEWAY_ORDER_PREFIX: &str = "order_mock_";

/// Identifier prefix accepted for synthetic payments in sandbox mode.
pub const MOCK_GATEWAY_PAYMENT_PREFIX: &str = "pay_mock_";

/// Currency code reported by gateway order handles.
pub const GATEWAY_CURRENCY: &str = "INR";

/// Return the current Unix timestamp in milliseconds.
///
/// This is a convenience wrapper that avoids the boilerplate of
/// `SystemClock::new().now_millis()` in production code paths.
/// For testable code, prefer accepting a `Clock` parameter instead.
pub fn now_millis() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}
