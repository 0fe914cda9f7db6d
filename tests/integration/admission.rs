//! Bid admission scenarios: floors, rejection data, and concurrent races.

use std::sync::Arc;

use gavel::{AuctionError, BidderId};

use crate::common::harness::EngineHarness;

#[tokio::test]
async fn test_floor_is_starting_bid_plus_increment() {
    let harness = EngineHarness::new();
    let product = harness.open_auction(1, 100, 10, 60_000).await.unwrap();

    // 105 does not clear the 110 floor.
    let rejected = harness.bid(product, 1, 105).await.unwrap_err();
    match rejected {
        AuctionError::BidTooLow { floor } => assert_eq!(floor, 110),
        other => panic!("expected BidTooLow, got {other:?}"),
    }

    // 110 does.
    assert_eq!(harness.bid(product, 1, 110).await.unwrap(), 110);
    let auction = harness.house.auction(product).await.unwrap();
    assert_eq!(auction.current_bid, Some(110));
}

#[tokio::test]
async fn test_rejection_carries_refreshed_floor() {
    let harness = EngineHarness::new();
    let product = harness.open_auction(1, 100, 10, 60_000).await.unwrap();

    harness.bid(product, 1, 110).await.unwrap();
    harness.bid(product, 2, 150).await.unwrap();

    // A stale client retries with the data from the error and succeeds.
    let err = harness.bid(product, 3, 120).await.unwrap_err();
    let AuctionError::BidTooLow { floor } = err else {
        panic!("expected BidTooLow");
    };
    assert_eq!(floor, 160);
    assert_eq!(harness.bid(product, 3, floor).await.unwrap(), 160);
}

#[tokio::test]
async fn test_bids_rejected_outside_active_window() {
    let harness = EngineHarness::new();
    let product = harness.open_auction(1, 100, 10, 60_000).await.unwrap();

    harness.clock.advance(60_000);
    let result = harness.bid(product, 1, 110).await;
    assert!(matches!(result, Err(AuctionError::NotActive)));

    // Nothing was admitted.
    assert!(harness.house.highest_bid(product).await.is_none());
}

#[tokio::test]
async fn test_two_bidders_racing_one_floor() {
    // Both validate against floor 140; one commits first and the second is
    // revalidated against the new leader.
    let harness = EngineHarness::new();
    let product = harness.open_auction(1, 130, 10, 60_000).await.unwrap();
    let house = harness.house.clone();

    let first = {
        let house = house.clone();
        tokio::spawn(async move { house.place_bid(product, BidderId(1), 150).await })
    };
    let second = {
        let house = house.clone();
        tokio::spawn(async move { house.place_bid(product, BidderId(2), 160).await })
    };

    let first = first.await.unwrap();
    let second = second.await.unwrap();

    match (first, second) {
        // 150 landed first: 160 still clears 150 + 10.
        (Ok(a), Ok(b)) => {
            assert_eq!(a.amount, 150);
            assert_eq!(b.amount, 160);
            let top = house.highest_bid(product).await.unwrap();
            assert_eq!(top.amount, 160);
        }
        // 160 landed first: 150 must lose with the fresh floor attached.
        (Err(AuctionError::BidTooLow { floor }), Ok(b)) => {
            assert_eq!(b.amount, 160);
            assert_eq!(floor, 170);
        }
        other => panic!("unexpected outcome {other:?}"),
    }
}

#[tokio::test]
async fn test_final_price_is_maximum_accepted_amount() {
    let harness = EngineHarness::new();
    let product = harness.open_auction(1, 100, 10, 60_000).await.unwrap();
    let house = harness.house.clone();

    let mut handles = Vec::new();
    for bidder in 1..=20u64 {
        let house = house.clone();
        handles.push(tokio::spawn(async move {
            house
                .place_bid(product, BidderId(bidder), 100 + bidder * 15)
                .await
        }));
    }

    let mut accepted = Vec::new();
    for handle in handles {
        if let Ok(bid) = handle.await.unwrap() {
            accepted.push(bid.amount);
        }
    }
    assert!(!accepted.is_empty());

    // The stored price equals the maximum accepted amount, and the history
    // climbs by at least the increment at every step.
    let auction = house.auction(product).await.unwrap();
    assert_eq!(auction.current_bid, accepted.iter().max().copied());

    let mut amounts: Vec<u64> = house
        .bid_history(product)
        .await
        .iter()
        .map(|b| b.amount)
        .collect();
    amounts.reverse();
    for pair in amounts.windows(2) {
        assert!(
            pair[1] >= pair[0] + 10,
            "monotonic increment violated: {amounts:?}"
        );
    }
}

#[tokio::test]
async fn test_independent_auctions_admit_in_parallel() {
    let harness = EngineHarness::new();
    let product_a = harness.open_auction(1, 100, 10, 60_000).await.unwrap();
    let product_b = harness.open_auction(2, 100, 10, 60_000).await.unwrap();
    let house = harness.house.clone();

    let mut handles = Vec::new();
    for bidder in 1..=10u64 {
        let house = Arc::clone(&house);
        let product = if bidder % 2 == 0 { product_a } else { product_b };
        handles.push(tokio::spawn(async move {
            house
                .place_bid(product, BidderId(bidder), 110 + bidder * 20)
                .await
        }));
    }
    for handle in handles {
        let _ = handle.await.unwrap();
    }

    assert!(harness.house.highest_bid(product_a).await.is_some());
    assert!(harness.house.highest_bid(product_b).await.is_some());
}

#[tokio::test]
async fn test_history_newest_first_and_stable() {
    let harness = EngineHarness::new();
    let product = harness.open_auction(1, 100, 10, 60_000).await.unwrap();

    for (bidder, amount) in [(1u64, 110u64), (2, 120), (3, 140)] {
        harness.bid(product, bidder, amount).await.unwrap();
        harness.clock.advance(500);
    }

    let history = harness.house.bid_history(product).await;
    let amounts: Vec<u64> = history.iter().map(|b| b.amount).collect();
    assert_eq!(amounts, vec![140, 120, 110]);

    // A reconnecting client re-fetching sees the same order.
    let again = harness.house.bid_history(product).await;
    assert_eq!(history, again);
}
