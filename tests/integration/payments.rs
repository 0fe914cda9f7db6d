//! Payment reconciliation scenarios over full auction rounds.

use gavel::{AttemptOutcome, AuctionError, PaymentFailure, PaymentMethod, PaymentStatus};

use crate::common::harness::EngineHarness;

/// Run an auction to settlement and return the winning order's id.
async fn settled_order(harness: &EngineHarness) -> gavel::OrderId {
    let product = harness.open_auction(1, 100, 10, 60_000).await.unwrap();
    harness.bid(product, 1, 110).await.unwrap();
    harness.bid(product, 2, 500).await.unwrap();
    harness.close_and_sweep(product).await;
    harness
        .house
        .settle(product)
        .await
        .unwrap()
        .order
        .expect("winner order")
}

#[tokio::test]
async fn test_checkout_round_trip_in_sandbox_mode() {
    let harness = EngineHarness::new();
    let order_id = settled_order(&harness).await;

    let handle = harness.house.create_payment_order(order_id).await.unwrap();
    assert!(handle.is_mock);
    assert_eq!(handle.amount, 500);

    let payment_id = gavel::mocks::MockGateway::synthetic_payment_id(9);
    harness
        .house
        .verify_payment(order_id, &handle.gateway_order_id, &payment_id, "")
        .await
        .unwrap();

    let order = harness.order(order_id).await;
    assert_eq!(order.payment_status, PaymentStatus::Paid);
}

#[tokio::test]
async fn test_duplicate_callback_credits_once() {
    let harness = EngineHarness::with_live_gateway();
    let order_id = settled_order(&harness).await;

    let handle = harness.house.create_payment_order(order_id).await.unwrap();
    let signature = {
        // The gateway signs over "<order>|<payment>" with the shared secret.
        use hmac::{Hmac, Mac};
        use sha2::Sha256;
        let mut mac =
            Hmac::<Sha256>::new_from_slice(crate::common::harness::GATEWAY_SECRET.as_bytes())
                .unwrap();
        mac.update(format!("{}|pay_42", handle.gateway_order_id).as_bytes());
        hex::encode(mac.finalize().into_bytes())
    };

    let first = harness
        .house
        .verify_payment(order_id, &handle.gateway_order_id, "pay_42", &signature)
        .await
        .unwrap();
    harness.clock.advance(5_000);
    let second = harness
        .house
        .verify_payment(order_id, &handle.gateway_order_id, "pay_42", &signature)
        .await
        .unwrap();

    // One pending->paid transition, one journaled attempt, same result.
    assert_eq!(first.verified_at, second.verified_at);
    let attempts = harness.house.payment_attempts(order_id).await;
    assert_eq!(attempts.len(), 1);
    assert_eq!(attempts[0].outcome, AttemptOutcome::Verified);
}

#[tokio::test]
async fn test_forged_signature_is_rejected_without_side_effects() {
    let harness = EngineHarness::with_live_gateway();
    let order_id = settled_order(&harness).await;
    let handle = harness.house.create_payment_order(order_id).await.unwrap();

    let result = harness
        .house
        .verify_payment(order_id, &handle.gateway_order_id, "pay_42", "00ff00ff")
        .await;
    assert!(matches!(result, Err(AuctionError::SignatureInvalid)));

    let order = harness.order(order_id).await;
    assert_eq!(order.payment_status, PaymentStatus::Pending);
    assert!(harness.house.payment_attempts(order_id).await.is_empty());
}

#[tokio::test]
async fn test_failures_are_journaled_and_retries_can_succeed() {
    let harness = EngineHarness::new();
    let order_id = settled_order(&harness).await;
    let handle = harness.house.create_payment_order(order_id).await.unwrap();

    harness
        .house
        .record_payment_failure(
            order_id,
            &handle.gateway_order_id,
            "pay_mock_1",
            PaymentFailure {
                code: "PAYMENT_DECLINED".to_string(),
                description: "Card declined by issuer".to_string(),
                reason: "insufficient_funds".to_string(),
            },
        )
        .await
        .unwrap();

    // The failure never blocks a later successful attempt.
    let order = harness.order(order_id).await;
    assert_eq!(order.payment_status, PaymentStatus::Pending);

    harness
        .house
        .verify_payment(order_id, &handle.gateway_order_id, "pay_mock_2", "")
        .await
        .unwrap();

    let attempts = harness.house.payment_attempts(order_id).await;
    assert_eq!(attempts.len(), 2);
    assert_eq!(attempts[0].outcome, AttemptOutcome::Failed);
    assert_eq!(
        attempts[0].failure.as_ref().unwrap().reason,
        "insufficient_funds"
    );
    assert_eq!(attempts[1].outcome, AttemptOutcome::Verified);
}

#[tokio::test]
async fn test_gateway_outage_is_retryable() {
    let harness = EngineHarness::new();
    let order_id = settled_order(&harness).await;

    harness.gateway.set_unavailable(true);
    let result = harness.house.create_payment_order(order_id).await;
    assert!(matches!(result, Err(AuctionError::GatewayUnavailable(_))));

    harness.gateway.set_unavailable(false);
    assert!(harness.house.create_payment_order(order_id).await.is_ok());
}

#[tokio::test]
async fn test_cash_on_delivery_round_trip() {
    let harness = EngineHarness::new();
    let order_id = settled_order(&harness).await;

    harness
        .house
        .mark_cash_on_delivery(order_id)
        .await
        .unwrap();

    let order = harness.order(order_id).await;
    assert_eq!(order.payment_method, PaymentMethod::CashOnDelivery);
    assert_eq!(order.payment_status, PaymentStatus::Pending);
    assert_eq!(order.gateway_order_id, None);
}

#[tokio::test]
async fn test_fixed_price_order_pays_like_any_other() {
    use gavel::{BidderId, OrderLine, ProductId, SaleMode};

    let harness = EngineHarness::new();
    let order = harness
        .house
        .place_order(
            BidderId(5),
            vec![
                OrderLine {
                    product: ProductId(10),
                    quantity: 2,
                    unit_price: 150,
                    mode: SaleMode::FixedPrice,
                },
                OrderLine {
                    product: ProductId(11),
                    quantity: 1,
                    unit_price: 80,
                    mode: SaleMode::FixedPrice,
                },
            ],
            PaymentMethod::Online,
        )
        .await
        .unwrap();
    assert_eq!(order.total_amount, 380);

    let handle = harness.house.create_payment_order(order.id).await.unwrap();
    assert_eq!(handle.amount, 380);
    harness
        .house
        .verify_payment(order.id, &handle.gateway_order_id, "pay_mock_5", "")
        .await
        .unwrap();

    assert_eq!(
        harness.order(order.id).await.payment_status,
        PaymentStatus::Paid
    );
}

#[tokio::test]
async fn test_unknown_order_is_reported() {
    let harness = EngineHarness::new();
    let result = harness
        .house
        .create_payment_order(gavel::OrderId(404))
        .await;
    assert!(matches!(result, Err(AuctionError::NotFound(_))));
}
