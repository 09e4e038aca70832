//! Cancellation is manual, allowed for either party, moves the order and the
//! listing to CANCELLED together, and is terminal — a cancelled listing
//! cannot be re-reserved.

use rpl_schemas::{ListingStatus, OrderStatus};
use rpl_service::MarketError;
use uuid::Uuid;

#[tokio::test]
#[ignore = "requires RPL_DATABASE_URL"]
async fn buyer_cancellation_settles_both_rows() {
    let (market, pool) = rpl_testkit::market_from_env().await.expect("env pool");
    let owner = Uuid::new_v4();
    let buyer = Uuid::new_v4();
    let listing = rpl_testkit::seed_exclusive_listing(&pool, owner, 650)
        .await
        .expect("seed");

    let order = market
        .try_reserve(listing.listing_id, buyer, None)
        .await
        .expect("buyer reserves");

    let cancelled = market
        .cancel_reservation(order.order_id, buyer)
        .await
        .expect("buyer cancels");
    assert_eq!(cancelled.status, OrderStatus::Cancelled);

    let row = market
        .fetch_listing(listing.listing_id)
        .await
        .expect("fetch")
        .expect("row");
    assert_eq!(row.status, ListingStatus::Cancelled);

    // CANCELLED is terminal for the listing: no re-reservation.
    let err = market
        .try_reserve(listing.listing_id, Uuid::new_v4(), None)
        .await
        .expect_err("cancelled listing cannot be reserved");
    assert!(matches!(err, MarketError::Conflict { .. }));

    // Neither can the cancelled order be completed.
    let err = market
        .mark_completed(order.order_id, owner)
        .await
        .expect_err("cancelled order cannot complete");
    assert!(matches!(err, MarketError::Conflict { .. }));

    rpl_testkit::cleanup_listing(&pool, listing.listing_id)
        .await
        .expect("cleanup");
}

#[tokio::test]
#[ignore = "requires RPL_DATABASE_URL"]
async fn seller_may_cancel_but_strangers_may_not() {
    let (market, pool) = rpl_testkit::market_from_env().await.expect("env pool");
    let owner = Uuid::new_v4();
    let listing = rpl_testkit::seed_exclusive_listing(&pool, owner, 650)
        .await
        .expect("seed");

    let order = market
        .try_reserve(listing.listing_id, Uuid::new_v4(), None)
        .await
        .expect("buyer reserves");

    let err = market
        .cancel_reservation(order.order_id, Uuid::new_v4())
        .await
        .expect_err("third party cannot cancel");
    assert!(matches!(err, MarketError::Validation { .. }));

    let cancelled = market
        .cancel_reservation(order.order_id, owner)
        .await
        .expect("seller cancels");
    assert_eq!(cancelled.status, OrderStatus::Cancelled);

    rpl_testkit::cleanup_listing(&pool, listing.listing_id)
        .await
        .expect("cleanup");
}
