//! Two buyers race on the same ACTIVE exclusive listing: exactly one wins
//! and gets an Order; the loser is told the listing is no longer available.
//! The winner count over the listing's lifetime never exceeds one.

use rpl_service::MarketError;
use uuid::Uuid;

#[tokio::test]
#[ignore = "requires RPL_DATABASE_URL"]
async fn two_concurrent_reserves_yield_exactly_one_order() {
    let (market, pool) = rpl_testkit::market_from_env().await.expect("env pool");
    let owner = Uuid::new_v4();
    let listing = rpl_testkit::seed_exclusive_listing(&pool, owner, 750)
        .await
        .expect("seed");

    let buyer_a = Uuid::new_v4();
    let buyer_b = Uuid::new_v4();

    let (ra, rb) = tokio::join!(
        market.try_reserve(listing.listing_id, buyer_a, None),
        market.try_reserve(listing.listing_id, buyer_b, None),
    );

    let wins = [&ra, &rb].iter().filter(|r| r.is_ok()).count();
    assert_eq!(wins, 1, "exactly one racer must win: {ra:?} / {rb:?}");

    let loser = if ra.is_err() { ra.as_ref().unwrap_err() } else { rb.as_ref().unwrap_err() };
    match loser {
        MarketError::Conflict { detail } => {
            assert!(
                detail.contains("no longer available"),
                "loser must see the user-facing message, got: {detail}"
            );
        }
        other => panic!("loser must see Conflict, got {other:?}"),
    }

    // A third attempt after the dust settles is also rejected — lifetime
    // successful reservations ≤ 1.
    let late = market
        .try_reserve(listing.listing_id, Uuid::new_v4(), None)
        .await;
    assert!(matches!(late, Err(MarketError::Conflict { .. })));

    // Exactly one live order row exists.
    let (n,): (i64,) = sqlx::query_as(
        "select count(*)::bigint from orders where listing_id = $1 and status <> 'CANCELLED'",
    )
    .bind(listing.listing_id)
    .fetch_one(&pool)
    .await
    .expect("count orders");
    assert_eq!(n, 1);

    rpl_testkit::cleanup_listing(&pool, listing.listing_id)
        .await
        .expect("cleanup");
}

#[tokio::test]
#[ignore = "requires RPL_DATABASE_URL"]
async fn owner_cannot_reserve_own_listing() {
    let (market, pool) = rpl_testkit::market_from_env().await.expect("env pool");
    let owner = Uuid::new_v4();
    let listing = rpl_testkit::seed_exclusive_listing(&pool, owner, 750)
        .await
        .expect("seed");

    let res = market.try_reserve(listing.listing_id, owner, None).await;
    assert!(matches!(res, Err(MarketError::Validation { .. })));

    // The failed attempt consumed nothing: a real buyer still wins.
    market
        .try_reserve(listing.listing_id, Uuid::new_v4(), None)
        .await
        .expect("buyer reserves");

    rpl_testkit::cleanup_listing(&pool, listing.listing_id)
        .await
        .expect("cleanup");
}

#[tokio::test]
#[ignore = "requires RPL_DATABASE_URL"]
async fn reserve_missing_listing_is_not_found() {
    let (market, _pool) = rpl_testkit::market_from_env().await.expect("env pool");
    let res = market.try_reserve(Uuid::new_v4(), Uuid::new_v4(), None).await;
    assert!(matches!(res, Err(MarketError::NotFound { .. })));
}
