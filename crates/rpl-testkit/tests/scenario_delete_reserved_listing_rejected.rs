//! Deletion is legal only while a listing is ACTIVE. Once a buyer holds a
//! reservation the seller's delete is rejected and the row is untouched.

use rpl_schemas::ListingStatus;
use rpl_service::MarketError;
use uuid::Uuid;

#[tokio::test]
#[ignore = "requires RPL_DATABASE_URL"]
async fn delete_rejected_while_reserved() {
    let (market, pool) = rpl_testkit::market_from_env().await.expect("env pool");
    let owner = Uuid::new_v4();
    let listing = rpl_testkit::seed_exclusive_listing(&pool, owner, 900)
        .await
        .expect("seed");

    market
        .try_reserve(listing.listing_id, Uuid::new_v4(), None)
        .await
        .expect("buyer reserves");

    let err = market
        .delete_listing(listing.listing_id, owner)
        .await
        .expect_err("delete while RESERVED rejected");
    assert!(matches!(err, MarketError::Conflict { .. }));

    // The listing row is unchanged.
    let row = market
        .fetch_listing(listing.listing_id)
        .await
        .expect("fetch")
        .expect("row still present");
    assert_eq!(row.status, ListingStatus::Reserved);

    rpl_testkit::cleanup_listing(&pool, listing.listing_id)
        .await
        .expect("cleanup");
}

#[tokio::test]
#[ignore = "requires RPL_DATABASE_URL"]
async fn delete_active_listing_by_owner_succeeds() {
    let (market, pool) = rpl_testkit::market_from_env().await.expect("env pool");
    let owner = Uuid::new_v4();
    let listing = rpl_testkit::seed_partial_listing(&pool, owner, 3_000, "kg")
        .await
        .expect("seed");

    market
        .delete_listing(listing.listing_id, owner)
        .await
        .expect("owner deletes ACTIVE listing");

    let gone = market
        .fetch_listing(listing.listing_id)
        .await
        .expect("fetch");
    assert!(gone.is_none());
}

#[tokio::test]
#[ignore = "requires RPL_DATABASE_URL"]
async fn delete_by_non_owner_rejected() {
    let (market, pool) = rpl_testkit::market_from_env().await.expect("env pool");
    let owner = Uuid::new_v4();
    let listing = rpl_testkit::seed_partial_listing(&pool, owner, 3_000, "kg")
        .await
        .expect("seed");

    let err = market
        .delete_listing(listing.listing_id, Uuid::new_v4())
        .await
        .expect_err("stranger cannot delete");
    assert!(matches!(err, MarketError::Validation { .. }));

    rpl_testkit::cleanup_listing(&pool, listing.listing_id)
        .await
        .expect("cleanup");
}
