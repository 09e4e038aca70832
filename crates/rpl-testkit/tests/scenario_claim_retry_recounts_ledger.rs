//! Remaining is always re-derived from the full claim ledger, never
//! decremented in place. A claim row whose listing write-back was lost is
//! still counted exactly once by the next successful aggregation.

use rpl_allocation::parse_quantity;
use rpl_db::{claims, NewClaim};
use uuid::Uuid;

#[tokio::test]
#[ignore = "requires RPL_DATABASE_URL"]
async fn orphaned_claim_row_converges_on_next_aggregation() {
    let (market, pool) = rpl_testkit::market_from_env().await.expect("env pool");
    let owner = Uuid::new_v4();
    let listing = rpl_testkit::seed_partial_listing(&pool, owner, 10_000, "units")
        .await
        .expect("seed");

    // Simulate a crash between the ledger append and the listing
    // write-back: the claim row lands but remaining stays stale.
    claims::insert_claim(
        &pool,
        &NewClaim {
            claim_id: Uuid::new_v4(),
            listing_id: listing.listing_id,
            claimant_id: Uuid::new_v4(),
            amount_milli: 3_000,
            unit: "units".to_string(),
        },
    )
    .await
    .expect("orphaned claim row");

    let stale = market
        .fetch_listing(listing.listing_id)
        .await
        .expect("fetch")
        .expect("row");
    assert_eq!(stale.remaining_milli, 10_000, "write-back never happened");

    // The next claim re-reads the whole ledger: remaining converges to
    // capacity − sum(rows), counting the orphaned row exactly once.
    let receipt = market
        .submit_claim(listing.listing_id, Uuid::new_v4(), parse_quantity("2 units"))
        .await
        .expect("claim accepted");
    assert_eq!(receipt.remaining_milli, 5_000);

    let converged = market
        .fetch_listing(listing.listing_id)
        .await
        .expect("fetch")
        .expect("row");
    assert_eq!(converged.remaining_milli, 5_000);

    // A repeat aggregation over the same ledger is idempotent.
    let receipt = market
        .submit_claim(listing.listing_id, Uuid::new_v4(), parse_quantity("1 unit"))
        .await
        .expect("claim accepted");
    assert_eq!(receipt.remaining_milli, 4_000);

    rpl_testkit::cleanup_listing(&pool, listing.listing_id)
        .await
        .expect("cleanup");
}
