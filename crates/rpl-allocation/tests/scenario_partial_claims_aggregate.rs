//! Partial-policy aggregation walkthrough: capacity "10 units", a 6-unit
//! claim lands, a 5-unit claim is rejected against the new remaining, and an
//! exact-remaining claim drives the listing to exhaustion.

use rpl_allocation::{
    compute_remaining, format_amount_milli, parse_quantity, validate_claim, ClaimRejection,
};
use uuid::Uuid;

#[test]
fn scenario_six_then_five_against_ten_units() {
    let owner = Uuid::new_v4();
    let capacity = parse_quantity("10 units");
    assert_eq!(capacity.amount_milli, 10_000);
    assert_eq!(capacity.unit, "units");

    // Claim A: 6 units — accepted, remaining drops to 4.
    let claim_a = parse_quantity("6 units");
    let mut ledger: Vec<i64> = Vec::new();
    validate_claim(Uuid::new_v4(), owner, claim_a.amount_milli, capacity.amount_milli)
        .expect("first claim fits");
    ledger.push(claim_a.amount_milli);

    let after_a = compute_remaining(capacity.amount_milli, &ledger);
    assert_eq!(format_amount_milli(after_a.remaining_milli), "4");
    assert!(!after_a.exhausted);

    // Claim B: 5 units — rejected, ledger and remaining unchanged.
    let claim_b = parse_quantity("5 units");
    let err = validate_claim(
        Uuid::new_v4(),
        owner,
        claim_b.amount_milli,
        after_a.remaining_milli,
    )
    .expect_err("over-claim must be rejected");
    assert_eq!(
        err,
        ClaimRejection::ExceedsRemaining {
            requested_milli: 5_000,
            remaining_milli: 4_000,
        }
    );

    let unchanged = compute_remaining(capacity.amount_milli, &ledger);
    assert_eq!(unchanged.remaining_milli, 4_000);
}

#[test]
fn scenario_exact_remaining_exhausts_listing() {
    let owner = Uuid::new_v4();
    let capacity = parse_quantity("10 units");
    let ledger = vec![6_000i64];

    let remaining = compute_remaining(capacity.amount_milli, &ledger);
    validate_claim(Uuid::new_v4(), owner, remaining.remaining_milli, remaining.remaining_milli)
        .expect("exact-remaining claim is legal");

    let ledger = vec![6_000i64, remaining.remaining_milli];
    let after = compute_remaining(capacity.amount_milli, &ledger);
    assert_eq!(after.remaining_milli, 0);
    assert!(after.exhausted, "remaining 0 must flip exhausted");
}
