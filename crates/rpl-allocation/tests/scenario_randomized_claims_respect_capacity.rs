//! Randomized claim-sequence fuzzing of the validate→append→recompute path.
//!
//! Property: when every claim is validated against the freshly recomputed
//! remaining before it is appended, the accepted sum never exceeds capacity
//! and the exhausted flag fires exactly when remaining hits zero.
//!
//! Seeded StdRng keeps failures reproducible.

use rand::{rngs::StdRng, Rng, SeedableRng};
use rpl_allocation::{compute_remaining, validate_claim};
use uuid::Uuid;

#[test]
fn scenario_random_claim_sequences_never_oversubscribe() {
    let mut rng = StdRng::seed_from_u64(0x5EED_F00D);

    for _ in 0..500 {
        let owner = Uuid::new_v4();
        let capacity_milli: i64 = rng.gen_range(1..=50) * 1_000;
        let mut ledger: Vec<i64> = Vec::new();

        for _ in 0..rng.gen_range(1..40usize) {
            // Occasionally attempt a self-claim or an oversized request.
            let claimant = if rng.gen_bool(0.05) { owner } else { Uuid::new_v4() };
            let requested: i64 = rng.gen_range(0..=capacity_milli + 5_000);

            let remaining = compute_remaining(capacity_milli, &ledger);
            if validate_claim(claimant, owner, requested, remaining.remaining_milli).is_ok() {
                ledger.push(requested);
            }

            let sum: i64 = ledger.iter().sum();
            assert!(
                sum <= capacity_milli,
                "accepted claims {sum} exceed capacity {capacity_milli}"
            );

            let derived = compute_remaining(capacity_milli, &ledger);
            assert_eq!(derived.remaining_milli, capacity_milli - sum);
            assert_eq!(derived.exhausted, sum >= capacity_milli);
        }
    }
}

#[test]
fn scenario_stale_remaining_models_the_documented_race() {
    // Two claimants validate against the SAME stale remaining, both pass,
    // and the ledger oversubscribes — the weaker partial-policy guarantee.
    // Derived remaining still clamps at zero and reports exhaustion.
    let owner = Uuid::new_v4();
    let capacity = 10_000i64;
    let ledger = vec![9_000i64];
    let stale = compute_remaining(capacity, &ledger);

    assert!(validate_claim(Uuid::new_v4(), owner, 1_000, stale.remaining_milli).is_ok());
    assert!(validate_claim(Uuid::new_v4(), owner, 1_000, stale.remaining_milli).is_ok());

    let after_both = compute_remaining(capacity, &[9_000, 1_000, 1_000]);
    assert_eq!(after_both.remaining_milli, 0);
    assert!(after_both.exhausted);
}
