//! Remaining-capacity aggregation over the claim ledger.
//!
//! The claim ledger is append-only; remaining capacity is always derived by
//! summing the FULL current claim set against the listing capacity, never
//! by decrementing a cached value. Callers must re-read the ledger
//! immediately before recomputing — that shrinks (but does not eliminate)
//! the race window between validation and the status write-back.
//!
//! Unit compatibility between a listing and its claims is deliberately not
//! validated here. Known gap, carried as-is.

use rpl_schemas::UserId;

/// Output of [`compute_remaining`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Remaining {
    /// `max(0, capacity − sum(claims))`, in millis.
    pub remaining_milli: i64,
    /// True when the remaining capacity reached zero — the listing must
    /// transition to CLAIMED_OUT.
    pub exhausted: bool,
}

/// Derive remaining capacity from the listing capacity and every claim
/// magnitude currently in the ledger.
pub fn compute_remaining(capacity_milli: i64, claim_amounts_milli: &[i64]) -> Remaining {
    let claimed: i64 = claim_amounts_milli
        .iter()
        .fold(0i64, |acc, a| acc.saturating_add(*a));

    let raw = capacity_milli.saturating_sub(claimed);
    Remaining {
        remaining_milli: raw.max(0),
        exhausted: raw <= 0,
    }
}

/// Why a claim request was rejected before reaching the ledger.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClaimRejection {
    /// The claimant owns the listing.
    SelfClaim,
    /// Requested more than the last-known remaining. Carries the remaining
    /// so the caller can resubmit a smaller request.
    ExceedsRemaining {
        requested_milli: i64,
        remaining_milli: i64,
    },
    /// Zero or negative magnitudes never enter the ledger.
    NonPositiveAmount { requested_milli: i64 },
}

impl std::fmt::Display for ClaimRejection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::SelfClaim => write!(f, "cannot claim your own listing"),
            Self::ExceedsRemaining {
                requested_milli,
                remaining_milli,
            } => write!(
                f,
                "requested {requested_milli} milli exceeds remaining {remaining_milli} milli"
            ),
            Self::NonPositiveAmount { requested_milli } => {
                write!(f, "claim amount must be > 0, got {requested_milli} milli")
            }
        }
    }
}

impl std::error::Error for ClaimRejection {}

/// Validate a claim request against the caller's last-known remaining.
///
/// This check is NOT atomic with the eventual ledger append — two claimants
/// racing on the last unit can both pass. That weaker guarantee is a
/// documented product decision; the exclusive policy is the path with true
/// single-winner semantics.
pub fn validate_claim(
    claimant_id: UserId,
    owner_id: UserId,
    requested_milli: i64,
    last_known_remaining_milli: i64,
) -> Result<(), ClaimRejection> {
    if claimant_id == owner_id {
        return Err(ClaimRejection::SelfClaim);
    }
    if requested_milli <= 0 {
        return Err(ClaimRejection::NonPositiveAmount { requested_milli });
    }
    if requested_milli > last_known_remaining_milli {
        return Err(ClaimRejection::ExceedsRemaining {
            requested_milli,
            remaining_milli: last_known_remaining_milli,
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    #[test]
    fn remaining_is_capacity_minus_sum() {
        let r = compute_remaining(10_000, &[6_000]);
        assert_eq!(r.remaining_milli, 4_000);
        assert!(!r.exhausted);
    }

    #[test]
    fn exact_fill_exhausts() {
        let r = compute_remaining(10_000, &[6_000, 4_000]);
        assert_eq!(r.remaining_milli, 0);
        assert!(r.exhausted);
    }

    #[test]
    fn oversum_clamps_to_zero() {
        // The ledger can exceed capacity under the documented race; derived
        // remaining never goes negative.
        let r = compute_remaining(10_000, &[6_000, 6_000]);
        assert_eq!(r.remaining_milli, 0);
        assert!(r.exhausted);
    }

    #[test]
    fn empty_ledger_leaves_full_capacity() {
        let r = compute_remaining(10_000, &[]);
        assert_eq!(r.remaining_milli, 10_000);
        assert!(!r.exhausted);
    }

    #[test]
    fn self_claim_rejected() {
        let owner = Uuid::new_v4();
        assert_eq!(
            validate_claim(owner, owner, 1_000, 10_000),
            Err(ClaimRejection::SelfClaim)
        );
    }

    #[test]
    fn overclaim_rejected_with_remaining() {
        let err = validate_claim(Uuid::new_v4(), Uuid::new_v4(), 5_000, 4_000).unwrap_err();
        assert_eq!(
            err,
            ClaimRejection::ExceedsRemaining {
                requested_milli: 5_000,
                remaining_milli: 4_000,
            }
        );
    }

    #[test]
    fn claim_for_exact_remaining_allowed() {
        assert!(validate_claim(Uuid::new_v4(), Uuid::new_v4(), 4_000, 4_000).is_ok());
    }
}
