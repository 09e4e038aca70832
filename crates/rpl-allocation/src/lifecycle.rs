//! Status lifecycle tables — the single authority on legal transitions.
//!
//! # Design
//!
//! Every status write in the system consults this module first; the SQL
//! layer then re-asserts the same guard with a conditional UPDATE, so an
//! illegal transition can never land even if a caller skips the check.
//!
//! Transitions are forward-only. There is no path out of a terminal state
//! and no path back to ACTIVE.
//!
//! ```text
//!                 claims exhaust capacity
//!   ACTIVE ──────────────────────────────► CLAIMED_OUT (terminal)
//!     │ │
//!     │ │  arbiter wins exclusive listing          owner confirms pickup
//!     │ └────────────────────────► RESERVED ─────────────► COMPLETED (terminal)
//!     │                                │
//!     │  owner delete (row removal)    │  manual cancel only
//!     ▼                                ▼
//!   (deleted)                      CANCELLED (terminal)
//! ```

use rpl_schemas::{ListingStatus, OrderStatus};

/// Returned when a requested transition is not in the legal table.
///
/// Surfaced to callers as a conflict — the entity is in a state that does
/// not admit the requested change.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransitionError {
    pub entity: &'static str,
    pub from: String,
    pub to: String,
}

impl TransitionError {
    fn listing(from: ListingStatus, to: ListingStatus) -> Self {
        Self {
            entity: "listing",
            from: from.as_str().to_string(),
            to: to.as_str().to_string(),
        }
    }

    fn order(from: OrderStatus, to: OrderStatus) -> Self {
        Self {
            entity: "order",
            from: from.as_str().to_string(),
            to: to.as_str().to_string(),
        }
    }
}

impl std::fmt::Display for TransitionError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "illegal {} transition: {} -> {}",
            self.entity, self.from, self.to
        )
    }
}

impl std::error::Error for TransitionError {}

/// Check a listing status transition against the legal table.
pub fn listing_transition(
    from: ListingStatus,
    to: ListingStatus,
) -> Result<(), TransitionError> {
    use ListingStatus::*;
    match (from, to) {
        // Partial policy: remaining hit zero.
        (Active, ClaimedOut) => Ok(()),
        // Exclusive policy: arbiter success.
        (Active, Reserved) => Ok(()),
        // Owner confirms pickup.
        (Reserved, Completed) => Ok(()),
        // Manual only, never automatic.
        (Reserved, Cancelled) => Ok(()),
        (from, to) => Err(TransitionError::listing(from, to)),
    }
}

/// Check an order status transition against the legal table.
pub fn order_transition(from: OrderStatus, to: OrderStatus) -> Result<(), TransitionError> {
    use OrderStatus::*;
    match (from, to) {
        (Reserved, Completed) => Ok(()),
        (Reserved, Cancelled) => Ok(()),
        (from, to) => Err(TransitionError::order(from, to)),
    }
}

/// Deletion is a row removal, not a status; it is legal only from ACTIVE.
pub fn can_delete_listing(status: ListingStatus) -> bool {
    status == ListingStatus::Active
}
