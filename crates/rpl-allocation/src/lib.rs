//! rpl-allocation
//!
//! Allocation and lifecycle rules for the marketplace core:
//! - Free-text quantity parsing into the typed `Quantity` value object
//! - Remaining-capacity aggregation over the claim ledger
//! - Claim validation (self-claim, over-claim)
//! - The listing/order status transition tables
//! - Weekly pickup-window recurrence expansion
//!
//! Pure deterministic logic — no IO, no clocks, no randomness. Every
//! decision this crate makes is recomputable from its inputs, which is what
//! lets the service layer re-derive state from the ledger instead of
//! trusting client-held caches.

pub mod aggregation;
pub mod lifecycle;
pub mod quantity;
pub mod recurrence;

pub use aggregation::{compute_remaining, validate_claim, ClaimRejection, Remaining};
pub use lifecycle::{
    can_delete_listing, listing_transition, order_transition, TransitionError,
};
pub use quantity::{format_amount_milli, parse_quantity};
pub use recurrence::{
    expand_recurrence, RecurrenceRule, MAX_HORIZON_DAYS, MAX_INSTANCES,
};
