//! rpl-schemas
//!
//! Shared domain types for the Replate marketplace core. Data only — no IO,
//! no business logic. Parsing/aggregation rules live in `rpl-allocation`;
//! persistence rows live in `rpl-db`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Quantity scale: millis (1e-3). "2.5 kg" is stored as 2_500 milli-kg.
pub const MILLI_SCALE: i64 = 1_000;

/// A typed quantity: numeric magnitude (milli fixed point) plus a free-text
/// unit suffix. Validated once at input time; unit compatibility between a
/// listing and its claims is NOT checked anywhere downstream.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Quantity {
    /// Magnitude in millis (1e-3 of a unit).
    pub amount_milli: i64,
    /// Free-text unit suffix ("units", "kg", "servings"). May be empty.
    pub unit: String,
}

impl Quantity {
    pub fn new(amount_milli: i64, unit: impl Into<String>) -> Self {
        Self {
            amount_milli,
            unit: unit.into(),
        }
    }
}

/// Allocation policy chosen at listing creation, immutable afterwards.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AllocationPolicy {
    /// Divisible quantity; many recipients each claim a fraction.
    Partial,
    /// Single unit; exactly one buyer wins, first come first served.
    Exclusive,
}

impl AllocationPolicy {
    pub fn as_str(&self) -> &'static str {
        match self {
            AllocationPolicy::Partial => "PARTIAL",
            AllocationPolicy::Exclusive => "EXCLUSIVE",
        }
    }

    pub fn parse(s: &str) -> Result<Self, UnknownVariant> {
        match s {
            "PARTIAL" => Ok(AllocationPolicy::Partial),
            "EXCLUSIVE" => Ok(AllocationPolicy::Exclusive),
            other => Err(UnknownVariant {
                kind: "allocation policy",
                value: other.to_string(),
            }),
        }
    }
}

/// Listing lifecycle states. Transitions are forward-only and owned by
/// `rpl-allocation::lifecycle` — nothing else decides legality.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ListingStatus {
    /// Open for claims (partial) or reservation (exclusive).
    Active,
    /// Exclusive listing won by exactly one buyer. **No backward transition.**
    Reserved,
    /// Partial listing whose remaining capacity reached zero. **Terminal.**
    ClaimedOut,
    /// Pickup confirmed by the owner. **Terminal.**
    Completed,
    /// Manually cancelled (never automatic). **Terminal.**
    Cancelled,
}

impl ListingStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ListingStatus::Active => "ACTIVE",
            ListingStatus::Reserved => "RESERVED",
            ListingStatus::ClaimedOut => "CLAIMED_OUT",
            ListingStatus::Completed => "COMPLETED",
            ListingStatus::Cancelled => "CANCELLED",
        }
    }

    pub fn parse(s: &str) -> Result<Self, UnknownVariant> {
        match s {
            "ACTIVE" => Ok(ListingStatus::Active),
            "RESERVED" => Ok(ListingStatus::Reserved),
            "CLAIMED_OUT" => Ok(ListingStatus::ClaimedOut),
            "COMPLETED" => Ok(ListingStatus::Completed),
            "CANCELLED" => Ok(ListingStatus::Cancelled),
            other => Err(UnknownVariant {
                kind: "listing status",
                value: other.to_string(),
            }),
        }
    }

    /// Returns `true` if no further transitions are possible.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            Self::ClaimedOut | Self::Completed | Self::Cancelled
        )
    }
}

/// Order lifecycle states (exclusive policy only).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderStatus {
    /// Created atomically with the winning reservation.
    Reserved,
    /// Pickup confirmed by the seller. **Terminal.**
    Completed,
    /// Manually cancelled. **Terminal.**
    Cancelled,
}

impl OrderStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Reserved => "RESERVED",
            OrderStatus::Completed => "COMPLETED",
            OrderStatus::Cancelled => "CANCELLED",
        }
    }

    pub fn parse(s: &str) -> Result<Self, UnknownVariant> {
        match s {
            "RESERVED" => Ok(OrderStatus::Reserved),
            "COMPLETED" => Ok(OrderStatus::Completed),
            "CANCELLED" => Ok(OrderStatus::Cancelled),
            other => Err(UnknownVariant {
                kind: "order status",
                value: other.to_string(),
            }),
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Cancelled)
    }
}

/// A concrete pickup window (start/end in UTC).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PickupWindow {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

/// Raised when a stored status/policy string does not match any variant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownVariant {
    pub kind: &'static str,
    pub value: String,
}

impl std::fmt::Display for UnknownVariant {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "invalid {}: {}", self.kind, self.value)
    }
}

impl std::error::Error for UnknownVariant {}

/// Identifier newtype aliases. Kept as plain Uuids — the tables enforce
/// referential integrity, not the type system.
pub type ListingId = Uuid;
pub type ClaimId = Uuid;
pub type OrderId = Uuid;
pub type UserId = Uuid;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_round_trips_through_strings() {
        for st in [
            ListingStatus::Active,
            ListingStatus::Reserved,
            ListingStatus::ClaimedOut,
            ListingStatus::Completed,
            ListingStatus::Cancelled,
        ] {
            assert_eq!(ListingStatus::parse(st.as_str()).unwrap(), st);
        }
        assert!(ListingStatus::parse("ARCHIVED").is_err());
    }

    #[test]
    fn terminal_states_marked_terminal() {
        assert!(!ListingStatus::Active.is_terminal());
        assert!(!ListingStatus::Reserved.is_terminal());
        assert!(ListingStatus::ClaimedOut.is_terminal());
        assert!(ListingStatus::Completed.is_terminal());
        assert!(ListingStatus::Cancelled.is_terminal());

        assert!(!OrderStatus::Reserved.is_terminal());
        assert!(OrderStatus::Completed.is_terminal());
    }
}
