//! Request and response types for all rpl-daemon HTTP endpoints.
//!
//! These types are `Serialize + Deserialize` so they can be JSON-encoded by
//! Axum and decoded by tests. No business logic lives here; quantity
//! formatting is delegated to `rpl-allocation` at construction time.

use chrono::{DateTime, Utc};
use rpl_allocation::format_amount_milli;
use rpl_db::{ClaimRow, ListingRow, OrderRow};
use rpl_schemas::PickupWindow;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ---------------------------------------------------------------------------
// /v1/health
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub ok: bool,
    pub service: &'static str,
    pub version: &'static str,
}

// ---------------------------------------------------------------------------
// Error body — every non-2xx response
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// "validation" | "not_found" | "conflict" | "transient" | "storage"
    pub kind: String,
    pub error: String,
    /// Populated for over-claims: the current remaining, so the caller can
    /// resubmit a smaller request.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub remaining: Option<String>,
}

// ---------------------------------------------------------------------------
// Listings
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateListingRequest {
    pub owner_id: Uuid,
    pub title: String,
    /// "PARTIAL" | "EXCLUSIVE"
    pub policy: String,
    /// Free text, e.g. "10 units", "5kg". Parsed once here at the boundary.
    pub quantity: String,
    pub price_cents: Option<i64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ListingResponse {
    pub listing_id: Uuid,
    pub owner_id: Uuid,
    pub title: String,
    pub policy: String,
    /// Decimal magnitude, e.g. "10".
    pub capacity: String,
    /// Decimal magnitude, e.g. "4".
    pub remaining: String,
    pub unit: String,
    pub price_cents: Option<i64>,
    pub status: String,
    pub created_at: DateTime<Utc>,
}

impl From<&ListingRow> for ListingResponse {
    fn from(l: &ListingRow) -> Self {
        Self {
            listing_id: l.listing_id,
            owner_id: l.owner_id,
            title: l.title.clone(),
            policy: l.policy.as_str().to_string(),
            capacity: format_amount_milli(l.capacity_milli),
            remaining: format_amount_milli(l.remaining_milli),
            unit: l.unit.clone(),
            price_cents: l.price_cents,
            status: l.status.as_str().to_string(),
            created_at: l.created_at,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ListingsResponse {
    pub listings: Vec<ListingResponse>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ListingsQuery {
    pub policy: Option<String>,
    pub owner_id: Option<Uuid>,
    pub limit: Option<i64>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DeleteListingQuery {
    pub caller_id: Uuid,
}

// ---------------------------------------------------------------------------
// Claims
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubmitClaimRequest {
    pub claimant_id: Uuid,
    /// Free text, e.g. "6 units".
    pub amount: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClaimReceiptResponse {
    pub claim_id: Uuid,
    pub remaining: String,
    pub exhausted: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClaimResponse {
    pub claim_id: Uuid,
    pub claimant_id: Uuid,
    pub amount: String,
    pub unit: String,
    pub created_at: DateTime<Utc>,
}

impl From<&ClaimRow> for ClaimResponse {
    fn from(c: &ClaimRow) -> Self {
        Self {
            claim_id: c.claim_id,
            claimant_id: c.claimant_id,
            amount: format_amount_milli(c.amount_milli),
            unit: c.unit.clone(),
            created_at: c.created_at,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClaimsResponse {
    pub claims: Vec<ClaimResponse>,
}

// ---------------------------------------------------------------------------
// Reservations / orders
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReserveRequest {
    pub buyer_id: Uuid,
    pub window_start: Option<DateTime<Utc>>,
    pub window_end: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderResponse {
    pub order_id: Uuid,
    pub listing_id: Uuid,
    pub buyer_id: Uuid,
    pub seller_id: Uuid,
    pub price_cents: i64,
    pub window_start: Option<DateTime<Utc>>,
    pub window_end: Option<DateTime<Utc>>,
    pub status: String,
    pub created_at: DateTime<Utc>,
}

impl From<&OrderRow> for OrderResponse {
    fn from(o: &OrderRow) -> Self {
        Self {
            order_id: o.order_id,
            listing_id: o.listing_id,
            buyer_id: o.buyer_id,
            seller_id: o.seller_id,
            price_cents: o.price_cents,
            window_start: o.window_start,
            window_end: o.window_end,
            status: o.status.as_str().to_string(),
            created_at: o.created_at,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SettleRequest {
    pub caller_id: Uuid,
}

// ---------------------------------------------------------------------------
// Recurrence expansion
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExpandRecurrenceRequest {
    /// Weekday name, e.g. "tuesday" or "tue".
    pub weekday: String,
    /// UTC wall-time start, "HH:MM".
    pub start: String,
    pub duration_minutes: u32,
    pub horizon_days: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExpandRecurrenceResponse {
    pub windows: Vec<PickupWindow>,
}
