//! Axum router and all HTTP handlers for rpl-daemon.
//!
//! `build_router` is the single entry point; `main.rs` calls it and attaches
//! middleware layers. All handlers are `pub(crate)` so the scenario tests in
//! `tests/` can compose the router directly.

use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use chrono::{NaiveTime, Utc, Weekday};
use rpl_allocation::{expand_recurrence, parse_quantity, RecurrenceRule};
use rpl_schemas::{AllocationPolicy, PickupWindow};
use rpl_service::MarketError;
use uuid::Uuid;

use crate::{
    api_types::{
        ClaimReceiptResponse, ClaimResponse, ClaimsResponse, CreateListingRequest,
        DeleteListingQuery, ErrorResponse, ExpandRecurrenceRequest, ExpandRecurrenceResponse,
        HealthResponse, ListingResponse, ListingsQuery, ListingsResponse, OrderResponse,
        ReserveRequest, SettleRequest, SubmitClaimRequest,
    },
    state::AppState,
};

// ---------------------------------------------------------------------------
// Router
// ---------------------------------------------------------------------------

/// Build the complete application router wired to the given shared state.
///
/// Middleware layers (CORS, tracing) are **not** applied here; `main.rs`
/// attaches them after this call so tests can use the bare router.
pub fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/v1/health", get(health))
        .route("/v1/listings", get(list_listings).post(create_listing))
        .route("/v1/listings/:id", get(get_listing).delete(delete_listing))
        .route("/v1/listings/:id/claims", get(list_claims).post(submit_claim))
        .route("/v1/listings/:id/reserve", post(reserve))
        .route("/v1/orders/:id/complete", post(complete_order))
        .route("/v1/orders/:id/cancel", post(cancel_order))
        .route("/v1/recurrence/expand", post(expand))
        .with_state(state)
}

// ---------------------------------------------------------------------------
// Error mapping
// ---------------------------------------------------------------------------

fn market_error_response(err: MarketError) -> Response {
    let (status, kind, remaining) = match &err {
        MarketError::Validation { remaining_milli, .. } => (
            StatusCode::BAD_REQUEST,
            "validation",
            remaining_milli.as_ref().map(|m| rpl_allocation::format_amount_milli(*m)),
        ),
        MarketError::NotFound { .. } => (StatusCode::NOT_FOUND, "not_found", None),
        MarketError::Conflict { .. } => (StatusCode::CONFLICT, "conflict", None),
        MarketError::Transient { .. } => (StatusCode::SERVICE_UNAVAILABLE, "transient", None),
        MarketError::Storage(_) => (StatusCode::INTERNAL_SERVER_ERROR, "storage", None),
    };

    if matches!(err, MarketError::Storage(_)) {
        tracing::error!(error = %err, "storage error surfaced to client");
    }

    (
        status,
        Json(ErrorResponse {
            kind: kind.to_string(),
            error: err.to_string(),
            remaining,
        }),
    )
        .into_response()
}

fn bad_request(msg: impl Into<String>) -> Response {
    (
        StatusCode::BAD_REQUEST,
        Json(ErrorResponse {
            kind: "validation".to_string(),
            error: msg.into(),
            remaining: None,
        }),
    )
        .into_response()
}

// ---------------------------------------------------------------------------
// GET /v1/health
// ---------------------------------------------------------------------------

pub(crate) async fn health(State(st): State<Arc<AppState>>) -> impl IntoResponse {
    (
        StatusCode::OK,
        Json(HealthResponse {
            ok: true,
            service: st.build.service,
            version: st.build.version,
        }),
    )
}

// ---------------------------------------------------------------------------
// GET /v1/listings — pure read, no side effects
// ---------------------------------------------------------------------------

pub(crate) async fn list_listings(
    State(st): State<Arc<AppState>>,
    Query(q): Query<ListingsQuery>,
) -> Response {
    let policy = match q.policy.as_deref().map(AllocationPolicy::parse) {
        None => None,
        Some(Ok(p)) => Some(p),
        Some(Err(e)) => return bad_request(e.to_string()),
    };

    let filter = rpl_service::ClaimableFilter {
        policy,
        owner_id: q.owner_id,
        limit: q.limit,
    };

    match st.market.list_claimable(&filter).await {
        Ok(rows) => Json(ListingsResponse {
            listings: rows.iter().map(ListingResponse::from).collect(),
        })
        .into_response(),
        Err(e) => market_error_response(e),
    }
}

// ---------------------------------------------------------------------------
// POST /v1/listings
// ---------------------------------------------------------------------------

pub(crate) async fn create_listing(
    State(st): State<Arc<AppState>>,
    Json(req): Json<CreateListingRequest>,
) -> Response {
    let policy = match AllocationPolicy::parse(&req.policy) {
        Ok(p) => p,
        Err(e) => return bad_request(e.to_string()),
    };

    let quantity = parse_quantity(&req.quantity);

    match st
        .market
        .create_listing(rpl_service::CreateListing {
            owner_id: req.owner_id,
            title: req.title,
            policy,
            quantity,
            price_cents: req.price_cents,
        })
        .await
    {
        Ok(row) => (StatusCode::CREATED, Json(ListingResponse::from(&row))).into_response(),
        Err(e) => market_error_response(e),
    }
}

// ---------------------------------------------------------------------------
// GET /v1/listings/:id
// ---------------------------------------------------------------------------

pub(crate) async fn get_listing(
    State(st): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Response {
    match st.market.fetch_listing(id).await {
        Ok(Some(row)) => Json(ListingResponse::from(&row)).into_response(),
        Ok(None) => market_error_response(MarketError::NotFound { entity: "listing", id }),
        Err(e) => market_error_response(e),
    }
}

// ---------------------------------------------------------------------------
// DELETE /v1/listings/:id
// ---------------------------------------------------------------------------

pub(crate) async fn delete_listing(
    State(st): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    Query(q): Query<DeleteListingQuery>,
) -> Response {
    match st.market.delete_listing(id, q.caller_id).await {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(e) => market_error_response(e),
    }
}

// ---------------------------------------------------------------------------
// GET /v1/listings/:id/claims
// ---------------------------------------------------------------------------

pub(crate) async fn list_claims(
    State(st): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Response {
    match st.market.list_claims(id).await {
        Ok(rows) => Json(ClaimsResponse {
            claims: rows.iter().map(ClaimResponse::from).collect(),
        })
        .into_response(),
        Err(e) => market_error_response(e),
    }
}

// ---------------------------------------------------------------------------
// POST /v1/listings/:id/claims
// ---------------------------------------------------------------------------

pub(crate) async fn submit_claim(
    State(st): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    Json(req): Json<SubmitClaimRequest>,
) -> Response {
    let amount = parse_quantity(&req.amount);

    match st.market.submit_claim(id, req.claimant_id, amount).await {
        Ok(receipt) => (
            StatusCode::CREATED,
            Json(ClaimReceiptResponse {
                claim_id: receipt.claim_id,
                remaining: rpl_allocation::format_amount_milli(receipt.remaining_milli),
                exhausted: receipt.exhausted,
            }),
        )
            .into_response(),
        Err(e) => market_error_response(e),
    }
}

// ---------------------------------------------------------------------------
// POST /v1/listings/:id/reserve
// ---------------------------------------------------------------------------

pub(crate) async fn reserve(
    State(st): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    Json(req): Json<ReserveRequest>,
) -> Response {
    let window = match (req.window_start, req.window_end) {
        (Some(start), Some(end)) if start < end => Some(PickupWindow { start, end }),
        (Some(_), Some(_)) => return bad_request("window_start must precede window_end"),
        (None, None) => None,
        _ => return bad_request("window_start and window_end must be given together"),
    };

    match st.market.try_reserve(id, req.buyer_id, window).await {
        Ok(order) => (StatusCode::CREATED, Json(OrderResponse::from(&order))).into_response(),
        Err(e) => market_error_response(e),
    }
}

// ---------------------------------------------------------------------------
// POST /v1/orders/:id/complete  /v1/orders/:id/cancel
// ---------------------------------------------------------------------------

pub(crate) async fn complete_order(
    State(st): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    Json(req): Json<SettleRequest>,
) -> Response {
    match st.market.mark_completed(id, req.caller_id).await {
        Ok(order) => Json(OrderResponse::from(&order)).into_response(),
        Err(e) => market_error_response(e),
    }
}

pub(crate) async fn cancel_order(
    State(st): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    Json(req): Json<SettleRequest>,
) -> Response {
    match st.market.cancel_reservation(id, req.caller_id).await {
        Ok(order) => Json(OrderResponse::from(&order)).into_response(),
        Err(e) => market_error_response(e),
    }
}

// ---------------------------------------------------------------------------
// POST /v1/recurrence/expand
// ---------------------------------------------------------------------------

pub(crate) async fn expand(Json(req): Json<ExpandRecurrenceRequest>) -> Response {
    let weekday: Weekday = match req.weekday.parse() {
        Ok(w) => w,
        Err(_) => return bad_request(format!("invalid weekday: {}", req.weekday)),
    };
    let start = match NaiveTime::parse_from_str(&req.start, "%H:%M") {
        Ok(t) => t,
        Err(_) => return bad_request(format!("invalid start time: {}", req.start)),
    };

    let rule = RecurrenceRule {
        weekday,
        start,
        duration_minutes: req.duration_minutes,
    };
    let windows = expand_recurrence(&rule, Utc::now(), req.horizon_days);

    Json(ExpandRecurrenceResponse { windows }).into_response()
}
