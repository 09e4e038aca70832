//! rpl-service
//!
//! The single source of truth for allocation and lifecycle decisions.
//! Presentation surfaces call [`Marketplace`] and never re-derive listing
//! status themselves; all aggregation and transition logic funnels through
//! here into `rpl-allocation` (decisions) and `rpl-db` (durability).

mod error;

pub use error::MarketError;
pub use rpl_db::{ClaimableFilter, ClaimRow, ListingRow, OrderRow};

use anyhow::Context;
use rpl_allocation::{
    can_delete_listing, compute_remaining, listing_transition, validate_claim, ClaimRejection,
};
use rpl_db::{catalog, claims, orders, NewClaim, NewListing, ReserveOutcome, SettleOutcome};
use rpl_schemas::{AllocationPolicy, ListingStatus, PickupWindow, Quantity, UserId};
use sqlx::PgPool;
use tracing::{info, warn};
use uuid::Uuid;

/// Extra attempts after the first try when the store reports contention.
const MAX_TRANSIENT_RETRIES: u32 = 1;

/// Result of a successful claim submission.
#[derive(Debug, Clone)]
pub struct ClaimReceipt {
    pub claim_id: Uuid,
    /// Derived remaining after this claim, in millis.
    pub remaining_milli: i64,
    /// True when this claim exhausted the listing (status flipped to
    /// CLAIMED_OUT).
    pub exhausted: bool,
}

/// Parameters for [`Marketplace::create_listing`].
#[derive(Debug, Clone)]
pub struct CreateListing {
    pub owner_id: UserId,
    pub title: String,
    pub policy: AllocationPolicy,
    pub quantity: Quantity,
    /// Asking price for exclusive listings; ignored for partial ones.
    pub price_cents: Option<i64>,
}

/// The marketplace reservation/claim subsystem behind one narrow interface.
#[derive(Clone)]
pub struct Marketplace {
    pool: PgPool,
}

impl Marketplace {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Create a listing. Capacity is fixed here, once; remaining starts at
    /// capacity and status at ACTIVE.
    pub async fn create_listing(&self, req: CreateListing) -> Result<ListingRow, MarketError> {
        let listing_id = Uuid::new_v4();
        let price_cents = match req.policy {
            AllocationPolicy::Exclusive => req.price_cents,
            AllocationPolicy::Partial => None,
        };

        catalog::insert_listing(
            &self.pool,
            &NewListing {
                listing_id,
                owner_id: req.owner_id,
                title: req.title,
                policy: req.policy,
                capacity_milli: req.quantity.amount_milli,
                unit: req.quantity.unit,
                price_cents,
            },
        )
        .await?;

        self.fetch_listing_or_not_found(listing_id).await
    }

    /// Pure read: ACTIVE listings matching the filter. No side effects.
    pub async fn list_claimable(
        &self,
        filter: &ClaimableFilter,
    ) -> Result<Vec<ListingRow>, MarketError> {
        Ok(catalog::list_claimable(&self.pool, filter).await?)
    }

    pub async fn fetch_listing(
        &self,
        listing_id: Uuid,
    ) -> Result<Option<ListingRow>, MarketError> {
        Ok(catalog::fetch_listing(&self.pool, listing_id).await?)
    }

    /// Submit a partial claim: validate → persist → re-aggregate → write
    /// back.
    ///
    /// Validation is against the listing's current stored remaining, NOT
    /// re-checked atomically with the append — two claimants racing on the
    /// last unit can both land (documented tradeoff; the exclusive policy is
    /// the path with single-winner semantics). If the final write fails the
    /// claim row is NOT rolled back: the ledger stays the source of truth
    /// and the next successful aggregation converges remaining.
    pub async fn submit_claim(
        &self,
        listing_id: Uuid,
        claimant_id: UserId,
        amount: Quantity,
    ) -> Result<ClaimReceipt, MarketError> {
        // requesting → validating
        let listing = self.fetch_listing_or_not_found(listing_id).await?;

        if listing.policy != AllocationPolicy::Partial {
            return Err(MarketError::conflict("listing is not open to partial claims"));
        }
        if listing.status != ListingStatus::Active {
            return Err(MarketError::conflict("listing is no longer claimable"));
        }

        validate_claim(
            claimant_id,
            listing.owner_id,
            amount.amount_milli,
            listing.remaining_milli,
        )
        .map_err(|rej| match rej {
            ClaimRejection::ExceedsRemaining { remaining_milli, .. } => MarketError::Validation {
                reason: rej.to_string(),
                remaining_milli: Some(remaining_milli),
            },
            other => MarketError::validation(other.to_string()),
        })?;

        // validating → persisted: the claim record is immutable from here on.
        let claim_id = Uuid::new_v4();
        claims::insert_claim(
            &self.pool,
            &NewClaim {
                claim_id,
                listing_id,
                claimant_id,
                amount_milli: amount.amount_milli,
                unit: amount.unit,
            },
        )
        .await?;

        // persisted → aggregating: re-read the ENTIRE current claim set.
        let ledger = claims::fetch_claim_amounts(&self.pool, listing_id).await?;
        let remaining = compute_remaining(listing.capacity_milli, &ledger);

        // aggregating → updating-listing
        if remaining.exhausted {
            listing_transition(ListingStatus::Active, ListingStatus::ClaimedOut)
                .map_err(|e| MarketError::conflict(e.to_string()))?;
        }

        let updated = catalog::write_remaining(
            &self.pool,
            listing_id,
            remaining.remaining_milli,
            remaining.exhausted,
        )
        .await
        .context("claim persisted but listing write-back failed; claim not rolled back")?;

        if updated == 0 {
            // Listing left ACTIVE concurrently. The claim stays in the
            // ledger (accepted inconsistency); surface the conflict.
            warn!(
                %listing_id, %claim_id,
                "listing changed during claim write-back; claim retained in ledger"
            );
            return Err(MarketError::conflict(
                "listing changed while the claim was being recorded",
            ));
        }

        info!(
            %listing_id, %claim_id,
            remaining_milli = remaining.remaining_milli,
            exhausted = remaining.exhausted,
            "claim accepted"
        );

        Ok(ClaimReceipt {
            claim_id,
            remaining_milli: remaining.remaining_milli,
            exhausted: remaining.exhausted,
        })
    }

    /// Claims recorded against a listing, oldest first.
    pub async fn list_claims(&self, listing_id: Uuid) -> Result<Vec<ClaimRow>, MarketError> {
        Ok(claims::fetch_claims(&self.pool, listing_id).await?)
    }

    /// Exclusive-policy purchase: atomic single-winner reservation.
    ///
    /// Retries once on storage contention; a lost race surfaces as
    /// `Conflict` with the user-facing "no longer available" message, never
    /// as a generic failure.
    pub async fn try_reserve(
        &self,
        listing_id: Uuid,
        buyer_id: UserId,
        window: Option<PickupWindow>,
    ) -> Result<OrderRow, MarketError> {
        // Owner cannot buy their own listing; checked before touching the
        // arbiter so a self-purchase never consumes the reservation.
        let listing = self.fetch_listing_or_not_found(listing_id).await?;
        if listing.owner_id == buyer_id {
            return Err(MarketError::validation("cannot reserve your own listing"));
        }
        if listing.policy != AllocationPolicy::Exclusive {
            return Err(MarketError::conflict("listing is not sold as a single unit"));
        }

        let mut attempt = 0u32;
        loop {
            match orders::reserve_listing(&self.pool, listing_id, buyer_id, window).await {
                Ok(ReserveOutcome::Reserved(order)) => {
                    info!(%listing_id, order_id = %order.order_id, "reservation won");
                    return Ok(order);
                }
                Ok(ReserveOutcome::NotFound) => {
                    return Err(MarketError::NotFound { entity: "listing", id: listing_id });
                }
                Ok(ReserveOutcome::NotActive { status }) => {
                    return Err(MarketError::conflict(format!(
                        "listing no longer available (status {})",
                        status.as_str()
                    )));
                }
                Err(e) if rpl_db::is_transient(&e) && attempt < MAX_TRANSIENT_RETRIES => {
                    attempt += 1;
                    warn!(%listing_id, attempt, "transient contention on reserve; retrying");
                }
                Err(e) if rpl_db::is_transient(&e) => {
                    return Err(MarketError::Transient { detail: e.to_string() });
                }
                Err(e) => {
                    return Err(MarketError::Storage(
                        anyhow::Error::new(e).context("reserve_listing failed"),
                    ));
                }
            }
        }
    }

    /// Owner confirms pickup: order and listing move to COMPLETED together.
    pub async fn mark_completed(
        &self,
        order_id: Uuid,
        caller_id: UserId,
    ) -> Result<OrderRow, MarketError> {
        let order = orders::fetch_order(&self.pool, order_id)
            .await?
            .ok_or(MarketError::NotFound { entity: "order", id: order_id })?;

        if order.seller_id != caller_id {
            return Err(MarketError::validation(
                "only the listing owner can confirm pickup",
            ));
        }

        match orders::complete_order(&self.pool, order_id).await? {
            SettleOutcome::Settled(order) => Ok(order),
            SettleOutcome::NotFound => {
                Err(MarketError::NotFound { entity: "order", id: order_id })
            }
            SettleOutcome::NotReserved { status } => Err(MarketError::conflict(format!(
                "order cannot be completed from status {}",
                status.as_str()
            ))),
        }
    }

    /// [`Self::mark_completed`] addressed by listing instead of order.
    pub async fn mark_completed_by_listing(
        &self,
        listing_id: Uuid,
        caller_id: UserId,
    ) -> Result<OrderRow, MarketError> {
        let order = orders::fetch_live_order_by_listing(&self.pool, listing_id)
            .await?
            .ok_or(MarketError::NotFound { entity: "listing", id: listing_id })?;
        self.mark_completed(order.order_id, caller_id).await
    }

    /// Manual cancellation of a live reservation. Never automatic; allowed
    /// for the buyer or the seller.
    pub async fn cancel_reservation(
        &self,
        order_id: Uuid,
        caller_id: UserId,
    ) -> Result<OrderRow, MarketError> {
        let order = orders::fetch_order(&self.pool, order_id)
            .await?
            .ok_or(MarketError::NotFound { entity: "order", id: order_id })?;

        if caller_id != order.buyer_id && caller_id != order.seller_id {
            return Err(MarketError::validation(
                "only the buyer or seller can cancel a reservation",
            ));
        }

        match orders::cancel_order(&self.pool, order_id).await? {
            SettleOutcome::Settled(order) => Ok(order),
            SettleOutcome::NotFound => {
                Err(MarketError::NotFound { entity: "order", id: order_id })
            }
            SettleOutcome::NotReserved { status } => Err(MarketError::conflict(format!(
                "order cannot be cancelled from status {}",
                status.as_str()
            ))),
        }
    }

    /// Owner-only delete, legal only while ACTIVE.
    pub async fn delete_listing(
        &self,
        listing_id: Uuid,
        caller_id: UserId,
    ) -> Result<(), MarketError> {
        let listing = self.fetch_listing_or_not_found(listing_id).await?;

        if listing.owner_id != caller_id {
            return Err(MarketError::validation(
                "only the owner can delete a listing",
            ));
        }
        if !can_delete_listing(listing.status) {
            return Err(MarketError::conflict(format!(
                "listing cannot be deleted from status {}",
                listing.status.as_str()
            )));
        }

        // Conditional delete re-asserts the guard; zero rows means the
        // status moved between the read above and this statement.
        let deleted = catalog::delete_active_listing(&self.pool, listing_id).await?;
        if deleted == 0 {
            return Err(MarketError::conflict(
                "listing changed while the delete was in flight",
            ));
        }
        Ok(())
    }

    async fn fetch_listing_or_not_found(
        &self,
        listing_id: Uuid,
    ) -> Result<ListingRow, MarketError> {
        catalog::fetch_listing(&self.pool, listing_id)
            .await?
            .ok_or(MarketError::NotFound { entity: "listing", id: listing_id })
    }
}
