//! Order records and the reservation arbiter.
//!
//! [`reserve_listing`] is the one place in the system where true atomicity
//! is required and provided: the status compare-and-swap and the order
//! insert commit as one transaction, so two racing buyers can never both
//! win. Everything else in this module is plain row access.

use anyhow::{anyhow, Context, Result};
use chrono::{DateTime, Utc};
use rpl_schemas::{ListingStatus, OrderStatus, PickupWindow};
use sqlx::{PgPool, Row};
use uuid::Uuid;

#[derive(Debug, Clone)]
pub struct OrderRow {
    pub order_id: Uuid,
    pub listing_id: Uuid,
    pub buyer_id: Uuid,
    pub seller_id: Uuid,
    pub price_cents: i64,
    pub window_start: Option<DateTime<Utc>>,
    pub window_end: Option<DateTime<Utc>>,
    pub status: OrderStatus,
    pub created_at: DateTime<Utc>,
}

fn row_to_order(row: &sqlx::postgres::PgRow) -> Result<OrderRow> {
    Ok(OrderRow {
        order_id: row.try_get("order_id")?,
        listing_id: row.try_get("listing_id")?,
        buyer_id: row.try_get("buyer_id")?,
        seller_id: row.try_get("seller_id")?,
        price_cents: row.try_get("price_cents")?,
        window_start: row.try_get("window_start")?,
        window_end: row.try_get("window_end")?,
        status: OrderStatus::parse(&row.try_get::<String, _>("status")?)?,
        created_at: row.try_get("created_at")?,
    })
}

/// Outcome of the reservation compare-and-swap.
#[derive(Debug)]
pub enum ReserveOutcome {
    /// This caller won; the order was created in the same transaction.
    Reserved(OrderRow),
    /// No such listing.
    NotFound,
    /// Listing exists but is no longer ACTIVE — another buyer won, or the
    /// listing reached a terminal state.
    NotActive { status: ListingStatus },
}

/// Atomically reserve an ACTIVE listing for `buyer_id` and create its order.
///
/// The UPDATE's `status = 'ACTIVE'` predicate is the compare-and-swap:
/// Postgres row locking serializes racing transactions, so exactly one
/// observes ACTIVE and commits. The loser sees zero rows updated and is told
/// why. Serialization failures and deadlocks surface as `sqlx::Error` for
/// the caller to classify via [`crate::is_transient`].
pub async fn reserve_listing(
    pool: &PgPool,
    listing_id: Uuid,
    buyer_id: Uuid,
    window: Option<PickupWindow>,
) -> Result<ReserveOutcome, sqlx::Error> {
    let (window_start, window_end) = match window {
        Some(w) => (Some(w.start), Some(w.end)),
        None => (None, None),
    };

    let mut tx = pool.begin().await?;

    let won = sqlx::query(
        r#"
        update listings
        set status = 'RESERVED',
            reserved_by = $2,
            window_start = $3,
            window_end = $4
        where listing_id = $1
          and status = 'ACTIVE'
        returning owner_id, price_cents
        "#,
    )
    .bind(listing_id)
    .bind(buyer_id)
    .bind(window_start)
    .bind(window_end)
    .fetch_optional(&mut *tx)
    .await?;

    let Some(listing) = won else {
        // Lost the CAS. Read the current status inside the same transaction
        // to distinguish "missing" from "already taken".
        let status: Option<(String,)> =
            sqlx::query_as::<_, (String,)>("select status from listings where listing_id = $1")
                .bind(listing_id)
                .fetch_optional(&mut *tx)
                .await?;
        tx.rollback().await?;

        return Ok(match status {
            None => ReserveOutcome::NotFound,
            Some((s,)) => ReserveOutcome::NotActive {
                status: ListingStatus::parse(&s).unwrap_or(ListingStatus::Cancelled),
            },
        });
    };

    let seller_id: Uuid = listing.try_get("owner_id")?;
    let price_cents: i64 = listing.try_get::<Option<i64>, _>("price_cents")?.unwrap_or(0);

    let order_id = Uuid::new_v4();
    let inserted = sqlx::query(
        r#"
        insert into orders (
          order_id, listing_id, buyer_id, seller_id, price_cents,
          window_start, window_end, status
        ) values (
          $1, $2, $3, $4, $5, $6, $7, 'RESERVED'
        )
        returning order_id, listing_id, buyer_id, seller_id, price_cents,
                  window_start, window_end, status, created_at
        "#,
    )
    .bind(order_id)
    .bind(listing_id)
    .bind(buyer_id)
    .bind(seller_id)
    .bind(price_cents)
    .bind(window_start)
    .bind(window_end)
    .fetch_one(&mut *tx)
    .await;

    let row = match inserted {
        Ok(row) => row,
        Err(e) if crate::is_unique_constraint_violation(&e, "uq_orders_live_listing") => {
            // Backstop: a live order already exists for this listing. The
            // CAS should make this unreachable; report it as a lost race.
            let _ = tx.rollback().await;
            return Ok(ReserveOutcome::NotActive {
                status: ListingStatus::Reserved,
            });
        }
        Err(e) => return Err(e),
    };

    let order = row_to_order(&row).map_err(|e| sqlx::Error::Decode(e.into()))?;
    tx.commit().await?;

    Ok(ReserveOutcome::Reserved(order))
}

/// The live (RESERVED) order for a listing, if any. At most one exists —
/// uq_orders_live_listing.
pub async fn fetch_live_order_by_listing(
    pool: &PgPool,
    listing_id: Uuid,
) -> Result<Option<OrderRow>> {
    let row = sqlx::query(
        r#"
        select order_id, listing_id, buyer_id, seller_id, price_cents,
               window_start, window_end, status, created_at
        from orders
        where listing_id = $1
          and status = 'RESERVED'
        "#,
    )
    .bind(listing_id)
    .fetch_optional(pool)
    .await
    .context("fetch_live_order_by_listing failed")?;

    row.as_ref().map(row_to_order).transpose()
}

pub async fn fetch_order(pool: &PgPool, order_id: Uuid) -> Result<Option<OrderRow>> {
    let row = sqlx::query(
        r#"
        select order_id, listing_id, buyer_id, seller_id, price_cents,
               window_start, window_end, status, created_at
        from orders
        where order_id = $1
        "#,
    )
    .bind(order_id)
    .fetch_optional(pool)
    .await
    .context("fetch_order failed")?;

    row.as_ref().map(row_to_order).transpose()
}

/// Outcome of settling a reserved order ([`complete_order`] /
/// [`cancel_order`]).
#[derive(Debug)]
pub enum SettleOutcome {
    /// Order and listing both moved to the settled status in one transaction.
    Settled(OrderRow),
    /// No such order.
    NotFound,
    /// Order exists but is not RESERVED.
    NotReserved { status: OrderStatus },
}

/// Transition an order RESERVED → COMPLETED and its listing RESERVED →
/// COMPLETED in a single transaction, so any subsequent read observes both
/// updated together.
pub async fn complete_order(pool: &PgPool, order_id: Uuid) -> Result<SettleOutcome> {
    let mut tx = pool.begin().await.context("complete_order begin failed")?;

    let done = sqlx::query(
        r#"
        update orders
        set status = 'COMPLETED'
        where order_id = $1
          and status = 'RESERVED'
        returning order_id, listing_id, buyer_id, seller_id, price_cents,
                  window_start, window_end, status, created_at
        "#,
    )
    .bind(order_id)
    .fetch_optional(&mut *tx)
    .await
    .context("complete_order order update failed")?;

    let Some(row) = done else {
        let status: Option<(String,)> =
            sqlx::query_as::<_, (String,)>("select status from orders where order_id = $1")
                .bind(order_id)
                .fetch_optional(&mut *tx)
                .await
                .context("complete_order status read failed")?;
        tx.rollback().await.ok();

        return Ok(match status {
            None => SettleOutcome::NotFound,
            Some((s,)) => SettleOutcome::NotReserved {
                status: OrderStatus::parse(&s)?,
            },
        });
    };

    let order = row_to_order(&row)?;

    let listing_updated = sqlx::query(
        r#"
        update listings
        set status = 'COMPLETED'
        where listing_id = $1
          and status = 'RESERVED'
        "#,
    )
    .bind(order.listing_id)
    .execute(&mut *tx)
    .await
    .context("complete_order listing update failed")?;

    if listing_updated.rows_affected() == 0 {
        // A RESERVED order always points at a RESERVED listing; anything
        // else is corruption, not a user-facing conflict.
        tx.rollback().await.ok();
        return Err(anyhow!(
            "integrity: order {} RESERVED but listing {} not RESERVED",
            order.order_id,
            order.listing_id
        ));
    }

    tx.commit().await.context("complete_order commit failed")?;

    Ok(SettleOutcome::Settled(order))
}

/// Transition an order RESERVED → CANCELLED and its listing RESERVED →
/// CANCELLED in one transaction. Manual operation only — nothing in the
/// system cancels automatically.
pub async fn cancel_order(pool: &PgPool, order_id: Uuid) -> Result<SettleOutcome> {
    let mut tx = pool.begin().await.context("cancel_order begin failed")?;

    let done = sqlx::query(
        r#"
        update orders
        set status = 'CANCELLED'
        where order_id = $1
          and status = 'RESERVED'
        returning order_id, listing_id, buyer_id, seller_id, price_cents,
                  window_start, window_end, status, created_at
        "#,
    )
    .bind(order_id)
    .fetch_optional(&mut *tx)
    .await
    .context("cancel_order order update failed")?;

    let Some(row) = done else {
        let status: Option<(String,)> =
            sqlx::query_as::<_, (String,)>("select status from orders where order_id = $1")
                .bind(order_id)
                .fetch_optional(&mut *tx)
                .await
                .context("cancel_order status read failed")?;
        tx.rollback().await.ok();

        return Ok(match status {
            None => SettleOutcome::NotFound,
            Some((s,)) => SettleOutcome::NotReserved {
                status: OrderStatus::parse(&s)?,
            },
        });
    };

    let order = row_to_order(&row)?;

    let listing_updated = sqlx::query(
        r#"
        update listings
        set status = 'CANCELLED'
        where listing_id = $1
          and status = 'RESERVED'
        "#,
    )
    .bind(order.listing_id)
    .execute(&mut *tx)
    .await
    .context("cancel_order listing update failed")?;

    if listing_updated.rows_affected() == 0 {
        tx.rollback().await.ok();
        return Err(anyhow!(
            "integrity: order {} RESERVED but listing {} not RESERVED",
            order.order_id,
            order.listing_id
        ));
    }

    tx.commit().await.context("cancel_order commit failed")?;

    Ok(SettleOutcome::Settled(order))
}
