//! Resource catalog: the mutable listing records read by every engine.

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use rpl_schemas::{AllocationPolicy, ListingStatus};
use sqlx::{PgPool, Row};
use uuid::Uuid;

#[derive(Debug, Clone)]
pub struct NewListing {
    pub listing_id: Uuid,
    pub owner_id: Uuid,
    pub title: String,
    pub policy: AllocationPolicy,
    pub capacity_milli: i64,
    pub unit: String,
    /// Exclusive-policy listings carry an asking price; partial ones do not.
    pub price_cents: Option<i64>,
}

#[derive(Debug, Clone)]
pub struct ListingRow {
    pub listing_id: Uuid,
    pub owner_id: Uuid,
    pub title: String,
    pub policy: AllocationPolicy,
    pub capacity_milli: i64,
    pub unit: String,
    pub remaining_milli: i64,
    pub price_cents: Option<i64>,
    pub status: ListingStatus,
    pub reserved_by: Option<Uuid>,
    pub window_start: Option<DateTime<Utc>>,
    pub window_end: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

const LISTING_COLUMNS: &str = r#"
    listing_id,
    owner_id,
    title,
    policy,
    capacity_milli,
    unit,
    remaining_milli,
    price_cents,
    status,
    reserved_by,
    window_start,
    window_end,
    created_at
"#;

fn row_to_listing(row: &sqlx::postgres::PgRow) -> Result<ListingRow> {
    Ok(ListingRow {
        listing_id: row.try_get("listing_id")?,
        owner_id: row.try_get("owner_id")?,
        title: row.try_get("title")?,
        policy: AllocationPolicy::parse(&row.try_get::<String, _>("policy")?)?,
        capacity_milli: row.try_get("capacity_milli")?,
        unit: row.try_get("unit")?,
        remaining_milli: row.try_get("remaining_milli")?,
        price_cents: row.try_get("price_cents")?,
        status: ListingStatus::parse(&row.try_get::<String, _>("status")?)?,
        reserved_by: row.try_get("reserved_by")?,
        window_start: row.try_get("window_start")?,
        window_end: row.try_get("window_end")?,
        created_at: row.try_get("created_at")?,
    })
}

/// Insert a new listing. Capacity is set once here; remaining starts equal
/// to capacity and status starts ACTIVE (schema defaults).
pub async fn insert_listing(pool: &PgPool, l: &NewListing) -> Result<()> {
    sqlx::query(
        r#"
        insert into listings (
          listing_id, owner_id, title, policy, capacity_milli, unit,
          remaining_milli, price_cents
        ) values (
          $1, $2, $3, $4, $5, $6, $5, $7
        )
        "#,
    )
    .bind(l.listing_id)
    .bind(l.owner_id)
    .bind(&l.title)
    .bind(l.policy.as_str())
    .bind(l.capacity_milli)
    .bind(&l.unit)
    .bind(l.price_cents)
    .execute(pool)
    .await
    .context("insert_listing failed")?;
    Ok(())
}

pub async fn fetch_listing(pool: &PgPool, listing_id: Uuid) -> Result<Option<ListingRow>> {
    let row = sqlx::query(&format!(
        "select {LISTING_COLUMNS} from listings where listing_id = $1"
    ))
    .bind(listing_id)
    .fetch_optional(pool)
    .await
    .context("fetch_listing failed")?;

    row.as_ref().map(row_to_listing).transpose()
}

/// Filter for [`list_claimable`]. All fields optional; defaults list every
/// ACTIVE listing, newest first.
#[derive(Debug, Clone, Default)]
pub struct ClaimableFilter {
    pub policy: Option<AllocationPolicy>,
    pub owner_id: Option<Uuid>,
    pub limit: Option<i64>,
}

/// Pure read: every ACTIVE listing matching the filter. No side effects.
pub async fn list_claimable(pool: &PgPool, filter: &ClaimableFilter) -> Result<Vec<ListingRow>> {
    let rows = sqlx::query(&format!(
        r#"
        select {LISTING_COLUMNS}
        from listings
        where status = 'ACTIVE'
          and ($1::text is null or policy = $1)
          and ($2::uuid is null or owner_id = $2)
        order by created_at desc
        limit $3
        "#
    ))
    .bind(filter.policy.map(|p| p.as_str()))
    .bind(filter.owner_id)
    .bind(filter.limit.unwrap_or(100))
    .fetch_all(pool)
    .await
    .context("list_claimable failed")?;

    rows.iter().map(row_to_listing).collect()
}

/// Write back the derived remaining and, when exhausted, flip the listing to
/// CLAIMED_OUT — guarded on the listing still being ACTIVE so a concurrent
/// terminal transition can never be overwritten.
///
/// Returns the number of rows updated (0 = listing missing or no longer
/// ACTIVE).
pub async fn write_remaining(
    pool: &PgPool,
    listing_id: Uuid,
    remaining_milli: i64,
    exhausted: bool,
) -> Result<u64> {
    let res = sqlx::query(
        r#"
        update listings
        set remaining_milli = $2,
            status = case when $3 then 'CLAIMED_OUT' else status end
        where listing_id = $1
          and status = 'ACTIVE'
        "#,
    )
    .bind(listing_id)
    .bind(remaining_milli)
    .bind(exhausted)
    .execute(pool)
    .await
    .context("write_remaining failed")?;

    Ok(res.rows_affected())
}

/// Delete a listing iff it is still ACTIVE. Claims cascade; orders never
/// reference an ACTIVE listing, so the FK cannot fire.
///
/// Returns the number of rows deleted (0 = missing or not ACTIVE).
pub async fn delete_active_listing(pool: &PgPool, listing_id: Uuid) -> Result<u64> {
    let res = sqlx::query(
        r#"
        delete from listings
        where listing_id = $1
          and status = 'ACTIVE'
        "#,
    )
    .bind(listing_id)
    .execute(pool)
    .await
    .context("delete_active_listing failed")?;

    Ok(res.rows_affected())
}
