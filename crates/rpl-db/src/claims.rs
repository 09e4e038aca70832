//! Claim ledger: append-only records of partial claims against a listing.
//!
//! There is deliberately no UPDATE or DELETE path for claims — once written
//! a claim is immutable, and remaining capacity is always re-derived from
//! the full set.

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use sqlx::{PgPool, Row};
use uuid::Uuid;

#[derive(Debug, Clone)]
pub struct NewClaim {
    pub claim_id: Uuid,
    pub listing_id: Uuid,
    pub claimant_id: Uuid,
    pub amount_milli: i64,
    pub unit: String,
}

#[derive(Debug, Clone)]
pub struct ClaimRow {
    pub claim_id: Uuid,
    pub listing_id: Uuid,
    pub claimant_id: Uuid,
    pub amount_milli: i64,
    pub unit: String,
    pub created_at: DateTime<Utc>,
}

/// Append one claim to the ledger.
pub async fn insert_claim(pool: &PgPool, c: &NewClaim) -> Result<()> {
    sqlx::query(
        r#"
        insert into claims (
          claim_id, listing_id, claimant_id, amount_milli, unit
        ) values (
          $1, $2, $3, $4, $5
        )
        "#,
    )
    .bind(c.claim_id)
    .bind(c.listing_id)
    .bind(c.claimant_id)
    .bind(c.amount_milli)
    .bind(&c.unit)
    .execute(pool)
    .await
    .context("insert_claim failed")?;
    Ok(())
}

/// Fetch every claim magnitude against a listing — the aggregation engine's
/// input. Always re-read immediately before recomputing remaining.
pub async fn fetch_claim_amounts(pool: &PgPool, listing_id: Uuid) -> Result<Vec<i64>> {
    let rows: Vec<(i64,)> = sqlx::query_as::<_, (i64,)>(
        r#"
        select amount_milli
        from claims
        where listing_id = $1
        "#,
    )
    .bind(listing_id)
    .fetch_all(pool)
    .await
    .context("fetch_claim_amounts failed")?;

    Ok(rows.into_iter().map(|(a,)| a).collect())
}

/// Full claim rows for a listing, oldest first.
pub async fn fetch_claims(pool: &PgPool, listing_id: Uuid) -> Result<Vec<ClaimRow>> {
    let rows = sqlx::query(
        r#"
        select claim_id, listing_id, claimant_id, amount_milli, unit, created_at
        from claims
        where listing_id = $1
        order by created_at asc
        "#,
    )
    .bind(listing_id)
    .fetch_all(pool)
    .await
    .context("fetch_claims failed")?;

    rows.iter()
        .map(|row| {
            Ok(ClaimRow {
                claim_id: row.try_get("claim_id")?,
                listing_id: row.try_get("listing_id")?,
                claimant_id: row.try_get("claimant_id")?,
                amount_milli: row.try_get("amount_milli")?,
                unit: row.try_get("unit")?,
                created_at: row.try_get("created_at")?,
            })
        })
        .collect()
}
