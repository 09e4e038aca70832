//! rpl-db
//!
//! PostgreSQL persistence layer: the resource catalog (listings), the
//! append-only claim ledger, and the order records — plus the one genuinely
//! atomic operation in the system, the reservation compare-and-swap in
//! [`orders::reserve_listing`].
//!
//! Error idiom: `anyhow::Result` with `.context(...)` for infrastructure
//! failures; expected branches (missing row, lost race) are outcome enums,
//! not errors.

use anyhow::{Context, Result};
use sqlx::{postgres::PgPoolOptions, PgPool};

pub mod catalog;
pub mod claims;
pub mod orders;

pub use catalog::{ClaimableFilter, ListingRow, NewListing};
pub use claims::{ClaimRow, NewClaim};
pub use orders::{OrderRow, ReserveOutcome, SettleOutcome};

pub const ENV_DB_URL: &str = "RPL_DATABASE_URL";

/// Connect to Postgres using RPL_DATABASE_URL.
pub async fn connect_from_env() -> Result<PgPool> {
    let url = std::env::var(ENV_DB_URL)
        .with_context(|| format!("missing env var {ENV_DB_URL}"))?;

    let pool = PgPoolOptions::new()
        .max_connections(10)
        .connect(&url)
        .await
        .context("failed to connect to Postgres")?;

    Ok(pool)
}

/// Run embedded SQLx migrations.
pub async fn migrate(pool: &PgPool) -> Result<()> {
    sqlx::migrate!("./migrations")
        .run(pool)
        .await
        .context("db migrate failed")?;
    Ok(())
}

/// Simple status query (connectivity + schema presence).
pub async fn status(pool: &PgPool) -> Result<DbStatus> {
    let (one,): (i32,) = sqlx::query_as::<_, (i32,)>("select 1")
        .fetch_one(pool)
        .await
        .context("status connectivity query failed")?;
    let ok = one == 1;

    let (exists,): (bool,) = sqlx::query_as::<_, (bool,)>(
        r#"
        select exists (
            select 1
            from information_schema.tables
            where table_schema='public' and table_name='listings'
        )
        "#,
    )
    .fetch_one(pool)
    .await
    .context("status table-exists query failed")?;

    Ok(DbStatus { ok, has_listings_table: exists })
}

#[derive(Debug, Clone)]
pub struct DbStatus {
    pub ok: bool,
    pub has_listings_table: bool,
}

/// Count orders that are live (RESERVED) right now.
/// Used by CLI guardrails to prevent accidental migration of a DB with
/// reservations in flight.
pub async fn count_live_reserved_orders(pool: &PgPool) -> Result<i64> {
    // If schema doesn't exist yet, treat as 0 (safe) rather than failing.
    let st = status(pool).await?;
    if !st.has_listings_table {
        return Ok(0);
    }

    let (n,): (i64,) = sqlx::query_as::<_, (i64,)>(
        r#"
        select count(*)::bigint
        from orders
        where status = 'RESERVED'
        "#,
    )
    .fetch_one(pool)
    .await
    .context("count_live_reserved_orders failed")?;

    Ok(n)
}

/// Detect a Postgres unique constraint violation by name.
pub fn is_unique_constraint_violation(err: &sqlx::Error, constraint: &str) -> bool {
    match err {
        sqlx::Error::Database(db_err) => {
            db_err.constraint() == Some(constraint)
                || db_err.code().as_deref() == Some("23505")
                    && db_err.constraint() == Some(constraint)
        }
        _ => false,
    }
}

/// Classify storage-layer failures that are safe for the caller to retry:
/// serialization failure (40001), deadlock (40P01), and pool timeouts.
pub fn is_transient(err: &sqlx::Error) -> bool {
    match err {
        sqlx::Error::Database(db_err) => {
            matches!(db_err.code().as_deref(), Some("40001") | Some("40P01"))
        }
        sqlx::Error::PoolTimedOut => true,
        _ => false,
    }
}
