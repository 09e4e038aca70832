//! Replate operator CLI: database utilities and local-dev seeding.

use anyhow::Result;
use clap::{Parser, Subcommand};
use rpl_allocation::parse_quantity;
use rpl_schemas::AllocationPolicy;
use rpl_service::{CreateListing, Marketplace};
use uuid::Uuid;

#[derive(Parser)]
#[command(name = "rpl")]
#[command(about = "Replate marketplace core CLI", long_about = None)]
struct Cli {
    #[command(subcommand)]
    cmd: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Database commands
    Db {
        #[command(subcommand)]
        cmd: DbCmd,
    },

    /// Listing utilities (local development)
    Listing {
        #[command(subcommand)]
        cmd: ListingCmd,
    },
}

#[derive(Subcommand)]
enum DbCmd {
    Status,

    /// Apply SQL migrations. Guardrail: refuses when any reservation is live
    /// (RESERVED orders exist) unless --yes is provided.
    Migrate {
        /// Acknowledge you are migrating a DB with reservations in flight.
        #[arg(long, default_value_t = false)]
        yes: bool,
    },
}

#[derive(Subcommand)]
enum ListingCmd {
    /// Insert a listing (prints the new listing_id).
    Seed {
        /// Owner user id; a fresh one is generated when omitted.
        #[arg(long)]
        owner: Option<Uuid>,

        #[arg(long)]
        title: String,

        /// PARTIAL | EXCLUSIVE
        #[arg(long)]
        policy: String,

        /// Free-text quantity, e.g. "10 units" or "5kg".
        #[arg(long)]
        quantity: String,

        /// Asking price in cents (exclusive listings).
        #[arg(long)]
        price_cents: Option<i64>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let _ = dotenvy::from_filename(".env.local");

    let cli = Cli::parse();

    match cli.cmd {
        Commands::Db { cmd } => {
            let pool = rpl_db::connect_from_env().await?;
            match cmd {
                DbCmd::Status => {
                    let s = rpl_db::status(&pool).await?;
                    println!("db_ok={} has_listings_table={}", s.ok, s.has_listings_table);
                }
                DbCmd::Migrate { yes } => {
                    // Guardrail: refuse migrations while reservations are in
                    // flight unless the operator explicitly acknowledges.
                    let n = rpl_db::count_live_reserved_orders(&pool).await?;
                    if n > 0 && !yes {
                        anyhow::bail!(
                            "REFUSING MIGRATE: detected {} live reservation(s). Re-run with: `rpl db migrate --yes`",
                            n
                        );
                    }
                    rpl_db::migrate(&pool).await?;
                    println!("migrate_ok=true");
                }
            }
        }

        Commands::Listing { cmd } => {
            let pool = rpl_db::connect_from_env().await?;
            let market = Marketplace::new(pool);
            match cmd {
                ListingCmd::Seed {
                    owner,
                    title,
                    policy,
                    quantity,
                    price_cents,
                } => {
                    let policy = AllocationPolicy::parse(&policy)
                        .map_err(|e| anyhow::anyhow!(e.to_string()))?;
                    let listing = market
                        .create_listing(CreateListing {
                            owner_id: owner.unwrap_or_else(Uuid::new_v4),
                            title,
                            policy,
                            quantity: parse_quantity(&quantity),
                            price_cents,
                        })
                        .await
                        .map_err(|e| anyhow::anyhow!(e.to_string()))?;
                    println!(
                        "listing_id={} owner_id={} status={}",
                        listing.listing_id,
                        listing.owner_id,
                        listing.status.as_str()
                    );
                }
            }
        }
    }

    Ok(())
}
