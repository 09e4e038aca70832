//! Shared runtime state for rpl-daemon.
//!
//! Handlers receive `State<Arc<AppState>>` from Axum; this module owns
//! nothing async itself.

use std::sync::Arc;

use rpl_service::Marketplace;
use serde::{Deserialize, Serialize};
use sqlx::PgPool;

/// Static build metadata included in the health response.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct BuildInfo {
    pub service: &'static str,
    pub version: &'static str,
}

/// Cloneable (Arc) handle shared across all Axum handlers.
#[derive(Clone)]
pub struct AppState {
    /// The marketplace facade — the only path to allocation decisions.
    pub market: Marketplace,
    /// Static build metadata.
    pub build: BuildInfo,
}

impl AppState {
    pub fn new(pool: PgPool) -> Arc<Self> {
        Arc::new(Self {
            market: Marketplace::new(pool),
            build: BuildInfo {
                service: "rpl-daemon",
                version: env!("CARGO_PKG_VERSION"),
            },
        })
    }
}
