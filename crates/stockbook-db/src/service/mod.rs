//! # Inventory Engine
//!
//! The operations an API layer calls. One [`Inventory`] value is shared by
//! every request handler; it is cheap to clone.
//!
//! ## Write Path
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  append / create_sale                                                  │
//! │       │                                                                 │
//! │       ├── 1. validate input            (stockbook-core, no I/O)        │
//! │       ├── 2. authorize role × kind     (stockbook-core::auth)          │
//! │       ├── 3. acquire product lock      (ProductLocks, bounded wait)    │
//! │       ├── 4. BEGIN IMMEDIATE           (SQLite write lock)             │
//! │       │      ├── product exists?                                       │
//! │       │      ├── cached projection + ledger rows past its last_seq     │
//! │       │      ├── projected stock covers OUT?                           │
//! │       │      ├── INSERT movement (+ sale)                              │
//! │       │      └── refresh catalog unit cost (IN/ADJ with cost)          │
//! │       ├── 5. COMMIT                                                    │
//! │       └── 6. projector.store(projection), release lock                 │
//! │                                                                         │
//! │  Any error before COMMIT drops the transaction: nothing is written     │
//! │  and the projector is untouched. ProductLocks order writers inside     │
//! │  one process; the SQLite write lock orders them across processes      │
//! │  sharing the file, and the ledger tail keeps a stale cache honest.    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Read Path
//! Stock and valuation come from the projector cache. Reads never take a
//! product lock, so they may be behind an in-flight write (or a write made
//! by another process, until this engine next writes that product) but
//! never see half of one.
//!
//! The operations are grouped by concern:
//!
//! - [`catalog`] - products, product types, listing, stock and valuation
//! - [`ledger`] - append, history, point-in-time stock, replay checks
//! - [`sales`] - atomic sale + OUT movement
//! - [`discrepancy`] - scan and resolve findings
//! - [`policy`] - low-stock report and bulk thresholds
//! - [`barcode`] - decoded code lookup

mod barcode;
mod catalog;
mod discrepancy;
mod ledger;
mod policy;
mod sales;

use std::sync::Arc;
use std::time::Duration;
use tracing::info;

use crate::config::LedgerConfig;
use crate::error::DbResult;
use crate::locks::ProductLocks;
use crate::pool::Database;
use crate::projector::StockProjector;
use stockbook_core::{ExpectedStockSource, NoExpectedStock};

pub use ledger::ProjectionCheck;

/// Engine settings lifted out of [`LedgerConfig`].
#[derive(Debug, Clone, Copy)]
pub struct EngineSettings {
    pub approval_threshold: Option<i64>,
    pub lock_timeout: Duration,
    pub default_page_size: u32,
    pub max_page_size: u32,
}

impl From<&LedgerConfig> for EngineSettings {
    fn from(config: &LedgerConfig) -> Self {
        EngineSettings {
            approval_threshold: config.ledger.approval_threshold,
            lock_timeout: config.ledger.lock_timeout(),
            default_page_size: config.catalog.default_page_size,
            max_page_size: config.catalog.max_page_size,
        }
    }
}

impl Default for EngineSettings {
    fn default() -> Self {
        EngineSettings::from(&LedgerConfig::default())
    }
}

/// Inventory ledger engine.
#[derive(Debug, Clone)]
pub struct Inventory {
    db: Database,
    projector: Arc<StockProjector>,
    locks: Arc<ProductLocks>,
    settings: EngineSettings,
    expected: Arc<dyn ExpectedStockSource>,
}

impl Inventory {
    /// Wraps an open database and warms the projector from its ledger.
    pub async fn open(db: Database, config: &LedgerConfig) -> DbResult<Self> {
        let inventory = Inventory {
            db,
            projector: Arc::new(StockProjector::new()),
            locks: Arc::new(ProductLocks::new()),
            settings: EngineSettings::from(config),
            expected: Arc::new(NoExpectedStock),
        };
        inventory.refresh().await?;
        Ok(inventory)
    }

    /// Opens the configured database, then the engine.
    pub async fn from_config(config: &LedgerConfig) -> DbResult<Self> {
        let db = Database::new(config.db_config()).await?;
        Self::open(db, config).await
    }

    /// Replaces the source of expected stock used by discrepancy scans.
    pub fn with_expected_stock(mut self, source: Arc<dyn ExpectedStockSource>) -> Self {
        self.expected = source;
        self
    }

    pub fn database(&self) -> &Database {
        &self.db
    }

    pub fn settings(&self) -> &EngineSettings {
        &self.settings
    }

    /// Rebuilds the projector from the full ledger.
    ///
    /// A write committing during the reload is only guaranteed to be
    /// reflected once it has applied itself, so call this while idle.
    pub async fn refresh(&self) -> DbResult<usize> {
        let movements = self.db.movements().all_in_order().await?;
        let applied = self.projector.warm(&movements);
        info!(movements = applied, "Stock projector warmed");
        Ok(applied)
    }
}
