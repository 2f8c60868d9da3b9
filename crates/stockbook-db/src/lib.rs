//! # stockbook-db: Storage and Engine for Stockbook
//!
//! SQLite storage via sqlx, plus the [`Inventory`] engine that turns the
//! pure rules of `stockbook-core` into serialized, transactional writes.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Stockbook Data Flow                              │
//! │                                                                         │
//! │  API layer (out of tree): resolves actor_role, decodes barcodes        │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                   stockbook-db (THIS CRATE)                     │   │
//! │  │                                                                 │   │
//! │  │   ┌──────────────┐   ┌──────────────┐   ┌──────────────────┐   │   │
//! │  │   │  Inventory   │   │ StockProjector│   │  ProductLocks    │   │   │
//! │  │   │ (service/)   │──►│ (projector.rs)│   │  (locks.rs)      │   │   │
//! │  │   └──────┬───────┘   └──────────────┘   └──────────────────┘   │   │
//! │  │          │                                                      │   │
//! │  │          ▼                                                      │   │
//! │  │   ┌──────────────┐   ┌──────────────┐   ┌──────────────────┐   │   │
//! │  │   │  Database    │   │ Repositories │   │   Migrations     │   │   │
//! │  │   │  (pool.rs)   │◄──│ movement.rs  │   │   (embedded)     │   │   │
//! │  │   │              │   │ product.rs.. │   │ 001_catalog.sql  │   │   │
//! │  │   └──────────────┘   └──────────────┘   └──────────────────┘   │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  SQLite database (WAL)                                                 │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Organization
//!
//! - [`config`] - `stockbook.toml` + environment configuration
//! - [`pool`] - Connection pool creation and configuration
//! - [`migrations`] - Embedded database migrations
//! - [`error`] - Database error types
//! - [`repository`] - SQL for each table
//! - [`projector`] - Incremental stock projection cache
//! - [`locks`] - Per-product write serialization
//! - [`service`] - The [`Inventory`] engine
//!
//! ## Usage
//!
//! ```rust,ignore
//! use stockbook_db::{Inventory, LedgerConfig};
//! use stockbook_core::{MovementKind, NewMovement};
//!
//! let config = LedgerConfig::load(None)?;
//! let inventory = Inventory::from_config(&config).await?;
//!
//! inventory
//!     .append(NewMovement::new(&product_id, MovementKind::In, 10).with_unit_cost(100), "purchasing")
//!     .await?;
//! assert_eq!(inventory.stock(&product_id).await?, 10);
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod config;
pub mod error;
pub mod locks;
pub mod migrations;
pub mod pool;
pub mod projector;
pub mod repository;
pub mod service;

// =============================================================================
// Re-exports
// =============================================================================

pub use config::{ConfigError, LedgerConfig};
pub use error::{DbError, DbResult};
pub use pool::{Database, DbConfig};
pub use service::{EngineSettings, Inventory, ProjectionCheck};

// Repository re-exports for convenience
pub use repository::discrepancy::ResolutionRepository;
pub use repository::movement::MovementRepository;
pub use repository::product::ProductRepository;
pub use repository::product_type::ProductTypeRepository;
pub use repository::sale::SaleRepository;
