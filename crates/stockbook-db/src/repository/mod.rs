//! # Repository Module
//!
//! SQL lives here and nowhere else.
//!
//! ## Repository Pattern
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Inventory engine                                                       │
//! │       │                                                                 │
//! │       ├── reads:  db.products().list_filtered(..)   (pool)             │
//! │       │                                                                 │
//! │       └── writes: MovementRepository::insert_in(&mut *tx, ..)          │
//! │                   SaleRepository::insert_in(&mut *tx, ..)              │
//! │                   (caller's transaction, so a sale and its movement    │
//! │                    commit or roll back together)                       │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  SQLite Database                                                       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Available Repositories
//!
//! - [`ProductRepository`](product::ProductRepository) - Catalog rows, filtered listing
//! - [`ProductTypeRepository`](product_type::ProductTypeRepository) - Classifications
//! - [`MovementRepository`](movement::MovementRepository) - The ledger
//! - [`SaleRepository`](sale::SaleRepository) - Sales linked to OUT movements
//! - [`ResolutionRepository`](discrepancy::ResolutionRepository) - Finding annotations

pub mod discrepancy;
pub mod movement;
pub mod product;
pub mod product_type;
pub mod sale;
