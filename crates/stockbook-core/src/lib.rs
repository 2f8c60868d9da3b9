//! # stockbook-core: Pure Ledger Rules for Stockbook
//!
//! Stock is never stored. It is derived by folding an append-only ledger of
//! movements, and every rule about what may be appended lives in this crate
//! as a pure function.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Stockbook Architecture                           │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │              API layer (HTTP, out of tree)                      │   │
//! │  │   resolves credentials → role string, decodes barcode images    │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │              stockbook-db: Inventory engine                     │   │
//! │  │   per-product locks, transactions, projector cache, SQLite      │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │ calls                                  │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │             ★ stockbook-core (THIS CRATE) ★                     │   │
//! │  │                                                                 │   │
//! │  │   ┌──────────┐ ┌────────────┐ ┌─────────────┐ ┌──────────┐     │   │
//! │  │   │   auth   │ │ projection │ │ discrepancy │ │  policy  │     │   │
//! │  │   │  matrix  │ │   fold     │ │    scan     │ │ low stock│     │   │
//! │  │   └──────────┘ └────────────┘ └─────────────┘ └──────────┘     │   │
//! │  │   ┌──────────┐ ┌────────────┐ ┌─────────────┐ ┌──────────┐     │   │
//! │  │   │   sale   │ │  barcode   │ │   catalog   │ │validation│     │   │
//! │  │   │ pricing  │ │  matching  │ │ sort/page   │ │  rules   │     │   │
//! │  │   └──────────┘ └────────────┘ └─────────────┘ └──────────┘     │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO DATABASE • NO LOGGING • PURE FUNCTIONS           │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Records: Product, Movement, Sale and their inputs
//! - [`money`] - Integer-cent Money
//! - [`auth`] - Role × movement-kind authorization matrix
//! - [`projection`] - Stock/valuation fold, shared by replay and the cache
//! - [`discrepancy`] - Findings, pluggable expected-stock sources, lazy scan
//! - [`policy`] - Low-stock rows and bulk threshold entries
//! - [`sale`] - Sale pricing
//! - [`barcode`] - Decoded string → product matching
//! - [`catalog`] - Product listing views, sorting and paging
//! - [`validation`] - Field rules
//! - [`error`] - Domain error types
//!
//! ## Example Usage
//!
//! ```rust
//! use stockbook_core::{auth, MovementKind, Projection};
//!
//! assert!(auth::permits_claim("purchasing", MovementKind::In));
//! assert!(!auth::permits_claim("purchasing", MovementKind::Out));
//!
//! let mut p = Projection::default();
//! p.apply(MovementKind::In, 10, Some(100));
//! p.apply(MovementKind::Out, 3, None);
//! assert_eq!(p.stock, 7);
//! assert_eq!(p.valuation(None).cents(), 700);
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod auth;
pub mod barcode;
pub mod catalog;
pub mod discrepancy;
pub mod error;
pub mod money;
pub mod policy;
pub mod projection;
pub mod sale;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use auth::Role;
pub use discrepancy::{
    CountSheet, DiscrepancyKind, DiscrepancyScan, ExpectedStockSource, Finding, FindingState,
    NoExpectedStock, Resolution, Severity, StockSnapshot,
};
pub use error::{CoreError, CoreResult, ErrorKind, ValidationError};
pub use money::Money;
pub use projection::Projection;
pub use types::*;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Largest quantity a single movement may carry.
pub const MAX_QUANTITY: i64 = 1_000_000_000;

/// Largest unit cost or unit price accepted, in cents.
pub const MAX_UNIT_COST_CENTS: i64 = 100_000_000_000;

/// Longest reason, note or customer text accepted.
pub const MAX_TEXT_LEN: usize = 500;

/// Default quantity at which OUT/ADJ movements need the admin role.
pub const DEFAULT_APPROVAL_THRESHOLD: i64 = 1000;

/// Reason recorded on opening-balance IN movements written by the importer.
pub const OPENING_BALANCE_REASON: &str = "opening_balance";
