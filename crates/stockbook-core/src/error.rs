//! # Error Types
//!
//! Domain-specific error types for stockbook-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  stockbook-core errors (this file)                                     │
//! │  ├── CoreError        - The five ledger outcomes a caller must handle  │
//! │  ├── ValidationError  - Input validation failures                      │
//! │  └── ErrorKind        - Flat classification for response mapping      │
//! │                                                                         │
//! │  stockbook-db errors (separate crate)                                  │
//! │  └── DbError          - Storage failures + embedded CoreError          │
//! │                                                                         │
//! │  Flow: ValidationError → CoreError → DbError → API layer (out of tree) │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Design Principles
//! 1. Use `thiserror` for derive macros (not manual impl)
//! 2. Include context in error messages (code, ID, quantities)
//! 3. Errors are enum variants, never String
//! 4. Every rejected operation leaves state unchanged, so every error is
//!    safe to surface verbatim

use serde::{Deserialize, Serialize};
use thiserror::Error;
use ts_rs::TS;

// =============================================================================
// Core Error
// =============================================================================

/// Ledger and catalog rule violations.
///
/// Each variant corresponds to one [`ErrorKind`]. The engine returns these
/// untouched; translating them to responses is the caller's job.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Malformed or out-of-range input. Caller's fault, not retryable.
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    /// The actor's role does not permit the action.
    ///
    /// ## When This Occurs
    /// - Role string is not one of admin/purchasing/sales (fail closed)
    /// - Matrix denies the (role, movement kind) pair
    /// - Movement quantity reaches the approval threshold and actor is not admin
    /// - Catalog or policy edit attempted without admin
    #[error("Role '{role}' is not permitted to {action}")]
    Unauthorized { role: String, action: String },

    /// A referenced record does not exist.
    #[error("{entity} not found: {id}")]
    NotFound { entity: String, id: String },

    /// An OUT-producing operation would drive projected stock below zero.
    ///
    /// ## User Workflow
    /// ```text
    /// Sale request (qty: 10)
    ///      │
    ///      ▼
    /// Projected stock: 7
    ///      │
    ///      ▼
    /// InsufficientStock { code: "BRK-001", available: 7, requested: 10 }
    ///      │
    ///      ▼
    /// Ledger unchanged, stock stays 7
    /// ```
    #[error("Insufficient stock for {code}: available {available}, requested {requested}")]
    InsufficientStock {
        code: String,
        available: i64,
        requested: i64,
    },

    /// A concurrent write held the product and this one gave up waiting.
    ///
    /// Safe to retry once. The core never retries on its own.
    #[error("Concurrent write in progress for product {product_id}")]
    Conflict { product_id: String },
}

impl CoreError {
    /// Returns the flat classification of this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            CoreError::Validation(_) => ErrorKind::Validation,
            CoreError::Unauthorized { .. } => ErrorKind::Authorization,
            CoreError::NotFound { .. } => ErrorKind::NotFound,
            CoreError::InsufficientStock { .. } => ErrorKind::InsufficientStock,
            CoreError::Conflict { .. } => ErrorKind::Conflict,
        }
    }

    /// Shorthand for a [`CoreError::NotFound`].
    pub fn not_found(entity: &str, id: impl Into<String>) -> Self {
        CoreError::NotFound {
            entity: entity.to_string(),
            id: id.into(),
        }
    }

    /// Shorthand for a [`CoreError::Unauthorized`].
    pub fn unauthorized(role: &str, action: impl Into<String>) -> Self {
        CoreError::Unauthorized {
            role: role.to_string(),
            action: action.into(),
        }
    }
}

// =============================================================================
// Error Kind
// =============================================================================

/// Flat error classification the API layer maps to response codes.
///
/// ```text
/// Validation        → 400 / 422
/// Authorization     → 403
/// NotFound          → 404
/// InsufficientStock → 409 (business rule)
/// Conflict          → 409 (retry once)
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorKind {
    Validation,
    Authorization,
    NotFound,
    InsufficientStock,
    Conflict,
}

impl ErrorKind {
    /// Only a lost per-product race is worth retrying with the same input.
    pub fn is_retryable(&self) -> bool {
        matches!(self, ErrorKind::Conflict)
    }
}

// =============================================================================
// Validation Error
// =============================================================================

/// Input validation errors.
///
/// These errors occur when caller input doesn't meet requirements.
/// Raised before any state is touched.
#[derive(Debug, Error, PartialEq)]
pub enum ValidationError {
    /// A required field is missing or empty.
    #[error("{field} is required")]
    Required { field: String },

    /// Field value is too long.
    #[error("{field} must be at most {max} characters")]
    TooLong { field: String, max: usize },

    /// Numeric value is out of range.
    #[error("{field} must be between {min} and {max}")]
    OutOfRange { field: String, min: i64, max: i64 },

    /// Value must be positive.
    #[error("{field} must be positive")]
    MustBePositive { field: String },

    /// Invalid format (e.g., invalid UUID).
    #[error("{field} has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },

    /// Value is not in allowed set.
    #[error("{field} must be one of: {allowed:?}")]
    NotAllowed { field: String, allowed: Vec<String> },

    /// Duplicate value (e.g., duplicate product code).
    #[error("{field} '{value}' already exists")]
    Duplicate { field: String, value: String },

    /// An id that must point at an existing record does not.
    #[error("{field} '{value}' does not reference an existing record")]
    UnknownReference { field: String, value: String },

    /// Neither an explicit unit price nor a catalog unit cost is available.
    #[error("No unit price given and product {code} has no unit cost")]
    MissingPrice { code: String },
}

// =============================================================================
// Result Type Alias
// =============================================================================

/// Convenience type alias for Results with CoreError.
pub type CoreResult<T> = Result<T, CoreError>;

// =============================================================================
// Unit Tests
// =============================================================================
