//! # Domain Types
//!
//! Records shared by every stockbook component.
//!
//! ## Type Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │    Product      │◄──│    Movement     │◄──│      Sale       │       │
//! │  │  ─────────────  │   │  ─────────────  │   │  ─────────────  │       │
//! │  │  id (UUID)      │   │  id (UUID)      │   │  id (UUID)      │       │
//! │  │  code (business)│   │  seq (ledger #) │   │  movement_id    │       │
//! │  │  unit_cost      │   │  kind IN/OUT/ADJ│   │  total_cents    │       │
//! │  │  min/max_stock  │   │  quantity > 0   │   │  customer       │       │
//! │  └────────┬────────┘   └─────────────────┘   └─────────────────┘       │
//! │           │                                                             │
//! │  ┌────────▼────────┐   stock and valuation are NOT fields here:         │
//! │  │  ProductType    │   they are derived by folding movements            │
//! │  │  name (unique)  │   (see `projection`)                               │
//! │  └─────────────────┘                                                    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Dual-Key Identity Pattern
//! Every entity has:
//! - `id`: UUID v4, immutable, used for database relations
//! - Business ID: `code` for products, `name` for product types
//!
//! Movements additionally carry `seq`, the ledger insertion sequence. Replay
//! order is `seq` order, never timestamp order.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use ts_rs::TS;

use crate::error::ValidationError;
use crate::money::Money;

// =============================================================================
// Product Type
// =============================================================================

/// Classification a product belongs to (brakes, filters, ...).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct ProductType {
    pub id: String,
    pub name: String,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

// =============================================================================
// Product
// =============================================================================

/// A catalog entry whose stock is tracked by the ledger.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Product {
    /// Unique identifier (UUID v4).
    pub id: String,

    /// External, human-facing code. Unique. Barcodes resolve against it.
    pub code: String,

    pub description: String,

    pub product_type_id: Option<String>,

    /// Latest known unit cost in cents.
    ///
    /// Refreshed by IN/ADJ movements that carry a cost, and by catalog edits.
    pub unit_cost_cents: Option<i64>,

    /// Low-stock policy threshold.
    pub min_stock: Option<i64>,

    /// Overstock policy threshold.
    pub max_stock: Option<i64>,

    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,

    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

impl Product {
    /// Returns the catalog unit cost as Money, if known.
    #[inline]
    pub fn unit_cost(&self) -> Option<Money> {
        self.unit_cost_cents.map(Money::from_cents)
    }
}

/// Input for creating a catalog entry.
#[derive(Debug, Clone, Default, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct NewProduct {
    pub code: String,
    pub description: String,
    pub product_type_id: Option<String>,
    pub unit_cost_cents: Option<i64>,
    pub min_stock: Option<i64>,
    pub max_stock: Option<i64>,
}

/// Partial catalog edit. `None` leaves the field unchanged.
#[derive(Debug, Clone, Default, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct ProductUpdate {
    pub description: Option<String>,
    pub product_type_id: Option<String>,
    pub unit_cost_cents: Option<i64>,
    pub min_stock: Option<i64>,
    pub max_stock: Option<i64>,
}

impl ProductUpdate {
    pub fn is_empty(&self) -> bool {
        self.description.is_none()
            && self.product_type_id.is_none()
            && self.unit_cost_cents.is_none()
            && self.min_stock.is_none()
            && self.max_stock.is_none()
    }

    /// Applies the present fields to a product in place.
    pub fn apply_to(&self, product: &mut Product) {
        if let Some(description) = &self.description {
            product.description = description.trim().to_string();
        }
        if let Some(type_id) = &self.product_type_id {
            product.product_type_id = Some(type_id.clone());
        }
        if let Some(cost) = self.unit_cost_cents {
            product.unit_cost_cents = Some(cost);
        }
        if let Some(min) = self.min_stock {
            product.min_stock = Some(min);
        }
        if let Some(max) = self.max_stock {
            product.max_stock = Some(max);
        }
    }
}

// =============================================================================
// Movement Kind
// =============================================================================

/// The three ways a movement changes derived stock.
///
/// ```text
/// IN   stock += quantity
/// OUT  stock -= quantity   (rejected if the result would be negative)
/// ADJ  stock  = quantity   (absolute count, e.g. after a physical count)
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "UPPERCASE"))]
#[ts(export)]
#[serde(rename_all = "UPPERCASE")]
pub enum MovementKind {
    In,
    Out,
    Adj,
}

impl MovementKind {
    pub const ALL: [MovementKind; 3] = [MovementKind::In, MovementKind::Out, MovementKind::Adj];

    pub const fn as_str(&self) -> &'static str {
        match self {
            MovementKind::In => "IN",
            MovementKind::Out => "OUT",
            MovementKind::Adj => "ADJ",
        }
    }
}

impl fmt::Display for MovementKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MovementKind {
    type Err = ValidationError;

    /// Parses the wire form. Exact match only: `"in"` is rejected.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "IN" => Ok(MovementKind::In),
            "OUT" => Ok(MovementKind::Out),
            "ADJ" => Ok(MovementKind::Adj),
            _ => Err(ValidationError::NotAllowed {
                field: "kind".to_string(),
                allowed: MovementKind::ALL
                    .iter()
                    .map(|k| k.as_str().to_string())
                    .collect(),
            }),
        }
    }
}

// =============================================================================
// Movement
// =============================================================================

/// An immutable ledger entry.
///
/// Created exactly once by the ledger write path; never updated or deleted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Movement {
    pub id: String,

    /// Ledger insertion sequence (strictly increasing across all products).
    pub seq: i64,

    pub product_id: String,

    pub kind: MovementKind,

    /// Always positive; its effect depends on `kind`.
    pub quantity: i64,

    /// Unit cost in cents at the time of the movement.
    pub unit_cost_cents: Option<i64>,

    /// Reason code, e.g. `SALE` or `opening_balance`.
    pub reason: Option<String>,

    pub note: Option<String>,

    /// Role the movement was authorized under.
    pub actor_role: String,

    /// Assigned by the ledger; non-decreasing per product.
    #[ts(as = "String")]
    pub moved_at: DateTime<Utc>,
}

/// Input for a ledger append.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct NewMovement {
    pub product_id: String,
    pub kind: MovementKind,
    pub quantity: i64,
    pub unit_cost_cents: Option<i64>,
    pub reason: Option<String>,
    pub note: Option<String>,
}

impl NewMovement {
    /// Shorthand for a movement with no cost, reason or note.
    pub fn new(product_id: impl Into<String>, kind: MovementKind, quantity: i64) -> Self {
        Self {
            product_id: product_id.into(),
            kind,
            quantity,
            unit_cost_cents: None,
            reason: None,
            note: None,
        }
    }

    pub fn with_unit_cost(mut self, cents: i64) -> Self {
        self.unit_cost_cents = Some(cents);
        self
    }

    pub fn with_reason(mut self, reason: impl Into<String>) -> Self {
        self.reason = Some(reason.into());
        self
    }

    pub fn with_note(mut self, note: impl Into<String>) -> Self {
        self.note = Some(note.into());
        self
    }
}

// =============================================================================
// Sale
// =============================================================================

/// Reason code stamped on the OUT movement behind every sale.
pub const SALE_REASON: &str = "SALE";

/// A customer-facing sale, linked to exactly one OUT movement.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Sale {
    pub id: String,
    pub product_id: String,

    /// The OUT movement this sale was recorded as. Unique.
    pub movement_id: String,

    pub quantity: i64,

    /// Explicit price override; `None` means the catalog cost was charged.
    /// The effective price is always recoverable as `total_cents / quantity`.
    pub unit_price_cents: Option<i64>,

    pub total_cents: i64,

    pub customer: Option<String>,
    pub note: Option<String>,
    pub actor_role: String,

    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

impl Sale {
    #[inline]
    pub fn total(&self) -> Money {
        Money::from_cents(self.total_cents)
    }
}

/// Input for a sale.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct NewSale {
    pub product_id: String,
    pub quantity: i64,
    pub unit_price_cents: Option<i64>,
    pub customer: Option<String>,
    pub note: Option<String>,
}

impl NewSale {
    pub fn new(product_id: impl Into<String>, quantity: i64) -> Self {
        Self {
            product_id: product_id.into(),
            quantity,
            unit_price_cents: None,
            customer: None,
            note: None,
        }
    }

    pub fn with_unit_price(mut self, cents: i64) -> Self {
        self.unit_price_cents = Some(cents);
        self
    }

    pub fn with_customer(mut self, customer: impl Into<String>) -> Self {
        self.customer = Some(customer.into());
        self
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_movement_kind_wire_form() {
        assert_eq!("IN".parse::<MovementKind>().unwrap(), MovementKind::In);
        assert_eq!("ADJ".parse::<MovementKind>().unwrap(), MovementKind::Adj);
        assert!("in".parse::<MovementKind>().is_err());
        assert!("TRANSFER".parse::<MovementKind>().is_err());

        let json = serde_json::to_string(&MovementKind::Out).unwrap();
        assert_eq!(json, "\"OUT\"");
    }

    #[test]
    fn test_unknown_kind_is_validation_error() {
        let err = "MOVE".parse::<MovementKind>().unwrap_err();
        assert!(matches!(err, ValidationError::NotAllowed { ref field, .. } if field == "kind"));
    }

    #[test]
    fn test_product_update_applies_present_fields_only() {
        let now = Utc::now();
        let mut product = Product {
            id: "p1".to_string(),
            code: "BRK-001".to_string(),
            description: "Brake pad".to_string(),
            product_type_id: None,
            unit_cost_cents: Some(100),
            min_stock: Some(5),
            max_stock: None,
            created_at: now,
            updated_at: now,
        };

        let update = ProductUpdate {
            max_stock: Some(50),
            ..Default::default()
        };
        assert!(!update.is_empty());
        update.apply_to(&mut product);

        assert_eq!(product.description, "Brake pad");
        assert_eq!(product.unit_cost_cents, Some(100));
        assert_eq!(product.min_stock, Some(5));
        assert_eq!(product.max_stock, Some(50));
    }
}
