//! # Sale Pricing
//!
//! ```text
//! total = quantity × (unit_price override  OR  catalog unit cost)
//!                          │                       │
//!                          └──── both absent ──────┴──► MissingPrice
//! ```

use crate::error::ValidationError;
use crate::money::Money;
use crate::types::{NewSale, Product};
use crate::validation::{validate_optional_text, validate_quantity, validate_unit_cost, ValidationResult};

/// Priced sale, ready to be written.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SaleQuote {
    pub unit_price: Money,
    pub total: Money,
}

/// Field checks that need no catalog access.
pub fn validate_new_sale(sale: &NewSale) -> ValidationResult<()> {
    validate_quantity(sale.quantity)?;
    if let Some(price) = sale.unit_price_cents {
        validate_unit_cost("unit_price_cents", price)?;
    }
    validate_optional_text("customer", sale.customer.as_deref())?;
    validate_optional_text("note", sale.note.as_deref())
}

/// Prices a sale against the product's catalog cost.
pub fn quote(
    product: &Product,
    quantity: i64,
    unit_price_cents: Option<i64>,
) -> ValidationResult<SaleQuote> {
    let unit_price = unit_price_cents
        .or(product.unit_cost_cents)
        .map(Money::from_cents)
        .ok_or_else(|| ValidationError::MissingPrice {
            code: product.code.clone(),
        })?;

    Ok(SaleQuote {
        unit_price,
        total: unit_price.multiply_quantity(quantity),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn product(cost: Option<i64>) -> Product {
        let now = Utc::now();
        Product {
            id: "p1".to_string(),
            code: "BRK-001".to_string(),
            description: "Brake pad".to_string(),
            product_type_id: None,
            unit_cost_cents: cost,
            min_stock: None,
            max_stock: None,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_quote_uses_override_first() {
        let q = quote(&product(Some(100)), 3, Some(150)).unwrap();
        assert_eq!(q.unit_price.cents(), 150);
        assert_eq!(q.total.cents(), 450);
    }

    #[test]
    fn test_quote_falls_back_to_catalog_cost() {
        let q = quote(&product(Some(100)), 3, None).unwrap();
        assert_eq!(q.total.cents(), 300);
    }

    #[test]
    fn test_quote_without_any_price_fails() {
        let err = quote(&product(None), 3, None).unwrap_err();
        assert!(matches!(err, ValidationError::MissingPrice { .. }));
    }

    #[test]
    fn test_validate_new_sale() {
        assert!(validate_new_sale(&NewSale::new("p1", 1)).is_ok());
        assert!(validate_new_sale(&NewSale::new("p1", 0)).is_err());
        assert!(validate_new_sale(&NewSale::new("p1", 1).with_unit_price(-5)).is_err());
    }
}
