//! # Catalog Views
//!
//! Product listing with derived stock and valuation.
//!
//! Stock and valuation only exist in the projection, so sorting and paging
//! happen here over fully composed views rather than in SQL:
//!
//! ```text
//! SQL: filter (q, type) ──► Vec<(Product, type name)>
//!                                   │  + Projection per product
//!                                   ▼
//!                            Vec<ProductView> ──► sort ──► page
//! ```

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use ts_rs::TS;

use crate::projection::Projection;
use crate::types::Product;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum ProductSort {
    #[default]
    Code,
    Description,
    UnitCost,
    Stock,
    Valuation,
    ProductType,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    #[default]
    Asc,
    Desc,
}

/// Listing request. Every field is optional for callers.
#[derive(Debug, Clone, Default, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(default)]
pub struct ProductQuery {
    /// Substring matched against code and description.
    pub q: Option<String>,
    pub product_type_id: Option<String>,
    pub sort: ProductSort,
    pub order: SortOrder,
    pub limit: Option<u32>,
    pub offset: u32,
}

/// A product plus its derived state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct ProductView {
    #[serde(flatten)]
    pub product: Product,
    pub product_type: Option<String>,
    pub stock: i64,
    pub effective_unit_cost_cents: Option<i64>,
    pub valuation_cents: i64,
}

impl ProductView {
    pub fn compose(product: Product, product_type: Option<String>, projection: &Projection) -> Self {
        let effective = projection.effective_unit_cost(product.unit_cost_cents);
        let valuation = projection.valuation(product.unit_cost_cents);
        Self {
            product,
            product_type,
            stock: projection.stock,
            effective_unit_cost_cents: effective,
            valuation_cents: valuation.cents(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct ProductPage {
    pub items: Vec<ProductView>,
    /// Matches before pagination.
    pub total: usize,
    pub limit: u32,
    pub offset: u32,
}

fn compare(a: &ProductView, b: &ProductView, sort: ProductSort) -> Ordering {
    let primary = match sort {
        ProductSort::Code => Ordering::Equal,
        ProductSort::Description => a.product.description.cmp(&b.product.description),
        ProductSort::UnitCost => a.product.unit_cost_cents.cmp(&b.product.unit_cost_cents),
        ProductSort::Stock => a.stock.cmp(&b.stock),
        ProductSort::Valuation => a.valuation_cents.cmp(&b.valuation_cents),
        ProductSort::ProductType => a.product_type.cmp(&b.product_type),
    };
    primary.then_with(|| a.product.code.cmp(&b.product.code))
}

/// Sorts and pages composed views. `limit` must already be clamped.
pub fn arrange(mut views: Vec<ProductView>, query: &ProductQuery, limit: u32) -> ProductPage {
    views.sort_by(|a, b| {
        let ord = compare(a, b, query.sort);
        match query.order {
            SortOrder::Asc => ord,
            SortOrder::Desc => ord.reverse(),
        }
    });

    let total = views.len();
    let items = views
        .into_iter()
        .skip(query.offset as usize)
        .take(limit as usize)
        .collect();

    ProductPage {
        items,
        total,
        limit,
        offset: query.offset,
    }
}

/// Resolves the effective page size against the configured bounds.
pub fn page_size(requested: Option<u32>, default: u32, max: u32) -> u32 {
    requested.unwrap_or(default).clamp(1, max.max(1))
}
