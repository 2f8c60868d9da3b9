//! # Discrepancy Detection
//!
//! Compares projected stock against catalog policy and an optional external
//! count, and reports findings that can be annotated as resolved.
//!
//! ## Scan Pipeline
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │  Vec<StockSnapshot> ──► DiscrepancyScan (Iterator) ──► Finding, ...    │
//! │        ▲                    │            │                              │
//! │        │                    │            └── ResolutionIndex            │
//! │  taken once per scan        │                (open vs resolved)         │
//! │  (fresh, consistent)        └── ExpectedStockSource                     │
//! │                                 (pluggable external count)              │
//! │                                                                         │
//! │  Products are examined one at a time, so a caller can stop early.      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Resolution Matching
//! A resolution annotates a (product, kind) at a specific (stock, unit cost)
//! snapshot. A finding is resolved when a resolution with an identical
//! snapshot exists. When stock or cost moves on, the condition counts as a
//! new one and the finding is open again. Resolutions never touch the
//! ledger; fixing actual stock takes an ADJ movement.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use ts_rs::TS;

use crate::error::ValidationError;

// =============================================================================
// Kinds & Severity
// =============================================================================

/// What a finding is about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "SCREAMING_SNAKE_CASE"))]
#[ts(export)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DiscrepancyKind {
    /// Projected stock below zero. Data-integrity problem.
    NegativeStock,
    /// External count disagrees with projected stock.
    StockMismatch,
    /// Stock on hand with no usable unit cost.
    UnitCostMissing,
    BelowMinStock,
    AboveMaxStock,
    /// Stock on hand and neither threshold set.
    MissingPolicy,
}

impl DiscrepancyKind {
    /// Detection order within a product, highest severity first.
    pub const ALL: [DiscrepancyKind; 6] = [
        DiscrepancyKind::NegativeStock,
        DiscrepancyKind::StockMismatch,
        DiscrepancyKind::UnitCostMissing,
        DiscrepancyKind::BelowMinStock,
        DiscrepancyKind::AboveMaxStock,
        DiscrepancyKind::MissingPolicy,
    ];

    pub const fn as_str(&self) -> &'static str {
        match self {
            DiscrepancyKind::NegativeStock => "NEGATIVE_STOCK",
            DiscrepancyKind::StockMismatch => "STOCK_MISMATCH",
            DiscrepancyKind::UnitCostMissing => "UNIT_COST_MISSING",
            DiscrepancyKind::BelowMinStock => "BELOW_MIN_STOCK",
            DiscrepancyKind::AboveMaxStock => "ABOVE_MAX_STOCK",
            DiscrepancyKind::MissingPolicy => "MISSING_POLICY",
        }
    }

    pub const fn severity(&self) -> Severity {
        match self {
            DiscrepancyKind::NegativeStock => Severity::Critical,
            DiscrepancyKind::StockMismatch => Severity::High,
            DiscrepancyKind::UnitCostMissing
            | DiscrepancyKind::BelowMinStock
            | DiscrepancyKind::AboveMaxStock => Severity::Medium,
            DiscrepancyKind::MissingPolicy => Severity::Low,
        }
    }
}

impl fmt::Display for DiscrepancyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DiscrepancyKind {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        DiscrepancyKind::ALL
            .into_iter()
            .find(|k| k.as_str() == s)
            .ok_or_else(|| ValidationError::NotAllowed {
                field: "kind".to_string(),
                allowed: DiscrepancyKind::ALL
                    .iter()
                    .map(|k| k.as_str().to_string())
                    .collect(),
            })
    }
}

/// Ordered so that `Critical > High > Medium > Low`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Low,
    Medium,
    High,
    Critical,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "lowercase")]
pub enum FindingState {
    Open,
    Resolved,
}

// =============================================================================
// Records
// =============================================================================

/// Projected state of one product as of the start of a scan.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct StockSnapshot {
    pub product_id: String,
    pub code: String,
    pub description: String,
    pub stock: i64,
    /// Effective unit cost (ledger, else catalog).
    pub unit_cost_cents: Option<i64>,
    pub min_stock: Option<i64>,
    pub max_stock: Option<i64>,
}

/// An append-only annotation marking a finding as reviewed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Resolution {
    pub id: String,
    pub seq: i64,
    pub product_id: String,
    pub kind: DiscrepancyKind,
    pub stock_at: i64,
    pub unit_cost_at_cents: Option<i64>,
    pub note: Option<String>,
    pub resolver_role: String,
    #[ts(as = "String")]
    pub resolved_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Finding {
    pub product_id: String,
    pub code: String,
    pub kind: DiscrepancyKind,
    pub severity: Severity,
    pub detail: String,
    pub stock: i64,
    pub unit_cost_cents: Option<i64>,
    pub state: FindingState,
    /// Set when `state` is `Resolved`.
    pub resolution: Option<Resolution>,
}

impl Finding {
    pub fn is_open(&self) -> bool {
        self.state == FindingState::Open
    }
}

// =============================================================================
// Expected Stock Source
// =============================================================================

/// Where "expected" stock comes from, if anywhere.
///
/// Returning `None` means the product is not tracked by the source and no
/// mismatch check is made for it.
pub trait ExpectedStockSource: fmt::Debug + Send + Sync {
    fn expected_stock(&self, product: &StockSnapshot) -> Option<i64>;
}

/// No external count. Only policy and integrity findings are produced.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoExpectedStock;

impl ExpectedStockSource for NoExpectedStock {
    fn expected_stock(&self, _product: &StockSnapshot) -> Option<i64> {
        None
    }
}

/// A physical count keyed by product code.
#[derive(Debug, Clone, Default)]
pub struct CountSheet {
    counts: HashMap<String, i64>,
}

impl CountSheet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, code: impl Into<String>, counted: i64) {
        self.counts.insert(code.into(), counted);
    }

    pub fn len(&self) -> usize {
        self.counts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }
}

impl<S: Into<String>> FromIterator<(S, i64)> for CountSheet {
    fn from_iter<T: IntoIterator<Item = (S, i64)>>(iter: T) -> Self {
        Self {
            counts: iter.into_iter().map(|(c, n)| (c.into(), n)).collect(),
        }
    }
}

impl ExpectedStockSource for CountSheet {
    fn expected_stock(&self, product: &StockSnapshot) -> Option<i64> {
        self.counts.get(&product.code).copied()
    }
}

// =============================================================================
// Resolution Index
// =============================================================================

/// Recorded resolutions grouped by (product, kind).
#[derive(Debug, Clone, Default)]
pub struct ResolutionIndex {
    by_key: HashMap<(String, DiscrepancyKind), Vec<Resolution>>,
}

impl ResolutionIndex {
    /// Builds the index. Input is expected in recording order.
    pub fn new(resolutions: impl IntoIterator<Item = Resolution>) -> Self {
        let mut by_key: HashMap<_, Vec<Resolution>> = HashMap::new();
        for r in resolutions {
            by_key
                .entry((r.product_id.clone(), r.kind))
                .or_default()
                .push(r);
        }
        Self { by_key }
    }

    /// Most recent resolution matching the current snapshot exactly.
    pub fn matching(
        &self,
        product_id: &str,
        kind: DiscrepancyKind,
        stock: i64,
        unit_cost_cents: Option<i64>,
    ) -> Option<&Resolution> {
        self.by_key
            .get(&(product_id.to_string(), kind))?
            .iter()
            .rev()
            .find(|r| r.stock_at == stock && r.unit_cost_at_cents == unit_cost_cents)
    }
}

// =============================================================================
// Detection
// =============================================================================

/// Conditions present for one product, highest severity first.
pub fn detect(snapshot: &StockSnapshot, expected: Option<i64>) -> Vec<(DiscrepancyKind, String)> {
    let mut found = Vec::new();
    let stock = snapshot.stock;

    if stock < 0 {
        found.push((
            DiscrepancyKind::NegativeStock,
            format!("projected stock is {stock}"),
        ));
    }

    if let Some(expected) = expected {
        if expected != stock {
            found.push((
                DiscrepancyKind::StockMismatch,
                format!("expected {expected}, projected {stock}"),
            ));
        }
    }

    if stock > 0 && matches!(snapshot.unit_cost_cents, None | Some(0)) {
        found.push((
            DiscrepancyKind::UnitCostMissing,
            format!("{stock} units on hand with no unit cost"),
        ));
    }

    if let Some(min) = snapshot.min_stock {
        if stock < min {
            found.push((
                DiscrepancyKind::BelowMinStock,
                format!("stock {stock} below minimum {min}"),
            ));
        }
    }

    if let Some(max) = snapshot.max_stock {
        if stock > max {
            found.push((
                DiscrepancyKind::AboveMaxStock,
                format!("stock {stock} above maximum {max}"),
            ));
        }
    }

    if stock > 0 && snapshot.min_stock.is_none() && snapshot.max_stock.is_none() {
        found.push((
            DiscrepancyKind::MissingPolicy,
            "no min or max stock threshold set".to_string(),
        ));
    }

    found
}

// =============================================================================
// Scan
// =============================================================================

/// Lazy, finite sequence of findings over a fixed set of snapshots.
///
/// Yields both open and resolved findings; filter on [`Finding::is_open`]
/// for the work queue. Building a new scan is the way to restart.
#[derive(Debug)]
pub struct DiscrepancyScan {
    products: std::vec::IntoIter<StockSnapshot>,
    pending: std::vec::IntoIter<Finding>,
    resolutions: ResolutionIndex,
    expected: Arc<dyn ExpectedStockSource>,
}

impl DiscrepancyScan {
    pub fn new(
        products: Vec<StockSnapshot>,
        resolutions: ResolutionIndex,
        expected: Arc<dyn ExpectedStockSource>,
    ) -> Self {
        Self {
            products: products.into_iter(),
            pending: Vec::new().into_iter(),
            resolutions,
            expected,
        }
    }

    fn examine(&self, snapshot: StockSnapshot) -> Vec<Finding> {
        let expected = self.expected.expected_stock(&snapshot);
        detect(&snapshot, expected)
            .into_iter()
            .map(|(kind, detail)| {
                let resolution = self
                    .resolutions
                    .matching(
                        &snapshot.product_id,
                        kind,
                        snapshot.stock,
                        snapshot.unit_cost_cents,
                    )
                    .cloned();
                Finding {
                    product_id: snapshot.product_id.clone(),
                    code: snapshot.code.clone(),
                    kind,
                    severity: kind.severity(),
                    detail,
                    stock: snapshot.stock,
                    unit_cost_cents: snapshot.unit_cost_cents,
                    state: if resolution.is_some() {
                        FindingState::Resolved
                    } else {
                        FindingState::Open
                    },
                    resolution,
                }
            })
            .collect()
    }
}

impl Iterator for DiscrepancyScan {
    type Item = Finding;

    fn next(&mut self) -> Option<Finding> {
        loop {
            if let Some(finding) = self.pending.next() {
                return Some(finding);
            }
            let snapshot = self.products.next()?;
            self.pending = self.examine(snapshot).into_iter();
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
