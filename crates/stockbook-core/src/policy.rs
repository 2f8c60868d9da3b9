//! # Low-Stock & Policy
//!
//! Threshold math and bulk-update row handling.
//!
//! ```text
//! shortage = max(0, min_stock - stock)
//!
//!   min_stock  stock  shortage  reported?
//!   ─────────  ─────  ────────  ─────────
//!       5        7       0        no
//!       5        4       1        yes
//!     None       0       -        no (no policy)
//! ```
//!
//! Bulk updates are row-independent: a bad row becomes a [`PolicyRowError`]
//! and the rest of the batch carries on.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::discrepancy::StockSnapshot;
use crate::validation::{validate_code, validate_thresholds, ValidationResult};

// =============================================================================
// Thresholds
// =============================================================================

/// Current thresholds of one product.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct PolicyThreshold {
    pub product_id: String,
    pub code: String,
    pub min_stock: Option<i64>,
    pub max_stock: Option<i64>,
}

/// Units missing to reach `min_stock`, only when there is a shortfall.
pub fn shortage(stock: i64, min_stock: Option<i64>) -> Option<i64> {
    let min = min_stock?;
    let missing = min.saturating_sub(stock);
    (missing > 0).then_some(missing)
}

// =============================================================================
// Low Stock
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct LowStockRow {
    pub product_id: String,
    pub code: String,
    pub description: String,
    pub stock: i64,
    pub min_stock: i64,
    pub shortage: i64,
}

/// Rows with a shortfall, largest shortage first, then by code.
pub fn low_stock_rows<'a>(snapshots: impl IntoIterator<Item = &'a StockSnapshot>) -> Vec<LowStockRow> {
    let mut rows: Vec<LowStockRow> = snapshots
        .into_iter()
        .filter_map(|s| {
            let missing = shortage(s.stock, s.min_stock)?;
            Some(LowStockRow {
                product_id: s.product_id.clone(),
                code: s.code.clone(),
                description: s.description.clone(),
                stock: s.stock,
                min_stock: s.min_stock?,
                shortage: missing,
            })
        })
        .collect();

    rows.sort_by(|a, b| b.shortage.cmp(&a.shortage).then_with(|| a.code.cmp(&b.code)));
    rows
}

// =============================================================================
// Bulk Policy
// =============================================================================

/// One row of a bulk threshold update. Absent fields are left unchanged.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct PolicyEntry {
    #[serde(alias = "external_code")]
    pub code: String,
    pub min_stock: Option<i64>,
    pub max_stock: Option<i64>,
}

impl PolicyEntry {
    pub fn new(code: impl Into<String>, min_stock: Option<i64>, max_stock: Option<i64>) -> Self {
        Self {
            code: code.into(),
            min_stock,
            max_stock,
        }
    }

    /// Row-level checks that need no catalog access.
    pub fn validate(&self) -> ValidationResult<()> {
        validate_code(&self.code)?;
        validate_thresholds(self.min_stock, self.max_stock)
    }

    /// An entry with neither bound would change nothing; it is reported as a
    /// row error rather than counted as updated.
    pub fn is_noop(&self) -> bool {
        self.min_stock.is_none() && self.max_stock.is_none()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct PolicyRowError {
    #[serde(rename = "external_code")]
    pub code: String,
    pub reason: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct BulkPolicyReport {
    pub updated_count: usize,
    pub errors: Vec<PolicyRowError>,
}

impl BulkPolicyReport {
    pub fn record_updated(&mut self) {
        self.updated_count += 1;
    }

    pub fn record_error(&mut self, code: &str, reason: impl ToString) {
        self.errors.push(PolicyRowError {
            code: code.to_string(),
            reason: reason.to_string(),
        });
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn snap(code: &str, stock: i64, min: Option<i64>) -> StockSnapshot {
        StockSnapshot {
            product_id: format!("id-{code}"),
            code: code.to_string(),
            description: String::new(),
            stock,
            unit_cost_cents: None,
            min_stock: min,
            max_stock: None,
        }
    }

    #[test]
    fn test_shortage() {
        assert_eq!(shortage(7, Some(5)), None);
        assert_eq!(shortage(5, Some(5)), None);
        assert_eq!(shortage(4, Some(5)), Some(1));
        assert_eq!(shortage(-2, Some(5)), Some(7));
        assert_eq!(shortage(0, None), None);
    }

    #[test]
    fn test_low_stock_rows_sorted_by_shortage() {
        let snaps = vec![
            snap("A", 4, Some(5)),
            snap("B", 0, Some(10)),
            snap("C", 7, Some(5)),
            snap("D", 0, None),
            snap("E", 9, Some(10)),
        ];
        let rows = low_stock_rows(&snaps);
        let codes: Vec<_> = rows.iter().map(|r| r.code.as_str()).collect();
        assert_eq!(codes, vec!["B", "A", "E"]);
        assert_eq!(rows[1].shortage, 1);
        assert_eq!(rows[1].min_stock, 5);
    }

    #[test]
    fn test_entry_validation() {
        assert!(PolicyEntry::new("A", Some(5), None).validate().is_ok());
        assert!(PolicyEntry::new("B", Some(-1), None).validate().is_err());
        assert!(PolicyEntry::new("C", Some(10), Some(5)).validate().is_err());
        assert!(PolicyEntry::new("", Some(1), None).validate().is_err());
        assert!(PolicyEntry::new("D", None, None).is_noop());
    }

    #[test]
    fn test_entry_accepts_external_code_alias() {
        let entry: PolicyEntry =
            serde_json::from_str(r#"{"external_code":"A","min_stock":5,"max_stock":null}"#).unwrap();
        assert_eq!(entry, PolicyEntry::new("A", Some(5), None));
    }

    #[test]
    fn test_report() {
        let mut report = BulkPolicyReport::default();
        report.record_updated();
        report.record_error("B", "min_stock must be between 0 and 1000000000");
        assert_eq!(report.updated_count, 1);
        assert_eq!(report.errors[0].code, "B");

        let wire = serde_json::to_value(&report).unwrap();
        assert_eq!(wire["errors"][0]["external_code"], "B");
        assert!(wire["errors"][0].get("code").is_none());
    }
}
