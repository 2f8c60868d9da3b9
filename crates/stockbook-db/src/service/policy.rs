//! Low-stock report and stock thresholds.

use tracing::{debug, info};

use super::Inventory;
use crate::error::{DbError, DbResult};
use stockbook_core::auth::require_admin;
use stockbook_core::policy::{low_stock_rows, BulkPolicyReport, LowStockRow, PolicyEntry, PolicyThreshold};
use stockbook_core::validation::validate_thresholds;

impl Inventory {
    /// Products below their minimum, largest shortage first.
    pub async fn low_stock(&self) -> DbResult<Vec<LowStockRow>> {
        let products = self.db.products().list_all().await?;
        let snapshots: Vec<_> = products
            .into_iter()
            .filter(|p| p.min_stock.is_some())
            .map(|p| self.snapshot(p))
            .collect();
        Ok(low_stock_rows(&snapshots))
    }

    /// Current thresholds for one product.
    pub async fn policy(&self, product_id: &str) -> DbResult<PolicyThreshold> {
        let product = self.require_product(product_id).await?;
        Ok(PolicyThreshold {
            product_id: product.id,
            code: product.code,
            min_stock: product.min_stock,
            max_stock: product.max_stock,
        })
    }

    /// Applies thresholds row by row. Admin only.
    ///
    /// Bad rows (unknown code, no bound given, negative value, min > max,
    /// lock timeout) are reported and skipped; the rest commit independently.
    /// Storage failures abort the batch, leaving earlier rows applied.
    pub async fn bulk_set_policy(
        &self,
        entries: Vec<PolicyEntry>,
        actor_role: &str,
    ) -> DbResult<BulkPolicyReport> {
        require_admin(actor_role, "set stock policy")?;

        let mut report = BulkPolicyReport::default();
        for entry in &entries {
            if let Err(err) = entry.validate() {
                report.record_error(&entry.code, err);
                continue;
            }
            if entry.is_noop() {
                report.record_error(entry.code.trim(), "neither min_stock nor max_stock given");
                continue;
            }

            let code = entry.code.trim();
            let Some(product) = self.db.products().get_by_code(code).await? else {
                report.record_error(code, format!("Unknown product code: {code}"));
                continue;
            };

            let _guard = match self.locks.acquire(&product.id, self.settings.lock_timeout).await {
                Ok(guard) => guard,
                Err(err @ DbError::Domain(_)) => {
                    report.record_error(code, err);
                    continue;
                }
                Err(err) => return Err(err),
            };

            let product = self.require_product(&product.id).await?;

            // The merged pair must still be ordered.
            let min = entry.min_stock.or(product.min_stock);
            let max = entry.max_stock.or(product.max_stock);
            if let Err(err) = validate_thresholds(min, max) {
                report.record_error(code, err);
                continue;
            }

            self.db
                .products()
                .set_policy(&product.id, entry.min_stock, entry.max_stock)
                .await?;
            debug!(code = %code, min_stock = ?min, max_stock = ?max, "Policy row applied");
            report.record_updated();
        }

        info!(
            rows = entries.len(),
            updated = report.updated_count,
            rejected = report.errors.len(),
            "Bulk policy update finished"
        );

        Ok(report)
    }
}
