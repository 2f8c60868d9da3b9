//! Discrepancy scans and resolutions.

use chrono::Utc;
use tracing::{debug, info};

use super::Inventory;
use crate::error::{DbError, DbResult};
use crate::repository::discrepancy::{generate_resolution_id, ResolutionRepository};
use stockbook_core::auth::require_known_role;
use stockbook_core::discrepancy::ResolutionIndex;
use stockbook_core::validation::validate_optional_text;
use stockbook_core::{DiscrepancyKind, DiscrepancyScan, Finding, Product, Resolution, StockSnapshot};

impl Inventory {
    /// Starts a fresh scan over the current catalog and projections.
    ///
    /// The returned iterator owns its snapshot; later writes do not affect
    /// it and calling `scan` again starts over.
    pub async fn scan(&self) -> DbResult<DiscrepancyScan> {
        let products = self.db.products().list_all().await?;
        let resolutions = self.db.resolutions().all().await?;

        let snapshots: Vec<_> = products.into_iter().map(|p| self.snapshot(p)).collect();
        debug!(products = snapshots.len(), resolutions = resolutions.len(), "Starting discrepancy scan");

        Ok(DiscrepancyScan::new(
            snapshots,
            ResolutionIndex::new(resolutions),
            self.expected.clone(),
        ))
    }

    /// Unresolved findings only.
    pub async fn open_discrepancies(&self) -> DbResult<Vec<Finding>> {
        Ok(self.scan().await?.filter(Finding::is_open).collect())
    }

    /// Marks the open finding of `kind` on a product as resolved.
    ///
    /// The ledger is not touched. If stock or cost later changes, the
    /// condition counts as new and shows up open again.
    pub async fn resolve_discrepancy(
        &self,
        product_id: &str,
        kind: DiscrepancyKind,
        note: Option<String>,
        actor_role: &str,
    ) -> DbResult<Resolution> {
        let role = require_known_role(actor_role, "resolve discrepancies")?;
        validate_optional_text("note", note.as_deref())?;

        let _guard = self.locks.acquire(product_id, self.settings.lock_timeout).await?;

        let product = self.require_product(product_id).await?;
        let resolutions = self.db.resolutions().for_product(product_id).await?;
        let snapshot = self.snapshot(product);

        let finding = DiscrepancyScan::new(
            vec![snapshot],
            ResolutionIndex::new(resolutions),
            self.expected.clone(),
        )
        .find(|f| f.kind == kind && f.is_open())
        .ok_or_else(|| DbError::not_found("Finding", format!("{product_id}/{kind}")))?;

        let mut resolution = Resolution {
            id: generate_resolution_id(),
            seq: 0,
            product_id: finding.product_id,
            kind,
            stock_at: finding.stock,
            unit_cost_at_cents: finding.unit_cost_cents,
            note,
            resolver_role: role.as_str().to_string(),
            resolved_at: Utc::now(),
        };
        resolution.seq = ResolutionRepository::insert_in(self.db.pool(), &resolution).await?;

        info!(
            code = %finding.code,
            kind = %kind,
            stock = resolution.stock_at,
            role = %role,
            "Discrepancy resolved"
        );

        Ok(resolution)
    }

    /// Recorded resolutions for a product, oldest first.
    pub async fn resolution_history(&self, product_id: &str) -> DbResult<Vec<Resolution>> {
        self.require_product(product_id).await?;
        self.db.resolutions().for_product(product_id).await
    }

    pub(super) fn snapshot(&self, product: Product) -> StockSnapshot {
        let projection = self.projector.get(&product.id);
        StockSnapshot {
            unit_cost_cents: projection.effective_unit_cost(product.unit_cost_cents),
            stock: projection.stock,
            product_id: product.id,
            code: product.code,
            description: product.description,
            min_stock: product.min_stock,
            max_stock: product.max_stock,
        }
    }
}
