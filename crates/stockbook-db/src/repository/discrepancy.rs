//! # Resolution Repository
//!
//! Append-only annotations on discrepancy findings. Findings themselves are
//! computed by the detector and never stored.

use sqlx::{Executor, Sqlite, SqlitePool};
use tracing::debug;

use crate::error::DbResult;
use stockbook_core::Resolution;

const RESOLUTION_COLUMNS: &str = "seq, id, product_id, kind, stock_at, unit_cost_at_cents, \
     note, resolver_role, resolved_at";

#[derive(Debug, Clone)]
pub struct ResolutionRepository {
    pool: SqlitePool,
}

impl ResolutionRepository {
    pub fn new(pool: SqlitePool) -> Self {
        ResolutionRepository { pool }
    }

    /// Records a resolution and returns its `seq`.
    pub async fn insert_in<'e, E>(executor: E, resolution: &Resolution) -> DbResult<i64>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        debug!(
            product_id = %resolution.product_id,
            kind = %resolution.kind,
            stock_at = resolution.stock_at,
            "Recording resolution"
        );

        let result = sqlx::query(
            r#"
            INSERT INTO discrepancy_resolutions (
                id, product_id, kind, stock_at, unit_cost_at_cents,
                note, resolver_role, resolved_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
            "#,
        )
        .bind(&resolution.id)
        .bind(&resolution.product_id)
        .bind(resolution.kind)
        .bind(resolution.stock_at)
        .bind(resolution.unit_cost_at_cents)
        .bind(&resolution.note)
        .bind(&resolution.resolver_role)
        .bind(resolution.resolved_at)
        .execute(executor)
        .await?;

        Ok(result.last_insert_rowid())
    }

    /// Every resolution in recording order.
    pub async fn all(&self) -> DbResult<Vec<Resolution>> {
        let sql = format!("SELECT {RESOLUTION_COLUMNS} FROM discrepancy_resolutions ORDER BY seq ASC");
        let rows = sqlx::query_as::<_, Resolution>(&sql)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows)
    }

    /// One product's resolutions in recording order.
    pub async fn for_product(&self, product_id: &str) -> DbResult<Vec<Resolution>> {
        let sql = format!(
            "SELECT {RESOLUTION_COLUMNS} FROM discrepancy_resolutions \
             WHERE product_id = ?1 ORDER BY seq ASC"
        );
        let rows = sqlx::query_as::<_, Resolution>(&sql)
            .bind(product_id)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows)
    }
}

/// Generates a new resolution ID.
pub fn generate_resolution_id() -> String {
    uuid::Uuid::new_v4().to_string()
}
