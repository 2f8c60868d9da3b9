//! # Movement Repository
//!
//! The ledger table. Insert and read only: the schema rejects UPDATE and
//! DELETE on `movements` with a trigger, and this repository offers neither.
//!
//! ## Ordering
//! ```text
//! seq (INTEGER PRIMARY KEY AUTOINCREMENT) is the replay order.
//!
//!   replay / projector warm-up   ORDER BY seq ASC
//!   history / listings           ORDER BY seq DESC   (newest first)
//!
//! moved_at is never used for ordering; it only bounds point-in-time folds.
//! ```

use sqlx::{Executor, Sqlite, SqlitePool};
use tracing::debug;

use crate::error::DbResult;
use stockbook_core::Movement;

const MOVEMENT_COLUMNS: &str = "seq, id, product_id, kind, quantity, unit_cost_cents, \
     reason, note, actor_role, moved_at";

#[derive(Debug, Clone)]
pub struct MovementRepository {
    pool: SqlitePool,
}

impl MovementRepository {
    pub fn new(pool: SqlitePool) -> Self {
        MovementRepository { pool }
    }

    /// Appends a movement and returns its assigned `seq`.
    ///
    /// `movement.seq` is ignored on input.
    pub async fn insert_in<'e, E>(executor: E, movement: &Movement) -> DbResult<i64>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        debug!(
            id = %movement.id,
            product_id = %movement.product_id,
            kind = %movement.kind,
            quantity = movement.quantity,
            "Appending movement"
        );

        let result = sqlx::query(
            r#"
            INSERT INTO movements (
                id, product_id, kind, quantity, unit_cost_cents,
                reason, note, actor_role, moved_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
            "#,
        )
        .bind(&movement.id)
        .bind(&movement.product_id)
        .bind(movement.kind)
        .bind(movement.quantity)
        .bind(movement.unit_cost_cents)
        .bind(&movement.reason)
        .bind(&movement.note)
        .bind(&movement.actor_role)
        .bind(movement.moved_at)
        .execute(executor)
        .await?;

        Ok(result.last_insert_rowid())
    }

    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Movement>> {
        let sql = format!("SELECT {MOVEMENT_COLUMNS} FROM movements WHERE id = ?1");
        let row = sqlx::query_as::<_, Movement>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row)
    }

    /// A product's movements in replay order.
    pub async fn for_product_in_order(&self, product_id: &str) -> DbResult<Vec<Movement>> {
        let sql = format!(
            "SELECT {MOVEMENT_COLUMNS} FROM movements WHERE product_id = ?1 ORDER BY seq ASC"
        );
        let rows = sqlx::query_as::<_, Movement>(&sql)
            .bind(product_id)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows)
    }

    /// A product's movements after `seq`, in replay order.
    ///
    /// Runs on the writer's transaction so the tail it returns is the one the
    /// stock check sees, whichever process appended it.
    pub async fn for_product_after_in<'e, E>(
        executor: E,
        product_id: &str,
        seq: i64,
    ) -> DbResult<Vec<Movement>>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        let sql = format!(
            "SELECT {MOVEMENT_COLUMNS} FROM movements \
             WHERE product_id = ?1 AND seq > ?2 ORDER BY seq ASC"
        );
        let rows = sqlx::query_as::<_, Movement>(&sql)
            .bind(product_id)
            .bind(seq)
            .fetch_all(executor)
            .await?;
        Ok(rows)
    }

    /// The whole ledger in replay order. Used to warm the projector.
    pub async fn all_in_order(&self) -> DbResult<Vec<Movement>> {
        let sql = format!("SELECT {MOVEMENT_COLUMNS} FROM movements ORDER BY seq ASC");
        let rows = sqlx::query_as::<_, Movement>(&sql)
            .fetch_all(&self.pool)
            .await?;
        debug!(count = rows.len(), "Loaded ledger");
        Ok(rows)
    }

    /// Movements appended after `seq`, in replay order.
    pub async fn since(&self, seq: i64) -> DbResult<Vec<Movement>> {
        let sql = format!(
            "SELECT {MOVEMENT_COLUMNS} FROM movements WHERE seq > ?1 ORDER BY seq ASC"
        );
        let rows = sqlx::query_as::<_, Movement>(&sql)
            .bind(seq)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows)
    }

    /// A product's movements, newest first.
    pub async fn history(&self, product_id: &str) -> DbResult<Vec<Movement>> {
        let sql = format!(
            "SELECT {MOVEMENT_COLUMNS} FROM movements WHERE product_id = ?1 ORDER BY seq DESC"
        );
        let rows = sqlx::query_as::<_, Movement>(&sql)
            .bind(product_id)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows)
    }

    /// Global ledger page, newest first.
    pub async fn list(&self, limit: u32, offset: u32) -> DbResult<Vec<Movement>> {
        let sql = format!(
            "SELECT {MOVEMENT_COLUMNS} FROM movements ORDER BY seq DESC LIMIT ?1 OFFSET ?2"
        );
        let rows = sqlx::query_as::<_, Movement>(&sql)
            .bind(limit)
            .bind(offset)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows)
    }

    pub async fn count(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM movements")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }
}

/// Generates a new movement ID.
pub fn generate_movement_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

// =============================================================================
// Unit Tests
// =============================================================================
