//! # Sale Repository
//!
//! Sale rows are only ever written by the engine, inside the same
//! transaction as their OUT movement.
//!
//! ## Sale ⇄ Movement
//! ```text
//! ┌──────────────────────┐        ┌──────────────────────┐
//! │ sales                │        │ movements            │
//! │  id                  │        │  id  ◄───────────────┼── UNIQUE link
//! │  movement_id ────────┼───────►│  kind = 'OUT'        │
//! │  total_cents         │        │  reason = 'SALE'     │
//! └──────────────────────┘        └──────────────────────┘
//!          written together in one transaction, or not at all
//! ```

use sqlx::{Executor, Sqlite, SqlitePool};
use tracing::debug;

use crate::error::DbResult;
use stockbook_core::Sale;

const SALE_COLUMNS: &str = "id, product_id, movement_id, quantity, unit_price_cents, \
     total_cents, customer, note, actor_role, created_at";

#[derive(Debug, Clone)]
pub struct SaleRepository {
    pool: SqlitePool,
}

impl SaleRepository {
    pub fn new(pool: SqlitePool) -> Self {
        SaleRepository { pool }
    }

    /// Inserts a sale on the caller's transaction.
    pub async fn insert_in<'e, E>(executor: E, sale: &Sale) -> DbResult<()>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        debug!(id = %sale.id, movement_id = %sale.movement_id, "Inserting sale");

        sqlx::query(
            r#"
            INSERT INTO sales (
                id, product_id, movement_id, quantity, unit_price_cents,
                total_cents, customer, note, actor_role, created_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
            "#,
        )
        .bind(&sale.id)
        .bind(&sale.product_id)
        .bind(&sale.movement_id)
        .bind(sale.quantity)
        .bind(sale.unit_price_cents)
        .bind(sale.total_cents)
        .bind(&sale.customer)
        .bind(&sale.note)
        .bind(&sale.actor_role)
        .bind(sale.created_at)
        .execute(executor)
        .await?;

        Ok(())
    }

    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Sale>> {
        let sql = format!("SELECT {SALE_COLUMNS} FROM sales WHERE id = ?1");
        let sale = sqlx::query_as::<_, Sale>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(sale)
    }

    pub async fn get_by_movement(&self, movement_id: &str) -> DbResult<Option<Sale>> {
        let sql = format!("SELECT {SALE_COLUMNS} FROM sales WHERE movement_id = ?1");
        let sale = sqlx::query_as::<_, Sale>(&sql)
            .bind(movement_id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(sale)
    }

    /// Newest first. Ties on `created_at` fall back to the movement order.
    pub async fn list(&self, limit: u32, offset: u32) -> DbResult<Vec<Sale>> {
        let sql = "SELECT s.id, s.product_id, s.movement_id, s.quantity, s.unit_price_cents, \
             s.total_cents, s.customer, s.note, s.actor_role, s.created_at \
             FROM sales s JOIN movements m ON m.id = s.movement_id \
             ORDER BY m.seq DESC LIMIT ?1 OFFSET ?2";
        let sales = sqlx::query_as::<_, Sale>(sql)
            .bind(limit)
            .bind(offset)
            .fetch_all(&self.pool)
            .await?;
        Ok(sales)
    }

    pub async fn count(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM sales")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }
}

/// Generates a new sale ID.
pub fn generate_sale_id() -> String {
    uuid::Uuid::new_v4().to_string()
}
