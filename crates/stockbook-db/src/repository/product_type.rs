//! # Product Type Repository

use sqlx::SqlitePool;
use tracing::debug;

use crate::error::DbResult;
use stockbook_core::ProductType;

#[derive(Debug, Clone)]
pub struct ProductTypeRepository {
    pool: SqlitePool,
}

impl ProductTypeRepository {
    pub fn new(pool: SqlitePool) -> Self {
        ProductTypeRepository { pool }
    }

    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<ProductType>> {
        let row = sqlx::query_as::<_, ProductType>(
            "SELECT id, name, created_at FROM product_types WHERE id = ?1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row)
    }

    pub async fn get_by_name(&self, name: &str) -> DbResult<Option<ProductType>> {
        let row = sqlx::query_as::<_, ProductType>(
            "SELECT id, name, created_at FROM product_types WHERE name = ?1",
        )
        .bind(name)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row)
    }

    /// All types ordered by name.
    pub async fn list(&self) -> DbResult<Vec<ProductType>> {
        let rows = sqlx::query_as::<_, ProductType>(
            "SELECT id, name, created_at FROM product_types ORDER BY name",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    pub async fn insert(&self, product_type: &ProductType) -> DbResult<()> {
        debug!(name = %product_type.name, "Inserting product type");

        sqlx::query("INSERT INTO product_types (id, name, created_at) VALUES (?1, ?2, ?3)")
            .bind(&product_type.id)
            .bind(&product_type.name)
            .bind(product_type.created_at)
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}
