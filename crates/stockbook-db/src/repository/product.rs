//! # Product Repository
//!
//! Catalog rows. Stock is not a column; see the projector.
//!
//! ## Listing
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  list_filtered(q = "brake", type = None)                                │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  products LEFT JOIN product_types                                       │
//! │  WHERE code LIKE '%brake%' OR description LIKE '%brake%'               │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  Vec<(Product, type name)>  ──► sorted/paged in stockbook-core          │
//! │                                 once stock is attached                  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::{DateTime, Utc};
use sqlx::{Executor, QueryBuilder, Sqlite, SqlitePool};
use tracing::debug;

use crate::error::{DbError, DbResult};
use stockbook_core::Product;

const PRODUCT_COLUMNS: &str = "p.id, p.code, p.description, p.product_type_id, p.unit_cost_cents, \
     p.min_stock, p.max_stock, p.created_at, p.updated_at";

/// A product with its type name, as returned by listings.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct ProductRow {
    #[sqlx(flatten)]
    pub product: Product,
    pub product_type: Option<String>,
}

/// Repository for product database operations.
#[derive(Debug, Clone)]
pub struct ProductRepository {
    pool: SqlitePool,
}

impl ProductRepository {
    pub fn new(pool: SqlitePool) -> Self {
        ProductRepository { pool }
    }

    /// Gets a product by its ID.
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Product>> {
        Self::find_in(&self.pool, id).await
    }

    /// Gets a product by ID on a caller-supplied executor (e.g. a transaction).
    pub async fn find_in<'e, E>(executor: E, id: &str) -> DbResult<Option<Product>>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        let sql = format!("SELECT {PRODUCT_COLUMNS} FROM products p WHERE p.id = ?1");
        let product = sqlx::query_as::<_, Product>(&sql)
            .bind(id)
            .fetch_optional(executor)
            .await?;
        Ok(product)
    }

    /// Gets a product by its external code. Exact, case-sensitive.
    pub async fn get_by_code(&self, code: &str) -> DbResult<Option<Product>> {
        let sql = format!("SELECT {PRODUCT_COLUMNS} FROM products p WHERE p.code = ?1");
        let product = sqlx::query_as::<_, Product>(&sql)
            .bind(code)
            .fetch_optional(&self.pool)
            .await?;
        Ok(product)
    }

    /// Gets all products whose code is in `codes`.
    pub async fn get_by_codes(&self, codes: &[String]) -> DbResult<Vec<Product>> {
        if codes.is_empty() {
            return Ok(Vec::new());
        }

        debug!(count = codes.len(), "Looking up products by code");

        let mut qb: QueryBuilder<Sqlite> =
            QueryBuilder::new(format!("SELECT {PRODUCT_COLUMNS} FROM products p WHERE p.code IN ("));
        let mut separated = qb.separated(", ");
        for code in codes {
            separated.push_bind(code);
        }
        separated.push_unseparated(")");

        let products = qb.build_query_as::<Product>().fetch_all(&self.pool).await?;
        Ok(products)
    }

    /// Every product, ordered by code.
    pub async fn list_all(&self) -> DbResult<Vec<Product>> {
        let sql = format!("SELECT {PRODUCT_COLUMNS} FROM products p ORDER BY p.code");
        let products = sqlx::query_as::<_, Product>(&sql)
            .fetch_all(&self.pool)
            .await?;
        Ok(products)
    }

    /// Products matching an optional search term and type, with type names.
    ///
    /// `q` is matched as a substring of code or description (ASCII
    /// case-insensitive, SQLite LIKE semantics).
    pub async fn list_filtered(
        &self,
        q: Option<&str>,
        product_type_id: Option<&str>,
    ) -> DbResult<Vec<ProductRow>> {
        debug!(q = ?q, product_type_id = ?product_type_id, "Listing products");

        let mut qb: QueryBuilder<Sqlite> = QueryBuilder::new(format!(
            "SELECT {PRODUCT_COLUMNS}, t.name AS product_type \
             FROM products p LEFT JOIN product_types t ON t.id = p.product_type_id \
             WHERE 1 = 1"
        ));

        if let Some(q) = q.filter(|q| !q.is_empty()) {
            let pattern = format!("%{}%", escape_like(q));
            qb.push(" AND (p.code LIKE ")
                .push_bind(pattern.clone())
                .push(" ESCAPE '\\' OR p.description LIKE ")
                .push_bind(pattern)
                .push(" ESCAPE '\\')");
        }

        if let Some(type_id) = product_type_id {
            qb.push(" AND p.product_type_id = ").push_bind(type_id);
        }

        qb.push(" ORDER BY p.code");

        let rows = qb.build_query_as::<ProductRow>().fetch_all(&self.pool).await?;
        debug!(count = rows.len(), "Listing returned products");
        Ok(rows)
    }

    /// Inserts a new product.
    ///
    /// ## Returns
    /// * `Err(DbError::UniqueViolation)` - code already exists
    /// * `Err(DbError::ForeignKeyViolation)` - unknown product type
    pub async fn insert(&self, product: &Product) -> DbResult<()> {
        debug!(code = %product.code, "Inserting product");

        sqlx::query(
            r#"
            INSERT INTO products (
                id, code, description, product_type_id, unit_cost_cents,
                min_stock, max_stock, created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
            "#,
        )
        .bind(&product.id)
        .bind(&product.code)
        .bind(&product.description)
        .bind(&product.product_type_id)
        .bind(product.unit_cost_cents)
        .bind(product.min_stock)
        .bind(product.max_stock)
        .bind(product.created_at)
        .bind(product.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Writes every mutable catalog field of `product`.
    pub async fn update(&self, product: &Product) -> DbResult<()> {
        debug!(id = %product.id, "Updating product");

        let result = sqlx::query(
            r#"
            UPDATE products SET
                description = ?2,
                product_type_id = ?3,
                unit_cost_cents = ?4,
                min_stock = ?5,
                max_stock = ?6,
                updated_at = ?7
            WHERE id = ?1
            "#,
        )
        .bind(&product.id)
        .bind(&product.description)
        .bind(&product.product_type_id)
        .bind(product.unit_cost_cents)
        .bind(product.min_stock)
        .bind(product.max_stock)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Product", &product.id));
        }

        Ok(())
    }

    /// Overwrites the thresholds that are `Some`; `None` keeps the stored value.
    pub async fn set_policy(
        &self,
        id: &str,
        min_stock: Option<i64>,
        max_stock: Option<i64>,
    ) -> DbResult<()> {
        debug!(id = %id, min_stock = ?min_stock, max_stock = ?max_stock, "Setting policy");

        let result = sqlx::query(
            r#"
            UPDATE products SET
                min_stock = COALESCE(?2, min_stock),
                max_stock = COALESCE(?3, max_stock),
                updated_at = ?4
            WHERE id = ?1
            "#,
        )
        .bind(id)
        .bind(min_stock)
        .bind(max_stock)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Product", id));
        }

        Ok(())
    }

    /// Records the latest known unit cost, inside the ledger transaction.
    pub async fn set_unit_cost_in<'e, E>(
        executor: E,
        id: &str,
        unit_cost_cents: i64,
        at: DateTime<Utc>,
    ) -> DbResult<()>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        debug!(id = %id, unit_cost_cents, "Refreshing catalog unit cost");

        sqlx::query("UPDATE products SET unit_cost_cents = ?2, updated_at = ?3 WHERE id = ?1")
            .bind(id)
            .bind(unit_cost_cents)
            .bind(at)
            .execute(executor)
            .await?;
        Ok(())
    }

    pub async fn count(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM products")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }
}

/// Escapes LIKE wildcards so user input matches literally.
fn escape_like(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for c in input.chars() {
        if matches!(c, '%' | '_' | '\\') {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

/// Generates a new product ID.
pub fn generate_product_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::{Database, DbConfig};

    fn product(code: &str, description: &str) -> Product {
        let now = Utc::now();
        Product {
            id: generate_product_id(),
            code: code.to_string(),
            description: description.to_string(),
            product_type_id: None,
            unit_cost_cents: Some(100),
            min_stock: None,
            max_stock: None,
            created_at: now,
            updated_at: now,
        }
    }

    #[tokio::test]
    async fn test_insert_and_lookup() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let repo = db.products();
        let p = product("BRK-001", "Brake pad");
        repo.insert(&p).await.unwrap();

        let by_id = repo.get_by_id(&p.id).await.unwrap().unwrap();
        assert_eq!(by_id.code, "BRK-001");
        assert!(repo.get_by_code("brk-001").await.unwrap().is_none());

        let found = repo
            .get_by_codes(&["BRK-001".to_string(), "NOPE".to_string()])
            .await
            .unwrap();
        assert_eq!(found.len(), 1);
    }

    #[tokio::test]
    async fn test_duplicate_code_is_unique_violation() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let repo = db.products();
        repo.insert(&product("BRK-001", "Brake pad")).await.unwrap();

        let err = repo.insert(&product("BRK-001", "Other")).await.unwrap_err();
        assert!(matches!(err, DbError::UniqueViolation { ref field, .. } if field == "products.code"));
    }

    #[tokio::test]
    async fn test_list_filtered_matches_code_and_description() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let repo = db.products();
        repo.insert(&product("BRK-001", "Brake pad")).await.unwrap();
        repo.insert(&product("FLT-100", "Oil filter")).await.unwrap();
        repo.insert(&product("FLT-200", "Air filter 50%")).await.unwrap();

        let rows = repo.list_filtered(Some("flt"), None).await.unwrap();
        assert_eq!(rows.len(), 2);

        let rows = repo.list_filtered(Some("brake"), None).await.unwrap();
        assert_eq!(rows[0].product.code, "BRK-001");
        assert!(rows[0].product_type.is_none());

        // Wildcards in the term are literal.
        let rows = repo.list_filtered(Some("50%"), None).await.unwrap();
        assert_eq!(rows.len(), 1);
        let rows = repo.list_filtered(Some("_"), None).await.unwrap();
        assert!(rows.is_empty());
    }

    #[tokio::test]
    async fn test_set_policy_keeps_absent_fields() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let repo = db.products();
        let mut p = product("BRK-001", "Brake pad");
        p.max_stock = Some(40);
        repo.insert(&p).await.unwrap();

        repo.set_policy(&p.id, Some(5), None).await.unwrap();
        let stored = repo.get_by_id(&p.id).await.unwrap().unwrap();
        assert_eq!(stored.min_stock, Some(5));
        assert_eq!(stored.max_stock, Some(40));
    }

    #[test]
    fn test_escape_like() {
        assert_eq!(escape_like("50%_a\\"), "50\\%\\_a\\\\");
    }
}
