//! Catalog management and derived stock reads.

use chrono::Utc;
use tracing::{debug, info};

use super::Inventory;
use crate::error::{DbError, DbResult};
use crate::repository::product::generate_product_id;
use stockbook_core::auth::require_admin;
use stockbook_core::catalog::{arrange, ProductPage, ProductQuery, ProductView};
use stockbook_core::validation::{
    validate_code, validate_description, validate_search_query, validate_thresholds,
    validate_type_name, validate_unit_cost,
};
use stockbook_core::{
    Money, NewProduct, Product, ProductType, ProductUpdate, Projection, ValidationError,
};

impl Inventory {
    // =========================================================================
    // Products
    // =========================================================================

    /// Adds a product to the catalog. Admin only.
    pub async fn create_product(&self, new: NewProduct, actor_role: &str) -> DbResult<Product> {
        require_admin(actor_role, "create products")?;

        validate_code(&new.code)?;
        validate_description(&new.description)?;
        if let Some(cost) = new.unit_cost_cents {
            validate_unit_cost("unit_cost_cents", cost)?;
        }
        validate_thresholds(new.min_stock, new.max_stock)?;

        let code = new.code.trim().to_string();
        if self.db.products().get_by_code(&code).await?.is_some() {
            return Err(duplicate_code(&code));
        }
        if let Some(type_id) = &new.product_type_id {
            self.require_product_type(type_id).await?;
        }

        let now = Utc::now();
        let product = Product {
            id: generate_product_id(),
            code,
            description: new.description.trim().to_string(),
            product_type_id: new.product_type_id,
            unit_cost_cents: new.unit_cost_cents,
            min_stock: new.min_stock,
            max_stock: new.max_stock,
            created_at: now,
            updated_at: now,
        };

        match self.db.products().insert(&product).await {
            Ok(()) => {}
            // Lost a race with another insert of the same code
            Err(DbError::UniqueViolation { .. }) => return Err(duplicate_code(&product.code)),
            Err(err) => return Err(err),
        }

        info!(id = %product.id, code = %product.code, "Product created");
        Ok(product)
    }

    /// Partially updates a product. Admin only.
    pub async fn update_product(
        &self,
        product_id: &str,
        update: ProductUpdate,
        actor_role: &str,
    ) -> DbResult<Product> {
        require_admin(actor_role, "update products")?;

        if let Some(description) = &update.description {
            validate_description(description)?;
        }
        if let Some(cost) = update.unit_cost_cents {
            validate_unit_cost("unit_cost_cents", cost)?;
        }
        if let Some(type_id) = &update.product_type_id {
            self.require_product_type(type_id).await?;
        }

        let _guard = self.locks.acquire(product_id, self.settings.lock_timeout).await?;

        let mut product = self.require_product(product_id).await?;
        if update.is_empty() {
            return Ok(product);
        }

        update.apply_to(&mut product);
        validate_thresholds(product.min_stock, product.max_stock)?;
        product.updated_at = Utc::now();

        self.db.products().update(&product).await?;

        info!(id = %product.id, code = %product.code, "Product updated");
        Ok(product)
    }

    pub async fn get_product(&self, product_id: &str) -> DbResult<Product> {
        self.require_product(product_id).await
    }

    pub async fn get_product_by_code(&self, code: &str) -> DbResult<Product> {
        self.db
            .products()
            .get_by_code(code.trim())
            .await?
            .ok_or_else(|| DbError::not_found("Product", code))
    }

    /// Searches, filters, sorts and pages the catalog.
    pub async fn list_products(&self, query: ProductQuery) -> DbResult<ProductPage> {
        let q = query.q.as_deref().map(validate_search_query).transpose()?;
        let limit = self.page_limit(query.limit);

        let rows = self
            .db
            .products()
            .list_filtered(q.as_deref(), query.product_type_id.as_deref())
            .await?;

        let views = rows
            .into_iter()
            .map(|row| {
                let projection = self.projector.get(&row.product.id);
                ProductView::compose(row.product, row.product_type, &projection)
            })
            .collect();

        let page = arrange(views, &query, limit);
        debug!(total = page.total, returned = page.items.len(), "Catalog page built");
        Ok(page)
    }

    // =========================================================================
    // Product Types
    // =========================================================================

    /// Adds a product classification. Admin only.
    pub async fn create_product_type(&self, name: &str, actor_role: &str) -> DbResult<ProductType> {
        require_admin(actor_role, "create product types")?;
        validate_type_name(name)?;

        let name = name.trim().to_string();
        let repo = self.db.product_types();
        if repo.get_by_name(&name).await?.is_some() {
            return Err(ValidationError::Duplicate {
                field: "name".to_string(),
                value: name,
            }
            .into());
        }

        let product_type = ProductType {
            id: uuid::Uuid::new_v4().to_string(),
            name,
            created_at: Utc::now(),
        };
        repo.insert(&product_type).await?;

        info!(id = %product_type.id, name = %product_type.name, "Product type created");
        Ok(product_type)
    }

    pub async fn list_product_types(&self) -> DbResult<Vec<ProductType>> {
        self.db.product_types().list().await
    }

    async fn require_product_type(&self, type_id: &str) -> DbResult<ProductType> {
        self.db
            .product_types()
            .get_by_id(type_id)
            .await?
            .ok_or_else(|| {
                ValidationError::UnknownReference {
                    field: "product_type_id".to_string(),
                    value: type_id.to_string(),
                }
                .into()
            })
    }

    // =========================================================================
    // Derived State
    // =========================================================================

    /// Current projected stock.
    pub async fn stock(&self, product_id: &str) -> DbResult<i64> {
        self.require_product(product_id).await?;
        Ok(self.projector.get(product_id).stock)
    }

    /// stock × last known unit cost.
    pub async fn valuation(&self, product_id: &str) -> DbResult<Money> {
        let product = self.require_product(product_id).await?;
        Ok(self.projector.get(product_id).valuation(product.unit_cost_cents))
    }

    /// Full cached projection for a product.
    pub async fn projection(&self, product_id: &str) -> DbResult<Projection> {
        self.require_product(product_id).await?;
        Ok(self.projector.get(product_id))
    }
}

fn duplicate_code(code: &str) -> DbError {
    ValidationError::Duplicate {
        field: "code".to_string(),
        value: code.to_string(),
    }
    .into()
}
