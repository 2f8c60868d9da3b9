//! Sales: one OUT movement and one sale row, committed together.

use chrono::Utc;
use tracing::info;

use super::Inventory;
use crate::error::{DbError, DbResult};
use crate::repository::movement::{generate_movement_id, MovementRepository};
use crate::repository::product::ProductRepository;
use crate::repository::sale::{generate_sale_id, SaleRepository};
use stockbook_core::auth::authorize_movement;
use stockbook_core::sale::{quote, validate_new_sale};
use stockbook_core::{Movement, MovementKind, NewSale, Sale, ValidationError, SALE_REASON};

impl Inventory {
    /// Records a sale.
    ///
    /// The OUT movement (reason `SALE`) and the sale row are written in one
    /// transaction. On any error neither exists.
    ///
    /// ## Errors
    /// Same taxonomy as [`Inventory::append`], plus `Validation(MissingPrice)`
    /// when neither an override price nor a catalog cost is available.
    pub async fn create_sale(&self, sale: NewSale, actor_role: &str) -> DbResult<Sale> {
        validate_new_sale(&sale)?;
        let role = authorize_movement(
            actor_role,
            MovementKind::Out,
            sale.quantity,
            self.settings.approval_threshold,
        )?;

        let _guard = self
            .locks
            .acquire(&sale.product_id, self.settings.lock_timeout)
            .await?;

        let mut tx = self.db.begin_write().await?;

        let product = ProductRepository::find_in(&mut *tx, &sale.product_id)
            .await?
            .ok_or_else(|| ValidationError::UnknownReference {
                field: "product_id".to_string(),
                value: sale.product_id.clone(),
            })?;

        let priced = quote(&product, sale.quantity, sale.unit_price_cents)?;

        let mut projection = self.projection_in(&mut tx, &product.id).await?;
        projection.ensure_can_issue(&product.code, sale.quantity)?;

        let moved_at = projection.next_timestamp(Utc::now());
        let mut movement = Movement {
            id: generate_movement_id(),
            seq: 0,
            product_id: product.id.clone(),
            kind: MovementKind::Out,
            quantity: sale.quantity,
            unit_cost_cents: None,
            reason: Some(SALE_REASON.to_string()),
            note: sale.note.clone(),
            actor_role: role.as_str().to_string(),
            moved_at,
        };
        movement.seq = MovementRepository::insert_in(&mut *tx, &movement).await?;

        let record = Sale {
            id: generate_sale_id(),
            product_id: product.id.clone(),
            movement_id: movement.id.clone(),
            quantity: sale.quantity,
            unit_price_cents: sale.unit_price_cents,
            total_cents: priced.total.cents(),
            customer: sale.customer,
            note: sale.note,
            actor_role: role.as_str().to_string(),
            created_at: moved_at,
        };
        SaleRepository::insert_in(&mut *tx, &record).await?;

        tx.commit().await?;
        projection.apply_movement(&movement);
        self.projector.store(&product.id, projection);

        info!(
            sale_id = %record.id,
            code = %product.code,
            quantity = record.quantity,
            total = %priced.total,
            role = %role,
            "Sale recorded"
        );

        Ok(record)
    }

    /// Sales, newest first.
    pub async fn list_sales(&self, limit: Option<u32>, offset: u32) -> DbResult<Vec<Sale>> {
        let limit = self.page_limit(limit);
        self.db.sales().list(limit, offset).await
    }

    pub async fn get_sale(&self, sale_id: &str) -> DbResult<Sale> {
        self.db
            .sales()
            .get_by_id(sale_id)
            .await?
            .ok_or_else(|| DbError::not_found("Sale", sale_id))
    }
}
