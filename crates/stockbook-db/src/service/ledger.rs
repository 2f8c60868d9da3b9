//! Ledger writes and reads.

use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::{Sqlite, Transaction};
use tracing::{debug, info};

use super::Inventory;
use crate::error::{DbError, DbResult};
use crate::repository::movement::{generate_movement_id, MovementRepository};
use crate::repository::product::ProductRepository;
use stockbook_core::auth::authorize_movement;
use stockbook_core::validation::{validate_optional_text, validate_quantity, validate_unit_cost};
use stockbook_core::{Movement, MovementKind, NewMovement, Projection, ValidationError};

/// Incremental projection next to a fresh replay of the same product.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProjectionCheck {
    pub product_id: String,
    pub incremental: Projection,
    pub replayed: Projection,
}

impl ProjectionCheck {
    pub fn is_consistent(&self) -> bool {
        self.incremental.stock == self.replayed.stock
            && self.incremental.last_unit_cost_cents == self.replayed.last_unit_cost_cents
            && self.incremental.last_seq == self.replayed.last_seq
    }
}

fn validate_new_movement(movement: &NewMovement) -> Result<(), ValidationError> {
    validate_quantity(movement.quantity)?;
    if let Some(cost) = movement.unit_cost_cents {
        validate_unit_cost("unit_cost_cents", cost)?;
    }
    validate_optional_text("reason", movement.reason.as_deref())?;
    validate_optional_text("note", movement.note.as_deref())
}

impl Inventory {
    /// Appends one movement to the ledger.
    ///
    /// ## Errors
    /// - `Validation`: bad quantity/cost/text, or unknown product
    /// - `Unauthorized`: role may not append this kind (or this much)
    /// - `InsufficientStock`: OUT larger than projected stock
    /// - `Conflict`: the product lock was not obtained in time
    pub async fn append(&self, movement: NewMovement, actor_role: &str) -> DbResult<Movement> {
        validate_new_movement(&movement)?;
        let role = authorize_movement(
            actor_role,
            movement.kind,
            movement.quantity,
            self.settings.approval_threshold,
        )?;

        let _guard = self
            .locks
            .acquire(&movement.product_id, self.settings.lock_timeout)
            .await?;

        let mut tx = self.db.begin_write().await?;

        let product = ProductRepository::find_in(&mut *tx, &movement.product_id)
            .await?
            .ok_or_else(|| ValidationError::UnknownReference {
                field: "product_id".to_string(),
                value: movement.product_id.clone(),
            })?;

        let mut projection = self.projection_in(&mut tx, &product.id).await?;
        if movement.kind == MovementKind::Out {
            projection.ensure_can_issue(&product.code, movement.quantity)?;
        }

        let mut record = Movement {
            id: generate_movement_id(),
            seq: 0,
            product_id: product.id.clone(),
            kind: movement.kind,
            quantity: movement.quantity,
            unit_cost_cents: movement.unit_cost_cents,
            reason: movement.reason,
            note: movement.note,
            actor_role: role.as_str().to_string(),
            moved_at: projection.next_timestamp(Utc::now()),
        };
        record.seq = MovementRepository::insert_in(&mut *tx, &record).await?;

        if let (MovementKind::In | MovementKind::Adj, Some(cost)) = (record.kind, record.unit_cost_cents) {
            ProductRepository::set_unit_cost_in(&mut *tx, &product.id, cost, record.moved_at).await?;
        }

        tx.commit().await?;
        projection.apply_movement(&record);
        self.projector.store(&product.id, projection);

        info!(
            seq = record.seq,
            code = %product.code,
            kind = %record.kind,
            quantity = record.quantity,
            role = %role,
            "Movement appended"
        );

        Ok(record)
    }

    /// A product's movements, newest first.
    pub async fn product_history(&self, product_id: &str) -> DbResult<Vec<Movement>> {
        self.require_product(product_id).await?;
        self.db.movements().history(product_id).await
    }

    /// Global ledger page, newest first.
    pub async fn list_movements(&self, limit: Option<u32>, offset: u32) -> DbResult<Vec<Movement>> {
        let limit = self.page_limit(limit);
        debug!(limit, offset, "Listing movements");
        self.db.movements().list(limit, offset).await
    }

    /// Stock as it stood at `at`, folded in insertion order.
    pub async fn stock_as_of(&self, product_id: &str, at: DateTime<Utc>) -> DbResult<Projection> {
        self.require_product(product_id).await?;
        let movements = self.db.movements().for_product_in_order(product_id).await?;
        Ok(Projection::replay_until(&movements, at))
    }

    /// Replays one product from the ledger and sets it beside the cache.
    pub async fn verify_projection(&self, product_id: &str) -> DbResult<ProjectionCheck> {
        self.require_product(product_id).await?;

        // Both reads share one snapshot; the lock keeps this engine's own
        // appends from landing in the cache mid-check.
        let _guard = self.locks.acquire(product_id, self.settings.lock_timeout).await?;
        let mut tx = self.db.pool().begin().await?;
        let incremental = self.projection_in(&mut tx, product_id).await?;
        let movements = MovementRepository::for_product_after_in(&mut *tx, product_id, 0).await?;
        tx.commit().await?;
        self.projector.store(product_id, incremental);

        Ok(ProjectionCheck {
            product_id: product_id.to_string(),
            incremental,
            replayed: Projection::replay(&movements),
        })
    }

    /// The cached projection brought up to date with the ledger as `tx`
    /// sees it. Movements committed by another engine on the same database,
    /// or by a write whose cache update never ran, are folded in here.
    pub(super) async fn projection_in(
        &self,
        tx: &mut Transaction<'static, Sqlite>,
        product_id: &str,
    ) -> DbResult<Projection> {
        let mut projection = self.projector.get(product_id);
        let tail =
            MovementRepository::for_product_after_in(&mut **tx, product_id, projection.last_seq)
                .await?;
        if !tail.is_empty() {
            debug!(product_id, behind = tail.len(), "Projection caught up from ledger");
            for movement in &tail {
                projection.apply_movement(movement);
            }
        }
        Ok(projection)
    }

    pub(super) async fn require_product(&self, product_id: &str) -> DbResult<stockbook_core::Product> {
        self.db
            .products()
            .get_by_id(product_id)
            .await?
            .ok_or_else(|| DbError::not_found("Product", product_id))
    }

    pub(super) fn page_limit(&self, requested: Option<u32>) -> u32 {
        stockbook_core::catalog::page_size(
            requested,
            self.settings.default_page_size,
            self.settings.max_page_size,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_movement_field_validation() {
        let ok = NewMovement::new("p1", MovementKind::In, 5).with_unit_cost(100);
        assert!(validate_new_movement(&ok).is_ok());

        let zero = NewMovement::new("p1", MovementKind::Out, 0);
        assert!(matches!(
            validate_new_movement(&zero),
            Err(ValidationError::MustBePositive { .. })
        ));

        let negative_cost = NewMovement::new("p1", MovementKind::In, 1).with_unit_cost(-1);
        assert!(matches!(
            validate_new_movement(&negative_cost),
            Err(ValidationError::OutOfRange { .. })
        ));

        let long_note = NewMovement::new("p1", MovementKind::In, 1).with_note("x".repeat(501));
        assert!(matches!(
            validate_new_movement(&long_note),
            Err(ValidationError::TooLong { .. })
        ));
    }
}
