//! Engines that share one database file, and ledger rows the cache never saw.

mod common;

use chrono::Utc;
use stockbook_core::{CoreError, Movement, MovementKind, NewMovement, NewSale, Projection};
use stockbook_db::repository::movement::generate_movement_id;
use stockbook_db::{DbError, Inventory, LedgerConfig, MovementRepository};
use tempfile::TempDir;

async fn open_shared(dir: &TempDir) -> (Inventory, Inventory) {
    let mut config = LedgerConfig::default();
    config.database.path = dir.path().join("stockbook.db");
    let a = Inventory::from_config(&config).await.unwrap();
    let b = Inventory::from_config(&config).await.unwrap();
    (a, b)
}

async fn ledger_stock(inventory: &Inventory, product_id: &str) -> i64 {
    let movements = inventory
        .database()
        .movements()
        .for_product_in_order(product_id)
        .await
        .unwrap();
    Projection::replay(&movements).stock
}

#[tokio::test]
async fn test_second_engine_cannot_take_the_last_unit_twice() {
    let dir = tempfile::tempdir().unwrap();
    let (a, b) = open_shared(&dir).await;

    let p = common::product(&a, "LAST").await;
    common::receive(&a, &p, 1, 100).await;

    a.append(NewMovement::new(&p.id, MovementKind::Out, 1), "sales")
        .await
        .unwrap();

    let err = b
        .append(NewMovement::new(&p.id, MovementKind::Out, 1), "sales")
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        DbError::Domain(CoreError::InsufficientStock { available: 0, requested: 1, .. })
    ));

    let err = b
        .create_sale(NewSale::new(&p.id, 1).with_unit_price(100), "sales")
        .await
        .unwrap_err();
    assert!(matches!(err, DbError::Domain(CoreError::InsufficientStock { .. })));

    assert_eq!(ledger_stock(&a, &p.id).await, 0);
}

#[tokio::test]
async fn test_writes_see_receipts_made_by_the_other_engine() {
    let dir = tempfile::tempdir().unwrap();
    let (a, b) = open_shared(&dir).await;

    let p = common::product(&a, "SHARED").await;
    common::receive(&a, &p, 1, 100).await;
    common::receive(&b, &p, 2, 120).await;

    // A never applied B's receipt, but the sale still sees 3 units.
    let sale = a
        .create_sale(NewSale::new(&p.id, 3), "sales")
        .await
        .unwrap();
    assert_eq!(sale.unit_price_cents, None);
    assert_eq!(a.stock(&p.id).await.unwrap(), 0);
    assert_eq!(ledger_stock(&a, &p.id).await, 0);

    for engine in [&a, &b] {
        let check = engine.verify_projection(&p.id).await.unwrap();
        assert!(check.is_consistent(), "{check:?}");
        assert_eq!(check.incremental.stock, 0);
        assert_eq!(check.incremental.last_unit_cost_cents, Some(120));
    }
}

#[tokio::test]
async fn test_committed_row_missing_from_cache_is_caught_up() {
    let inventory = common::inventory().await;
    let p = common::product(&inventory, "GAP").await;
    common::receive(&inventory, &p, 1, 100).await;

    // A committed OUT whose cache update never ran.
    let orphan = Movement {
        id: generate_movement_id(),
        seq: 0,
        product_id: p.id.clone(),
        kind: MovementKind::Out,
        quantity: 1,
        unit_cost_cents: None,
        reason: None,
        note: None,
        actor_role: "sales".to_string(),
        moved_at: Utc::now(),
    };
    MovementRepository::insert_in(inventory.database().pool(), &orphan)
        .await
        .unwrap();
    assert_eq!(inventory.stock(&p.id).await.unwrap(), 1);

    let err = inventory
        .append(NewMovement::new(&p.id, MovementKind::Out, 1), "sales")
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        DbError::Domain(CoreError::InsufficientStock { available: 0, .. })
    ));

    common::receive(&inventory, &p, 4, 100).await;
    assert_eq!(inventory.stock(&p.id).await.unwrap(), 4);
    assert!(inventory.verify_projection(&p.id).await.unwrap().is_consistent());
}
