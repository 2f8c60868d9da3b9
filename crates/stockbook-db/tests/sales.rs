//! Sale atomicity and pricing.

mod common;

use stockbook_core::{
    CoreError, ErrorKind, MovementKind, NewSale, ValidationError, SALE_REASON,
};
use stockbook_db::DbError;

async fn counts(inventory: &stockbook_db::Inventory) -> (i64, i64) {
    let db = inventory.database();
    (
        db.movements().count().await.unwrap(),
        db.sales().count().await.unwrap(),
    )
}

#[tokio::test]
async fn test_sale_writes_linked_out_movement() {
    let inventory = common::inventory().await;
    let p = common::product_with(&inventory, "P", Some(250), None).await;
    common::receive(&inventory, &p, 10, 250).await;

    let sale = inventory
        .create_sale(
            NewSale::new(&p.id, 4).with_customer("Walk-in"),
            "sales",
        )
        .await
        .unwrap();

    assert_eq!(sale.total_cents, 1000);
    // Catalog cost charged, no override recorded
    assert_eq!(sale.unit_price_cents, None);
    assert_eq!(inventory.stock(&p.id).await.unwrap(), 6);

    let movement = inventory
        .database()
        .movements()
        .get_by_id(&sale.movement_id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(movement.kind, MovementKind::Out);
    assert_eq!(movement.quantity, 4);
    assert_eq!(movement.reason.as_deref(), Some(SALE_REASON));

    assert_eq!(inventory.get_sale(&sale.id).await.unwrap(), sale);

    let by_movement = inventory
        .database()
        .sales()
        .get_by_movement(&movement.id)
        .await
        .unwrap();
    assert_eq!(by_movement.map(|s| s.id), Some(sale.id));
}

#[tokio::test]
async fn test_price_override_wins_over_catalog_cost() {
    let inventory = common::inventory().await;
    let p = common::product_with(&inventory, "P", Some(250), None).await;
    common::receive(&inventory, &p, 10, 250).await;

    let sale = inventory
        .create_sale(NewSale::new(&p.id, 3).with_unit_price(400), "admin")
        .await
        .unwrap();
    assert_eq!(sale.total().cents(), 1200);
    assert_eq!(sale.unit_price_cents, Some(400));
}

#[tokio::test]
async fn test_failed_sales_leave_nothing_behind() {
    let inventory = common::inventory().await;
    let priced = common::product_with(&inventory, "PRICED", Some(100), None).await;
    let unpriced = common::product(&inventory, "UNPRICED").await;
    common::receive(&inventory, &priced, 2, 100).await;
    inventory
        .append(
            stockbook_core::NewMovement::new(&unpriced.id, MovementKind::In, 5),
            "purchasing",
        )
        .await
        .unwrap();

    let before = counts(&inventory).await;

    // Insufficient stock
    let err = inventory
        .create_sale(NewSale::new(&priced.id, 3), "sales")
        .await
        .unwrap_err();
    assert!(matches!(err, DbError::Domain(CoreError::InsufficientStock { .. })));

    // Role may not issue stock
    let err = inventory
        .create_sale(NewSale::new(&priced.id, 1), "purchasing")
        .await
        .unwrap_err();
    assert_eq!(err.kind(), Some(ErrorKind::Authorization));

    // No price anywhere
    let err = inventory
        .create_sale(NewSale::new(&unpriced.id, 1), "sales")
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        DbError::Domain(CoreError::Validation(ValidationError::MissingPrice { .. }))
    ));

    // Unknown product
    let err = inventory
        .create_sale(NewSale::new("ghost", 1), "sales")
        .await
        .unwrap_err();
    assert_eq!(err.kind(), Some(ErrorKind::Validation));

    assert_eq!(counts(&inventory).await, before);
    assert_eq!(inventory.stock(&priced.id).await.unwrap(), 2);
    assert_eq!(inventory.stock(&unpriced.id).await.unwrap(), 5);
}

#[tokio::test]
async fn test_sales_listing_is_newest_first() {
    let inventory = common::inventory().await;
    let p = common::product_with(&inventory, "P", Some(100), None).await;
    common::receive(&inventory, &p, 10, 100).await;

    let first = inventory.create_sale(NewSale::new(&p.id, 1), "sales").await.unwrap();
    let second = inventory.create_sale(NewSale::new(&p.id, 2), "sales").await.unwrap();

    let sales = inventory.list_sales(None, 0).await.unwrap();
    assert_eq!(
        sales.iter().map(|s| s.id.as_str()).collect::<Vec<_>>(),
        vec![second.id.as_str(), first.id.as_str()]
    );

    let err = inventory.get_sale("missing").await.unwrap_err();
    assert_eq!(err.kind(), Some(ErrorKind::NotFound));
}
