//! Catalog management, listing and barcode lookup.

mod common;

use stockbook_core::catalog::{ProductQuery, ProductSort, SortOrder};
use stockbook_core::{
    CoreError, ErrorKind, MovementKind, NewMovement, NewProduct, ProductUpdate, ValidationError,
};
use stockbook_db::DbError;

#[tokio::test]
async fn test_catalog_writes_are_admin_only_and_codes_unique() {
    let inventory = common::inventory().await;
    let new = NewProduct {
        code: "BRK-001".to_string(),
        description: "Brake pad".to_string(),
        ..Default::default()
    };

    let err = inventory.create_product(new.clone(), "purchasing").await.unwrap_err();
    assert_eq!(err.kind(), Some(ErrorKind::Authorization));

    inventory.create_product(new.clone(), "admin").await.unwrap();
    let err = inventory.create_product(new, "admin").await.unwrap_err();
    assert!(matches!(
        err,
        DbError::Domain(CoreError::Validation(ValidationError::Duplicate { .. }))
    ));

    let err = inventory.create_product_type("brakes", "sales").await.unwrap_err();
    assert_eq!(err.kind(), Some(ErrorKind::Authorization));
}

#[tokio::test]
async fn test_update_product_applies_present_fields() {
    let inventory = common::inventory().await;
    let p = common::product_with(&inventory, "P", Some(100), Some(2)).await;
    let brakes = inventory.create_product_type("brakes", "admin").await.unwrap();

    let updated = inventory
        .update_product(
            &p.id,
            ProductUpdate {
                description: Some("Rear brake pad".to_string()),
                product_type_id: Some(brakes.id.clone()),
                ..Default::default()
            },
            "admin",
        )
        .await
        .unwrap();

    assert_eq!(updated.description, "Rear brake pad");
    assert_eq!(updated.product_type_id, Some(brakes.id));
    assert_eq!(updated.unit_cost_cents, Some(100));
    assert_eq!(updated.min_stock, Some(2));

    // max below the stored min
    let err = inventory
        .update_product(
            &p.id,
            ProductUpdate {
                max_stock: Some(1),
                ..Default::default()
            },
            "admin",
        )
        .await
        .unwrap_err();
    assert_eq!(err.kind(), Some(ErrorKind::Validation));

    let err = inventory
        .update_product("ghost", ProductUpdate::default(), "admin")
        .await
        .unwrap_err();
    assert_eq!(err.kind(), Some(ErrorKind::NotFound));
}

#[tokio::test]
async fn test_listing_searches_sorts_and_pages() {
    let inventory = common::inventory().await;
    let filters = inventory.create_product_type("filters", "admin").await.unwrap();

    for (code, description, qty) in [
        ("FLT-001", "Oil filter", 3),
        ("FLT-002", "Air filter", 9),
        ("BRK-001", "Brake pad", 5),
    ] {
        let product = inventory
            .create_product(
                NewProduct {
                    code: code.to_string(),
                    description: description.to_string(),
                    product_type_id: code.starts_with("FLT").then(|| filters.id.clone()),
                    ..Default::default()
                },
                "admin",
            )
            .await
            .unwrap();
        inventory
            .append(
                NewMovement::new(&product.id, MovementKind::In, qty).with_unit_cost(100),
                "purchasing",
            )
            .await
            .unwrap();
    }

    let page = inventory
        .list_products(ProductQuery {
            q: Some("filter".to_string()),
            sort: ProductSort::Stock,
            order: SortOrder::Desc,
            ..Default::default()
        })
        .await
        .unwrap();
    assert_eq!(page.total, 2);
    assert_eq!(page.items[0].product.code, "FLT-002");
    assert_eq!(page.items[0].stock, 9);
    assert_eq!(page.items[0].valuation_cents, 900);
    assert_eq!(page.items[0].product_type.as_deref(), Some("filters"));

    let page = inventory
        .list_products(ProductQuery {
            product_type_id: Some(filters.id.clone()),
            limit: Some(1),
            offset: 1,
            ..Default::default()
        })
        .await
        .unwrap();
    assert_eq!(page.total, 2);
    assert_eq!(page.items.len(), 1);
    assert_eq!(page.items[0].product.code, "FLT-002");

    // Oversized pages are capped by configuration
    let page = inventory
        .list_products(ProductQuery {
            limit: Some(10_000),
            ..Default::default()
        })
        .await
        .unwrap();
    assert_eq!(page.limit, 200);
    assert_eq!(page.items.len(), 3);
}

#[tokio::test]
async fn test_barcodes_resolve_in_input_order() {
    let inventory = common::inventory().await;
    let p = common::product(&inventory, "7501234567890").await;

    let matches = inventory
        .resolve_barcodes(&["7501234567890\n", "0000000000000", " 7501234567890"])
        .await
        .unwrap();

    assert_eq!(matches.len(), 3);
    assert_eq!(matches[0].product.as_ref().map(|m| m.id.as_str()), Some(p.id.as_str()));
    assert!(matches[1].product.is_none());
    assert_eq!(matches[2].code, "7501234567890");
    assert!(matches[2].product.is_some());

    // Lookup never moves stock
    assert_eq!(inventory.stock(&p.id).await.unwrap(), 0);
    assert!(inventory.resolve_barcodes::<&str>(&[]).await.unwrap().is_empty());
}
