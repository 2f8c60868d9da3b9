//! Low-stock report and bulk thresholds.

mod common;

use stockbook_core::policy::PolicyEntry;
use stockbook_core::{ErrorKind, MovementKind, NewMovement};

#[tokio::test]
async fn test_low_stock_appears_once_below_minimum() {
    let inventory = common::inventory().await;
    let p = common::product_with(&inventory, "P", None, Some(5)).await;
    common::receive(&inventory, &p, 7, 100).await;

    assert!(inventory.low_stock().await.unwrap().is_empty());

    inventory
        .append(NewMovement::new(&p.id, MovementKind::Out, 3), "sales")
        .await
        .unwrap();

    let rows = inventory.low_stock().await.unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].code, "P");
    assert_eq!(rows[0].stock, 4);
    assert_eq!(rows[0].min_stock, 5);
    assert_eq!(rows[0].shortage, 1);
}

#[tokio::test]
async fn test_products_without_minimum_are_never_low() {
    let inventory = common::inventory().await;
    common::product(&inventory, "NOMIN").await;
    assert!(inventory.low_stock().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_bulk_policy_partial_failure() {
    let inventory = common::inventory().await;
    let a = common::product(&inventory, "A").await;
    common::product(&inventory, "B").await;

    let report = inventory
        .bulk_set_policy(
            vec![
                PolicyEntry::new("A", Some(5), None),
                PolicyEntry::new("B", Some(-1), None),
            ],
            "admin",
        )
        .await
        .unwrap();

    assert_eq!(report.updated_count, 1);
    assert_eq!(report.errors.len(), 1);
    assert_eq!(report.errors[0].code, "B");
    assert_eq!(inventory.policy(&a.id).await.unwrap().min_stock, Some(5));
}

#[tokio::test]
async fn test_bulk_policy_row_errors() {
    let inventory = common::inventory().await;
    let c = common::product_with(&inventory, "C", None, Some(2)).await;
    common::product(&inventory, "D").await;

    let report = inventory
        .bulk_set_policy(
            vec![
                PolicyEntry::new("UNKNOWN", Some(1), None),
                PolicyEntry::new("C", Some(10), Some(3)),
                // Merged with the stored min of 2
                PolicyEntry::new("C", None, Some(1)),
                PolicyEntry::new("D", Some(1), Some(8)),
            ],
            "admin",
        )
        .await
        .unwrap();

    assert_eq!(report.updated_count, 1);
    let codes: Vec<_> = report.errors.iter().map(|e| e.code.as_str()).collect();
    assert_eq!(codes, vec!["UNKNOWN", "C", "C"]);

    let policy = inventory.policy(&c.id).await.unwrap();
    assert_eq!((policy.min_stock, policy.max_stock), (Some(2), None));
}

#[tokio::test]
async fn test_bulk_policy_row_without_bounds_is_not_counted() {
    let inventory = common::inventory().await;
    let e = common::product_with(&inventory, "E", None, Some(3)).await;

    let report = inventory
        .bulk_set_policy(vec![PolicyEntry::new("E", None, None)], "admin")
        .await
        .unwrap();

    assert_eq!(report.updated_count, 0);
    assert_eq!(report.errors.len(), 1);
    assert_eq!(report.errors[0].code, "E");
    assert_eq!(inventory.policy(&e.id).await.unwrap().min_stock, Some(3));
}

#[tokio::test]
async fn test_bulk_policy_requires_admin_before_any_row() {
    let inventory = common::inventory().await;
    let a = common::product(&inventory, "A").await;

    for role in ["sales", "purchasing", "root"] {
        let err = inventory
            .bulk_set_policy(vec![PolicyEntry::new("A", Some(5), None)], role)
            .await
            .unwrap_err();
        assert_eq!(err.kind(), Some(ErrorKind::Authorization));
    }
    assert_eq!(inventory.policy(&a.id).await.unwrap().min_stock, None);
}
