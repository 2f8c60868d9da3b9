//! Shared fixtures for engine integration tests.

#![allow(dead_code)]

use stockbook_core::{MovementKind, NewMovement, NewProduct, Product};
use stockbook_db::{Database, DbConfig, Inventory, LedgerConfig};

pub async fn inventory() -> Inventory {
    inventory_with(LedgerConfig::in_memory()).await
}

pub async fn inventory_with(config: LedgerConfig) -> Inventory {
    let db = Database::new(DbConfig::in_memory()).await.unwrap();
    Inventory::open(db, &config).await.unwrap()
}

pub async fn product(inventory: &Inventory, code: &str) -> Product {
    product_with(inventory, code, None, None).await
}

pub async fn product_with(
    inventory: &Inventory,
    code: &str,
    unit_cost_cents: Option<i64>,
    min_stock: Option<i64>,
) -> Product {
    inventory
        .create_product(
            NewProduct {
                code: code.to_string(),
                description: format!("{code} description"),
                unit_cost_cents,
                min_stock,
                ..Default::default()
            },
            "admin",
        )
        .await
        .unwrap()
}

pub async fn receive(inventory: &Inventory, product: &Product, quantity: i64, cost: i64) {
    inventory
        .append(
            NewMovement::new(&product.id, MovementKind::In, quantity).with_unit_cost(cost),
            "purchasing",
        )
        .await
        .unwrap();
}
