//! # Opening-Balance Import
//!
//! Loads an inventory sheet into an empty or existing Stockbook database.
//!
//! ## Usage
//! ```bash
//! cargo run -p stockbook-db --bin seed -- inventory.csv
//!
//! # Specify database path
//! cargo run -p stockbook-db --bin seed -- inventory.csv --db ./data/stockbook.db
//! ```
//!
//! ## Sheet Format
//! ```text
//! codigo,descripcion,costo_unitario,tipo,existencias
//! BRK-001,Brake pad,12.50,brakes,40
//! FLT-010,Oil filter,4.99,filters,0
//! ```
//!
//! For every row this creates the product type (if new) and the product (if
//! its code is new), then appends one IN movement with reason
//! `opening_balance` for a positive stock. Rows missing a code or a
//! description are skipped. Products that already exist are left alone, so
//! re-running the import does not double the stock.

use serde::Deserialize;
use std::collections::HashMap;
use std::env;
use std::path::{Path, PathBuf};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use stockbook_core::{ErrorKind, MovementKind, NewMovement, NewProduct, OPENING_BALANCE_REASON};
use stockbook_db::{Inventory, LedgerConfig};

const ACTOR: &str = "admin";

#[derive(Debug, Deserialize)]
struct SheetRow {
    #[serde(default)]
    codigo: Option<String>,
    #[serde(default)]
    descripcion: Option<String>,
    #[serde(default)]
    costo_unitario: Option<String>,
    #[serde(default)]
    tipo: Option<String>,
    #[serde(default)]
    existencias: Option<String>,
}

#[derive(Debug, Default)]
struct ImportSummary {
    products_created: usize,
    types_created: usize,
    opening_movements: usize,
    skipped: usize,
    failed: usize,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,stockbook=debug,sqlx=warn")),
        )
        .init();

    let args: Vec<String> = env::args().collect();

    let mut sheet: Option<PathBuf> = None;
    let mut db_path: Option<PathBuf> = None;
    let mut config_path: Option<PathBuf> = None;

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--db" | "-d" => {
                if i + 1 < args.len() {
                    db_path = Some(PathBuf::from(&args[i + 1]));
                    i += 1;
                }
            }
            "--config" | "-c" => {
                if i + 1 < args.len() {
                    config_path = Some(PathBuf::from(&args[i + 1]));
                    i += 1;
                }
            }
            "--help" | "-h" => {
                print_help();
                return Ok(());
            }
            other => sheet = Some(PathBuf::from(other)),
        }
        i += 1;
    }

    let Some(sheet) = sheet else {
        print_help();
        return Err("missing inventory sheet path".into());
    };

    let mut config = LedgerConfig::load(config_path.as_deref())?;
    if let Some(path) = db_path {
        config.database.path = path;
    }
    // Opening balances may exceed any approval threshold.
    config.ledger.approval_threshold = None;

    info!(sheet = %sheet.display(), db = %config.database.path.display(), "Starting import");

    let inventory = Inventory::from_config(&config).await?;
    let summary = import(&inventory, &sheet).await?;

    info!(
        products = summary.products_created,
        types = summary.types_created,
        opening_movements = summary.opening_movements,
        skipped = summary.skipped,
        failed = summary.failed,
        "Import complete"
    );

    inventory.database().close().await;
    Ok(())
}

fn print_help() {
    println!("Stockbook opening-balance import");
    println!();
    println!("Usage: seed <SHEET.csv> [OPTIONS]");
    println!();
    println!("Options:");
    println!("  -d, --db <PATH>       Database file path (overrides config)");
    println!("  -c, --config <PATH>   stockbook.toml to load");
    println!("  -h, --help            Show this help message");
}

async fn import(
    inventory: &Inventory,
    sheet: &Path,
) -> Result<ImportSummary, Box<dyn std::error::Error>> {
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .flexible(true)
        .from_path(sheet)?;

    let mut summary = ImportSummary::default();
    let mut types: HashMap<String, String> = inventory
        .list_product_types()
        .await?
        .into_iter()
        .map(|t| (t.name, t.id))
        .collect();

    for (index, record) in reader.deserialize::<SheetRow>().enumerate() {
        // Header is line 1
        let line = index + 2;
        let row = match record {
            Ok(row) => row,
            Err(err) => {
                warn!(line, error = %err, "Unreadable row");
                summary.failed += 1;
                continue;
            }
        };

        let (Some(code), Some(description)) = (non_empty(row.codigo), non_empty(row.descripcion))
        else {
            summary.skipped += 1;
            continue;
        };

        match inventory.get_product_by_code(&code).await {
            Ok(_) => {
                warn!(line, code = %code, "Product already exists, row skipped");
                summary.skipped += 1;
                continue;
            }
            Err(err) if err.kind() == Some(ErrorKind::NotFound) => {}
            Err(err) => return Err(err.into()),
        }

        let product_type_id = match non_empty(row.tipo) {
            Some(name) => match types.get(&name) {
                Some(id) => Some(id.clone()),
                None => match inventory.create_product_type(&name, ACTOR).await {
                    Ok(created) => {
                        summary.types_created += 1;
                        types.insert(created.name.clone(), created.id.clone());
                        Some(created.id)
                    }
                    Err(err) if err.kind().is_some() => {
                        warn!(line, code = %code, error = %err, "Product type rejected, row skipped");
                        summary.failed += 1;
                        continue;
                    }
                    Err(err) => return Err(err.into()),
                },
            },
            None => None,
        };

        let unit_cost_cents = non_empty(row.costo_unitario).and_then(|v| parse_cents(&v));
        let new = NewProduct {
            code: code.clone(),
            description,
            product_type_id,
            unit_cost_cents,
            ..Default::default()
        };

        let product = match inventory.create_product(new, ACTOR).await {
            Ok(product) => product,
            Err(err) if err.kind().is_some() => {
                warn!(line, code = %code, error = %err, "Row rejected");
                summary.failed += 1;
                continue;
            }
            Err(err) => return Err(err.into()),
        };
        summary.products_created += 1;

        let stock = non_empty(row.existencias).and_then(|v| parse_quantity(&v)).unwrap_or(0);
        if stock > 0 {
            let mut opening = NewMovement::new(&product.id, MovementKind::In, stock)
                .with_reason(OPENING_BALANCE_REASON);
            if let Some(cost) = unit_cost_cents {
                opening = opening.with_unit_cost(cost);
            }
            match inventory.append(opening, ACTOR).await {
                Ok(_) => summary.opening_movements += 1,
                Err(err) if err.kind().is_some() => {
                    warn!(line, code = %code, error = %err, "Opening balance rejected");
                    summary.failed += 1;
                }
                Err(err) => return Err(err.into()),
            }
        }
    }

    Ok(summary)
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}

/// "12.5" / "12.50" / "12" → cents. Anything else is treated as no cost.
fn parse_cents(value: &str) -> Option<i64> {
    let (whole, frac) = value.split_once('.').unwrap_or((value, ""));
    if frac.len() > 2 || !frac.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }
    let whole: i64 = whole.parse().ok()?;
    let frac: i64 = format!("{frac:0<2}").parse().ok()?;
    (whole >= 0).then(|| whole * 100 + frac)
}

/// Whole-number stock, tolerating a trailing ".0".
fn parse_quantity(value: &str) -> Option<i64> {
    value
        .parse::<i64>()
        .ok()
        .or_else(|| value.strip_suffix(".0").and_then(|v| v.parse().ok()))
}
