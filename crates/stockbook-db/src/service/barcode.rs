//! Decoded barcode lookup.

use std::collections::HashMap;
use tracing::debug;

use super::Inventory;
use crate::error::DbResult;
use stockbook_core::barcode::{lookup_codes, resolve, BarcodeMatch};

impl Inventory {
    /// Matches decoded strings to catalog products by exact code.
    ///
    /// Decoded strings are trimmed before matching. One result per input, in
    /// input order. Nothing is written; callers append movements separately
    /// with the resolved product id.
    pub async fn resolve_barcodes<S: AsRef<str>>(&self, decoded: &[S]) -> DbResult<Vec<BarcodeMatch>> {
        let codes = lookup_codes(decoded);
        let catalog: HashMap<_, _> = self
            .db
            .products()
            .get_by_codes(&codes)
            .await?
            .into_iter()
            .map(|p| (p.code.clone(), p))
            .collect();

        let matches = resolve(decoded, &catalog);
        debug!(
            scanned = decoded.len(),
            matched = matches.iter().filter(|m| m.product.is_some()).count(),
            "Barcodes resolved"
        );
        Ok(matches)
    }
}
