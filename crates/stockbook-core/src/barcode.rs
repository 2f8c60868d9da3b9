//! # Barcode Resolution
//!
//! Maps already-decoded symbol strings to catalog entries by exact code.
//! Decoding happens upstream; nothing here mutates stock.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use ts_rs::TS;

use crate::types::Product;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct BarcodeMatch {
    /// The decoded string, trimmed.
    pub code: String,
    pub product: Option<Product>,
}

/// Decoders pad or append line endings; only surrounding whitespace is dropped.
/// Matching after that is exact and case-sensitive.
pub fn normalize(decoded: &str) -> &str {
    decoded.trim()
}

/// Distinct non-empty codes to look up, in first-seen order.
pub fn lookup_codes<S: AsRef<str>>(decoded: &[S]) -> Vec<String> {
    let mut seen = std::collections::HashSet::new();
    decoded
        .iter()
        .map(|d| normalize(d.as_ref()))
        .filter(|c| !c.is_empty() && seen.insert(*c))
        .map(str::to_string)
        .collect()
}

/// One output row per input string, in input order.
///
/// Surrounding whitespace is trimmed from each decoded string before the
/// exact match. Catalog codes are stored trimmed, so this only absorbs
/// decoder padding and never makes two distinct codes collide.
pub fn resolve<S: AsRef<str>>(decoded: &[S], catalog: &HashMap<String, Product>) -> Vec<BarcodeMatch> {
    decoded
        .iter()
        .map(|d| {
            let code = normalize(d.as_ref());
            BarcodeMatch {
                code: code.to_string(),
                product: catalog.get(code).cloned(),
            }
        })
        .collect()
}
