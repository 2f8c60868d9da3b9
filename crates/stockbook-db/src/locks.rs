//! # Per-Product Write Locks
//!
//! Serializes "read projected stock → validate → append" for one product.
//!
//! ```text
//!   OUT 1 (product A) ──► acquire(A) ──► read 1 ──► append ──► release
//!   OUT 1 (product A) ──► acquire(A) ┄┄┄┄┄┄┄┄┄┄┄┄┄┄┄┄┄┄┄┄┄┄┄┄┄┄┄┄┄┄┄┄► read 0 ──► InsufficientStock
//!   IN  5 (product B) ──► acquire(B) ──► read  ──► append ──► release     (in parallel)
//! ```
//!
//! A writer that cannot get the lock within the configured timeout fails
//! with `CoreError::Conflict` instead of waiting forever.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;
use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};
use tracing::warn;

use crate::error::DbResult;
use stockbook_core::CoreError;

/// Guard held for the duration of one product write.
pub type ProductGuard = OwnedMutexGuard<()>;

/// One async mutex per product id, created on first use.
#[derive(Debug, Default)]
pub struct ProductLocks {
    locks: Mutex<HashMap<String, Arc<AsyncMutex<()>>>>,
}

impl ProductLocks {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock_for(&self, product_id: &str) -> Arc<AsyncMutex<()>> {
        let mut locks = self.locks.lock().unwrap_or_else(PoisonError::into_inner);
        locks
            .entry(product_id.to_string())
            .or_insert_with(|| Arc::new(AsyncMutex::new(())))
            .clone()
    }

    /// Waits up to `timeout` for exclusive write access to `product_id`.
    pub async fn acquire(&self, product_id: &str, timeout: Duration) -> DbResult<ProductGuard> {
        let lock = self.lock_for(product_id);
        match tokio::time::timeout(timeout, lock.lock_owned()).await {
            Ok(guard) => Ok(guard),
            Err(_) => {
                warn!(
                    product_id = %product_id,
                    timeout_ms = timeout.as_millis() as u64,
                    "Timed out waiting for product write lock"
                );
                Err(CoreError::Conflict {
                    product_id: product_id.to_string(),
                }
                .into())
            }
        }
    }

    /// Number of products that have been written to since start-up.
    pub fn len(&self) -> usize {
        self.locks.lock().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
