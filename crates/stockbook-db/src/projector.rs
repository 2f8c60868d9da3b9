//! # Stock Projector
//!
//! In-memory cache of every product's [`Projection`], kept current by
//! applying each movement once it has committed.
//!
//! ```text
//!   start-up:  ledger (ORDER BY seq) ──► warm() ──► HashMap<product_id, Projection>
//!   append:    commit tx ──► store(projection)    O(1)
//!   read:      get(product_id)                    O(1), copy out
//! ```
//!
//! A movement whose `seq` is not past the product's `last_seq` is ignored,
//! so re-applying after a reload never double counts.

use std::collections::HashMap;
use std::sync::{PoisonError, RwLock};

use stockbook_core::{Movement, Projection};

#[derive(Debug, Default)]
pub struct StockProjector {
    projections: RwLock<HashMap<String, Projection>>,
}

impl StockProjector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces the cache with a fold of `movements` (replay order).
    pub fn warm<'a>(&self, movements: impl IntoIterator<Item = &'a Movement>) -> usize {
        let mut fresh: HashMap<String, Projection> = HashMap::new();
        let mut applied = 0;
        for movement in movements {
            if fresh
                .entry(movement.product_id.clone())
                .or_default()
                .apply_movement(movement)
            {
                applied += 1;
            }
        }

        *self.projections.write().unwrap_or_else(PoisonError::into_inner) = fresh;
        applied
    }

    /// Folds one committed movement into its product's projection.
    pub fn apply(&self, movement: &Movement) -> bool {
        self.projections
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .entry(movement.product_id.clone())
            .or_default()
            .apply_movement(movement)
    }

    /// Replaces a product's projection with one folded further along.
    ///
    /// Ignored unless `projection` is past what the cache already holds.
    pub fn store(&self, product_id: &str, projection: Projection) -> bool {
        let mut projections = self.projections.write().unwrap_or_else(PoisonError::into_inner);
        let current = projections.entry(product_id.to_string()).or_default();
        if projection.last_seq <= current.last_seq {
            return false;
        }
        *current = projection;
        true
    }

    /// Current projection; products with no movements project to zero.
    pub fn get(&self, product_id: &str) -> Projection {
        self.projections
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(product_id)
            .copied()
            .unwrap_or_default()
    }

    /// Copy of every tracked projection.
    pub fn snapshot_all(&self) -> HashMap<String, Projection> {
        self.projections
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Highest `seq` folded so far.
    pub fn high_water_mark(&self) -> i64 {
        self.projections
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .values()
            .map(|p| p.last_seq)
            .max()
            .unwrap_or(0)
    }
}
