//! # Stock Projection
//!
//! Derives stock and valuation for one product by folding its movements.
//!
//! ## The Fold
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  movements in seq order ──► Projection                                  │
//! │                                                                         │
//! │   seq  kind  qty  cost        stock  last cost                          │
//! │   ───  ────  ───  ────        ─────  ─────────                          │
//! │    1   IN     10   100   ──►    10      100                             │
//! │    2   OUT     3    -    ──►     7      100   (OUT never refreshes)     │
//! │    3   ADJ     5    90   ──►     5       90   (ADJ sets, delta = -2)    │
//! │    4   IN      2    -    ──►     7       90   (no cost, carried)        │
//! │                                                                         │
//! │  valuation = stock × last cost  =  7 × 90  =  630                       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ADJ means "set to absolute value": its contribution is
//! `quantity - running_stock`. The same [`Projection::apply`] drives both
//! full replay and the incremental cache in stockbook-db, so the two can
//! only diverge if a movement is skipped or applied twice; `last_seq`
//! guards against the latter.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::error::{CoreError, CoreResult};
use crate::money::Money;
use crate::types::{Movement, MovementKind};

/// Derived per-product state.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Projection {
    pub stock: i64,

    /// Latest non-null cost seen on an IN or ADJ movement.
    pub last_unit_cost_cents: Option<i64>,

    pub movement_count: u64,

    /// Highest ledger sequence folded in. 0 before the first movement.
    pub last_seq: i64,

    #[ts(as = "Option<String>")]
    pub last_moved_at: Option<DateTime<Utc>>,
}

impl Projection {
    /// Folds a product's movements from empty, in the order given.
    pub fn replay<'a, I>(movements: I) -> Self
    where
        I: IntoIterator<Item = &'a Movement>,
    {
        let mut projection = Projection::default();
        for movement in movements {
            projection.apply_movement(movement);
        }
        projection
    }

    /// Folds only movements with `moved_at <= at`.
    ///
    /// Movements are still taken in the order given (seq order), so ties on
    /// the timestamp resolve by insertion.
    pub fn replay_until<'a, I>(movements: I, at: DateTime<Utc>) -> Self
    where
        I: IntoIterator<Item = &'a Movement>,
    {
        Self::replay(movements.into_iter().filter(|m| m.moved_at <= at))
    }

    /// Signed stock change a movement of `kind` would cause right now.
    pub fn contribution(&self, kind: MovementKind, quantity: i64) -> i64 {
        match kind {
            MovementKind::In => quantity,
            MovementKind::Out => -quantity,
            MovementKind::Adj => quantity - self.stock,
        }
    }

    /// Stock after a hypothetical movement.
    pub fn stock_after(&self, kind: MovementKind, quantity: i64) -> i64 {
        self.stock + self.contribution(kind, quantity)
    }

    /// Core fold step.
    pub fn apply(&mut self, kind: MovementKind, quantity: i64, unit_cost_cents: Option<i64>) {
        self.stock = self.stock_after(kind, quantity);
        if kind != MovementKind::Out {
            if let Some(cost) = unit_cost_cents {
                self.last_unit_cost_cents = Some(cost);
            }
        }
        self.movement_count += 1;
    }

    /// Folds a persisted movement. Returns `false` if it was already folded.
    pub fn apply_movement(&mut self, movement: &Movement) -> bool {
        if movement.seq <= self.last_seq {
            return false;
        }
        self.apply(movement.kind, movement.quantity, movement.unit_cost_cents);
        self.last_seq = movement.seq;
        self.last_moved_at = Some(match self.last_moved_at {
            Some(prev) if prev > movement.moved_at => prev,
            _ => movement.moved_at,
        });
        true
    }

    /// Rejects an OUT movement that would take stock below zero.
    pub fn ensure_can_issue(&self, code: &str, quantity: i64) -> CoreResult<()> {
        if self.stock_after(MovementKind::Out, quantity) < 0 {
            return Err(CoreError::InsufficientStock {
                code: code.to_string(),
                available: self.stock,
                requested: quantity,
            });
        }
        Ok(())
    }

    /// Cost used for valuation: ledger cost, else the catalog's.
    pub fn effective_unit_cost(&self, catalog_cost_cents: Option<i64>) -> Option<i64> {
        self.last_unit_cost_cents.or(catalog_cost_cents)
    }

    /// stock × effective unit cost; zero when no cost is known.
    pub fn valuation(&self, catalog_cost_cents: Option<i64>) -> Money {
        self.effective_unit_cost(catalog_cost_cents)
            .map(|cost| Money::from_cents(cost).multiply_quantity(self.stock))
            .unwrap_or_default()
    }

    /// Timestamp for the next movement: never earlier than the last one.
    pub fn next_timestamp(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        match self.last_moved_at {
            Some(last) if last > now => last,
            _ => now,
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use proptest::prelude::*;

    fn at(secs: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(secs, 0).single().unwrap()
    }

    fn movement(seq: i64, kind: MovementKind, quantity: i64, cost: Option<i64>) -> Movement {
        Movement {
            id: format!("m{seq}"),
            seq,
            product_id: "p1".to_string(),
            kind,
            quantity,
            unit_cost_cents: cost,
            reason: None,
            note: None,
            actor_role: "admin".to_string(),
            moved_at: at(seq),
        }
    }

    #[test]
    fn test_fold_table() {
        let ledger = vec![
            movement(1, MovementKind::In, 10, Some(100)),
            movement(2, MovementKind::Out, 3, None),
            movement(3, MovementKind::Adj, 5, Some(90)),
            movement(4, MovementKind::In, 2, None),
        ];
        let p = Projection::replay(&ledger);

        assert_eq!(p.stock, 7);
        assert_eq!(p.last_unit_cost_cents, Some(90));
        assert_eq!(p.movement_count, 4);
        assert_eq!(p.last_seq, 4);
        assert_eq!(p.valuation(None).cents(), 630);
    }

    #[test]
    fn test_out_never_refreshes_cost() {
        let mut p = Projection::default();
        p.apply(MovementKind::In, 10, Some(100));
        p.apply(MovementKind::Out, 1, Some(5));
        assert_eq!(p.last_unit_cost_cents, Some(100));
    }

    #[test]
    fn test_valuation_falls_back_to_catalog_cost() {
        let mut p = Projection::default();
        p.apply(MovementKind::In, 4, None);
        assert_eq!(p.valuation(Some(250)).cents(), 1000);
        assert_eq!(p.valuation(None), Money::zero());
    }

    #[test]
    fn test_duplicate_movement_is_ignored() {
        let m = movement(1, MovementKind::In, 10, None);
        let mut p = Projection::default();
        assert!(p.apply_movement(&m));
        assert!(!p.apply_movement(&m));
        assert_eq!(p.stock, 10);
    }

    #[test]
    fn test_ensure_can_issue() {
        let mut p = Projection::default();
        p.apply(MovementKind::In, 7, None);
        assert!(p.ensure_can_issue("BRK-001", 7).is_ok());

        let err = p.ensure_can_issue("BRK-001", 10).unwrap_err();
        assert!(matches!(
            err,
            CoreError::InsufficientStock { available: 7, requested: 10, .. }
        ));
    }

    #[test]
    fn test_replay_until_is_a_prefix() {
        let ledger = vec![
            movement(1, MovementKind::In, 10, Some(100)),
            movement(2, MovementKind::Out, 3, None),
            movement(3, MovementKind::Out, 2, None),
        ];
        assert_eq!(Projection::replay_until(&ledger, at(2)).stock, 7);
        assert_eq!(Projection::replay_until(&ledger, at(0)).stock, 0);
    }

    #[test]
    fn test_next_timestamp_never_goes_backwards() {
        let later = at(3600);
        let mut p = Projection::default();
        p.apply_movement(&Movement {
            moved_at: later,
            ..movement(1, MovementKind::In, 1, None)
        });
        assert_eq!(p.next_timestamp(at(0)), later);
    }

    // -------------------------------------------------------------------------
    // Properties
    // -------------------------------------------------------------------------

    fn op() -> impl Strategy<Value = (MovementKind, i64, Option<i64>)> {
        (
            prop_oneof![
                Just(MovementKind::In),
                Just(MovementKind::Out),
                Just(MovementKind::Adj)
            ],
            1i64..50,
            proptest::option::of(0i64..10_000),
        )
    }

    /// Drives ops through the same guard the ledger uses and returns the
    /// accepted movements plus the incrementally maintained projection.
    fn run_guarded(ops: &[(MovementKind, i64, Option<i64>)]) -> (Vec<Movement>, Projection) {
        let mut incremental = Projection::default();
        let mut accepted = Vec::new();
        for (i, (kind, qty, cost)) in ops.iter().copied().enumerate() {
            if kind == MovementKind::Out && incremental.ensure_can_issue("P", qty).is_err() {
                continue;
            }
            let m = movement(i as i64 + 1, kind, qty, cost);
            incremental.apply_movement(&m);
            accepted.push(m);
        }
        (accepted, incremental)
    }

    proptest! {
        #[test]
        fn prop_incremental_equals_replay(ops in proptest::collection::vec(op(), 0..60)) {
            let (accepted, incremental) = run_guarded(&ops);
            let replayed = Projection::replay(&accepted);
            prop_assert_eq!(incremental, replayed);
            prop_assert_eq!(incremental.valuation(None), replayed.valuation(None));
        }

        #[test]
        fn prop_stock_never_negative(ops in proptest::collection::vec(op(), 0..60)) {
            let mut p = Projection::default();
            for (kind, qty, cost) in ops {
                let before = p;
                if kind == MovementKind::Out && p.ensure_can_issue("P", qty).is_err() {
                    prop_assert_eq!(p, before);
                    continue;
                }
                p.apply(kind, qty, cost);
                prop_assert!(p.stock >= 0);
            }
        }

        #[test]
        fn prop_replay_split_anywhere(
            ops in proptest::collection::vec(op(), 1..40),
            split in 0usize..40,
        ) {
            let (accepted, full) = run_guarded(&ops);
            let split = split.min(accepted.len());
            let mut resumed = Projection::replay(&accepted[..split]);
            for m in &accepted[split..] {
                resumed.apply_movement(m);
            }
            prop_assert_eq!(resumed, full);
        }
    }
}
