//! # Authorization Matrix
//!
//! Pure (role, movement kind) → permit/deny decisions.
//!
//! ```text
//! ┌──────────────────────┬──────┬──────┬──────┐
//! │ role                 │  IN  │ OUT  │ ADJ  │
//! ├──────────────────────┼──────┼──────┼──────┤
//! │ admin                │  ✓   │  ✓   │  ✓   │
//! │ purchasing           │  ✓   │  ✗   │  ✗   │
//! │ sales                │  ✗   │  ✓   │  ✗   │
//! │ anything else        │  ✗   │  ✗   │  ✗   │
//! └──────────────────────┴──────┴──────┴──────┘
//! ```
//!
//! Role strings come from an upstream authentication step and are matched
//! exactly. `"Admin"`, `" admin"` and `""` are all unrecognized and denied.
//!
//! On top of the matrix, OUT and ADJ movements whose quantity reaches the
//! configured approval threshold need the admin role.

use serde::{Deserialize, Serialize};
use std::fmt;
use ts_rs::TS;

use crate::error::{CoreError, CoreResult};
use crate::types::MovementKind;

// =============================================================================
// Role
// =============================================================================

/// A recognized actor role.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    Purchasing,
    Sales,
}

impl Role {
    /// Resolves a role claim. Unknown claims yield `None`.
    pub fn from_claim(claim: &str) -> Option<Role> {
        match claim {
            "admin" => Some(Role::Admin),
            "purchasing" => Some(Role::Purchasing),
            "sales" => Some(Role::Sales),
            _ => None,
        }
    }

    pub const fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::Purchasing => "purchasing",
            Role::Sales => "sales",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// =============================================================================
// Matrix
// =============================================================================

/// The matrix itself. `None` is the unrecognized role and is denied everything.
pub const fn permits(role: Option<Role>, kind: MovementKind) -> bool {
    match (role, kind) {
        (Some(Role::Admin), _) => true,
        (Some(Role::Purchasing), MovementKind::In) => true,
        (Some(Role::Sales), MovementKind::Out) => true,
        _ => false,
    }
}

/// Matrix lookup on a raw role claim.
pub fn permits_claim(claim: &str, kind: MovementKind) -> bool {
    permits(Role::from_claim(claim), kind)
}

/// Full check for a ledger write: matrix, then approval threshold.
///
/// Returns the resolved role so callers can record it on the movement.
///
/// ## Example
/// ```rust
/// use stockbook_core::auth::{authorize_movement, Role};
/// use stockbook_core::MovementKind;
///
/// assert_eq!(
///     authorize_movement("sales", MovementKind::Out, 3, Some(1000)).unwrap(),
///     Role::Sales
/// );
/// // Same role, same kind, but over the approval threshold.
/// assert!(authorize_movement("sales", MovementKind::Out, 1000, Some(1000)).is_err());
/// ```
pub fn authorize_movement(
    claim: &str,
    kind: MovementKind,
    quantity: i64,
    approval_threshold: Option<i64>,
) -> CoreResult<Role> {
    let role = Role::from_claim(claim);
    let action = format!("append {kind} movements");

    let Some(role) = role.filter(|r| permits(Some(*r), kind)) else {
        return Err(CoreError::unauthorized(claim, action));
    };

    if let Some(threshold) = approval_threshold {
        let needs_approval = matches!(kind, MovementKind::Out | MovementKind::Adj);
        if needs_approval && quantity >= threshold && role != Role::Admin {
            return Err(CoreError::unauthorized(
                claim,
                format!("{action} of {threshold} units or more"),
            ));
        }
    }

    Ok(role)
}

/// Requires the admin role for a catalog or policy action.
pub fn require_admin(claim: &str, action: &str) -> CoreResult<Role> {
    match Role::from_claim(claim) {
        Some(Role::Admin) => Ok(Role::Admin),
        _ => Err(CoreError::unauthorized(claim, action)),
    }
}

/// Requires any recognized role.
pub fn require_known_role(claim: &str, action: &str) -> CoreResult<Role> {
    Role::from_claim(claim).ok_or_else(|| CoreError::unauthorized(claim, action))
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use proptest::prelude::*;

    #[test]
    fn test_matrix() {
        use MovementKind::*;
        let expected = [
            ("admin", [true, true, true]),
            ("purchasing", [true, false, false]),
            ("sales", [false, true, false]),
        ];
        for (claim, row) in expected {
            for (kind, allowed) in [In, Out, Adj].into_iter().zip(row) {
                assert_eq!(permits_claim(claim, kind), allowed, "{claim} {kind}");
            }
        }
    }

    #[test]
    fn test_near_miss_claims_are_denied() {
        for claim in ["Admin", "ADMIN", " admin", "admin ", "", "root", "sale"] {
            for kind in MovementKind::ALL {
                assert!(!permits_claim(claim, kind), "{claim:?} {kind}");
            }
        }
    }

    #[test]
    fn test_authorize_returns_role() {
        let role = authorize_movement("purchasing", MovementKind::In, 10, Some(1000)).unwrap();
        assert_eq!(role, Role::Purchasing);
    }

    #[test]
    fn test_denial_is_authorization_kind() {
        let err = authorize_movement("purchasing", MovementKind::Out, 1, None).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Authorization);
    }

    #[test]
    fn test_approval_threshold() {
        // IN is never subject to the threshold.
        assert!(authorize_movement("purchasing", MovementKind::In, 5000, Some(1000)).is_ok());
        assert!(authorize_movement("sales", MovementKind::Out, 999, Some(1000)).is_ok());
        assert!(authorize_movement("sales", MovementKind::Out, 1000, Some(1000)).is_err());
        assert!(authorize_movement("admin", MovementKind::Out, 1000, Some(1000)).is_ok());
        assert!(authorize_movement("admin", MovementKind::Adj, 5000, Some(1000)).is_ok());
        assert!(authorize_movement("sales", MovementKind::Out, 5000, None).is_ok());
    }

    #[test]
    fn test_require_admin() {
        assert!(require_admin("admin", "edit the catalog").is_ok());
        assert!(require_admin("purchasing", "edit the catalog").is_err());
        assert!(require_known_role("sales", "resolve discrepancies").is_ok());
        assert!(require_known_role("guest", "resolve discrepancies").is_err());
    }

    proptest! {
        #[test]
        fn prop_unrecognized_roles_are_denied_everything(claim in ".*") {
            prop_assume!(!["admin", "purchasing", "sales"].contains(&claim.as_str()));
            for kind in MovementKind::ALL {
                prop_assert!(!permits_claim(&claim, kind));
                prop_assert!(authorize_movement(&claim, kind, 1, None).is_err());
            }
        }
    }
}
