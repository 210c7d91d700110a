//! # Permission Module
//!
//! A pure authorization predicate: `(grants, action) -> allowed`.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Grants { roles, permissions, elevated }                               │
//! │        │                                                                │
//! │        ├── elevated flag set? ─────────────────────────► allowed       │
//! │        ├── role in {super_admin, admin, manager, ...}? ─► allowed       │
//! │        ├── holds any key the action accepts? ───────────► allowed       │
//! │        └── otherwise ───────────────────────────────────► denied        │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The cart engine evaluates this itself, so the rule holds for every caller,
//! not only for the console.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::{CoreError, CoreResult};

/// Role names that pass every check (after normalisation).
pub const ELEVATED_ROLES: [&str; 5] = ["super_admin", "admin", "manager", "system_admin", "sa"];

// =============================================================================
// Action
// =============================================================================

/// An operation that requires a grant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Action {
    /// Changing the discount percent of a cart line.
    EditLineDiscount,
}

impl Action {
    /// Permission keys that satisfy this action (compared case-insensitively).
    pub fn permission_keys(&self) -> &'static [&'static str] {
        match self {
            Action::EditLineDiscount => &["pos.discount.edit", "sales.discount.edit", "discount.edit"],
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Action::EditLineDiscount => write!(f, "edit line discounts"),
        }
    }
}

// =============================================================================
// Grants
// =============================================================================

/// What the signed-in operator holds.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Grants {
    #[serde(default)]
    pub roles: Vec<String>,

    #[serde(default)]
    pub permissions: Vec<String>,

    /// Bypasses every check.
    #[serde(default)]
    pub elevated: bool,
}

impl Grants {
    /// An operator with no grants at all.
    pub fn none() -> Self {
        Grants::default()
    }

    pub fn with_role(mut self, role: impl Into<String>) -> Self {
        self.roles.push(role.into());
        self
    }

    pub fn with_permission(mut self, key: impl Into<String>) -> Self {
        self.permissions.push(key.into());
        self
    }

    pub fn elevated() -> Self {
        Grants {
            elevated: true,
            ..Grants::default()
        }
    }

    fn has_elevated_role(&self) -> bool {
        self.roles
            .iter()
            .map(|r| normalize_role(r))
            .any(|r| ELEVATED_ROLES.contains(&r.as_str()))
    }

    fn holds_any(&self, keys: &[&str]) -> bool {
        self.permissions
            .iter()
            .any(|held| keys.iter().any(|k| held.trim().eq_ignore_ascii_case(k)))
    }
}

/// Lower-cases a role name and joins words with `_` ("Super Admin" → "super_admin").
pub fn normalize_role(role: &str) -> String {
    role.split_whitespace()
        .collect::<Vec<_>>()
        .join("_")
        .to_lowercase()
}

// =============================================================================
// Predicate
// =============================================================================

/// Returns whether `grants` allow `action`.
///
/// ```rust
/// use rxpos_core::permission::{is_allowed, Action, Grants};
///
/// assert!(!is_allowed(&Grants::none(), Action::EditLineDiscount));
/// assert!(is_allowed(&Grants::none().with_role("Manager"), Action::EditLineDiscount));
/// assert!(is_allowed(
///     &Grants::none().with_permission("POS.DISCOUNT.EDIT"),
///     Action::EditLineDiscount
/// ));
/// ```
pub fn is_allowed(grants: &Grants, action: Action) -> bool {
    grants.elevated || grants.has_elevated_role() || grants.holds_any(action.permission_keys())
}

/// [`is_allowed`] as a `Result`, for use with `?`.
pub fn authorize(grants: &Grants, action: Action) -> CoreResult<()> {
    if is_allowed(grants, action) {
        Ok(())
    } else {
        Err(CoreError::NotAuthorized {
            action: action.to_string(),
        })
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
