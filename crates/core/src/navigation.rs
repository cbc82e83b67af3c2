//! Role to navigation-entry capability map.
//!
//! [`menu_for`] is a pure function: it allocates a fresh list on every call
//! and never caches, since the entry set is tiny and static.

use serde::Serialize;

use crate::types::Role;

/// Icon shown next to a navigation entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Icon {
    Dashboard,
    People,
    AccountBox,
    CheckCircle,
    Pending,
    AddCircle,
}

impl Icon {
    /// Stable name of the icon for text front ends.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Dashboard => "dashboard",
            Self::People => "people",
            Self::AccountBox => "account_box",
            Self::CheckCircle => "check_circle",
            Self::Pending => "pending",
            Self::AddCircle => "add_circle",
        }
    }
}

/// One entry in the navigation menu.
///
/// Entries have no identity beyond their position in a single [`menu_for`]
/// result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NavigationEntry {
    /// Text shown to the user.
    pub label: &'static str,
    /// View path the entry navigates to.
    pub path: &'static str,
    /// Icon displayed with the label.
    pub icon: Icon,
}

const fn entry(label: &'static str, path: &'static str, icon: Icon) -> NavigationEntry {
    NavigationEntry { label, path, icon }
}

/// Ordered navigation entries visible to `role`.
///
/// Every recognized role yields a non-empty list; `None` (no identity or an
/// unrecognized role) yields an empty one.
#[must_use]
pub fn menu_for(role: Option<Role>) -> Vec<NavigationEntry> {
    match role {
        Some(Role::Admin) => vec![
            entry("Dashboard", "/dashboard", Icon::Dashboard),
            entry("User Management", "/user-management", Icon::People),
            entry(
                "Beneficiary Management",
                "/beneficiary-management",
                Icon::AccountBox,
            ),
            entry("All Vouchers", "/all-vouchers", Icon::CheckCircle),
        ],
        Some(Role::Approver) => vec![
            entry("Pending Approvals", "/pending-approvals", Icon::Pending),
            entry("Approved Vouchers", "/approved-vouchers", Icon::CheckCircle),
        ],
        Some(Role::Creator) => vec![
            entry("New Voucher", "/new-voucher", Icon::AddCircle),
            entry("My Vouchers", "/my-vouchers", Icon::CheckCircle),
        ],
        None => Vec::new(),
    }
}
