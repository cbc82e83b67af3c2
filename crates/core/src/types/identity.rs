//! The authenticated user's profile.

use serde::{Deserialize, Serialize};

use super::id::UserId;
use super::role::Role;

/// Profile of the logged-in user as returned by the voucher API.
///
/// `role` is kept as the raw server string so that unknown roles survive a
/// round trip; use [`Identity::role`] to get the recognized [`Role`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Identity {
    /// Server-assigned user ID.
    #[serde(alias = "_id")]
    pub id: UserId,
    /// Login name.
    pub username: String,
    /// Contact email address.
    pub email: String,
    /// Raw role string (`admin`, `approver`, `creator`, or anything else).
    #[serde(rename = "role")]
    pub role_name: String,
    /// Display name.
    pub full_name: String,
    /// Organisational department.
    pub department: String,
}

impl Identity {
    /// The recognized role, or `None` for roles the console does not know.
    #[must_use]
    pub fn role(&self) -> Option<Role> {
        self.role_name.parse().ok()
    }

    /// Whether this identity holds exactly `role`.
    #[must_use]
    pub fn has_role(&self, role: Role) -> bool {
        self.role() == Some(role)
    }
}
