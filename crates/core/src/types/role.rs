//! User roles recognized by the console.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Error returned when a string is not one of the recognized roles.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid role: {0}")]
pub struct RoleParseError(pub String);

/// Role that governs which views and navigation entries a user can reach.
///
/// The voucher API may hand out other role strings; those are kept verbatim on
/// [`Identity`](crate::Identity) and simply fail to parse into this enum.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    /// Manages users, beneficiaries, and sees every voucher.
    Admin,
    /// Reviews pending vouchers and approves or rejects them.
    Approver,
    /// Raises new payment vouchers and tracks their own.
    Creator,
}

impl Role {
    /// Every recognized role, in declaration order.
    pub const ALL: [Self; 3] = [Self::Admin, Self::Approver, Self::Creator];

    /// Wire name of the role.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Admin => "admin",
            Self::Approver => "approver",
            Self::Creator => "creator",
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Role {
    type Err = RoleParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "admin" => Ok(Self::Admin),
            "approver" => Ok(Self::Approver),
            "creator" => Ok(Self::Creator),
            _ => Err(RoleParseError(s.to_owned())),
        }
    }
}
