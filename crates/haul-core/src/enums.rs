//! Role and session status enums.
//!
//! All enums use `snake_case` serialization, matching the values stored in
//! the backend's `profiles.role` column.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::errors::CoreError;
use crate::identity::Identity;

// ---------------------------------------------------------------------------
// Role
// ---------------------------------------------------------------------------

/// Permission class assigned to an identity.
///
/// "No role" is not a variant: it is modelled as `Option<Role>::None` and
/// means the account is waiting for an administrator to approve it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Admin,
    Dispatcher,
    Driver,
    InventoryStaff,
    Client,
}

/// Landing route for accounts that exist but have no role yet.
pub const AWAITING_APPROVAL_ROUTE: &str = "/awaiting-approval";

impl Role {
    pub const ALL: [Self; 5] = [
        Self::Admin,
        Self::Dispatcher,
        Self::Driver,
        Self::InventoryStaff,
        Self::Client,
    ];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Admin => "admin",
            Self::Dispatcher => "dispatcher",
            Self::Driver => "driver",
            Self::InventoryStaff => "inventory_staff",
            Self::Client => "client",
        }
    }

    /// Home dashboard for this role.
    #[must_use]
    pub const fn landing_route(self) -> &'static str {
        match self {
            Self::Admin => "/admin",
            Self::Dispatcher => "/dispatcher",
            Self::Driver => "/driver",
            Self::InventoryStaff => "/inventory",
            Self::Client => "/client",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = CoreError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let normalized = value.trim().to_ascii_lowercase();
        Self::ALL
            .into_iter()
            .find(|role| role.as_str() == normalized)
            .ok_or_else(|| CoreError::InvalidRole(value.to_string()))
    }
}

/// Landing route for an optional role (unset roles land on the approval page).
#[must_use]
pub const fn landing_route_for(role: Option<Role>) -> &'static str {
    match role {
        Some(role) => role.landing_route(),
        None => AWAITING_APPROVAL_ROUTE,
    }
}

// ---------------------------------------------------------------------------
// SessionStatus
// ---------------------------------------------------------------------------

/// Derived state of a resolved session.
///
/// ```text
/// signed_out          no identity
/// awaiting_approval   identity, no profile role
/// active(role)        identity with a role
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "status", content = "role")]
pub enum SessionStatus {
    SignedOut,
    AwaitingApproval,
    Active(Role),
}

impl SessionStatus {
    #[must_use]
    pub const fn from_parts(user: Option<&Identity>, role: Option<Role>) -> Self {
        match (user, role) {
            (None, _) => Self::SignedOut,
            (Some(_), None) => Self::AwaitingApproval,
            (Some(_), Some(role)) => Self::Active(role),
        }
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::SignedOut => "signed_out",
            Self::AwaitingApproval => "awaiting_approval",
            Self::Active(_) => "active",
        }
    }
}

impl fmt::Display for SessionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Active(role) => write!(f, "active ({role})"),
            other => f.write_str(other.as_str()),
        }
    }
}
