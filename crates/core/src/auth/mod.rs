//! Authentication and password hashing.
//!
//! This module provides:
//! - Password hashing with Argon2id
//! - Password verification
//! - Staff role definitions

mod password;

pub use password::{
    MIN_PASSWORD_LEN, PasswordError, check_password_policy, hash_password, verify_password,
};

use serde::{Deserialize, Serialize};

/// Staff roles within a tenant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UserRole {
    /// Full access to the tenant, including staff and billing.
    Admin,
    /// Manages rosters, clients and invoices.
    Coordinator,
    /// Front-line staff; works shifts and writes case notes.
    SupportWorker,
}

impl UserRole {
    /// Returns true if this role can create, assign and cancel shifts.
    #[must_use]
    pub const fn can_manage_roster(&self) -> bool {
        matches!(self, Self::Admin | Self::Coordinator)
    }

    /// Returns true if this role can raise and update invoices.
    #[must_use]
    pub const fn can_manage_billing(&self) -> bool {
        matches!(self, Self::Admin | Self::Coordinator)
    }

    /// Returns true if this role can add or deactivate staff.
    #[must_use]
    pub const fn can_manage_staff(&self) -> bool {
        matches!(self, Self::Admin)
    }

    /// Returns the string representation of the role.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Admin => "admin",
            Self::Coordinator => "coordinator",
            Self::SupportWorker => "support_worker",
        }
    }

    /// Parses a role from its string form.
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "admin" => Some(Self::Admin),
            "coordinator" => Some(Self::Coordinator),
            "support_worker" => Some(Self::SupportWorker),
            _ => None,
        }
    }
}

impl std::fmt::Display for UserRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_permissions() {
        assert!(UserRole::Admin.can_manage_roster());
        assert!(UserRole::Coordinator.can_manage_roster());
        assert!(!UserRole::SupportWorker.can_manage_roster());

        assert!(UserRole::Coordinator.can_manage_billing());
        assert!(!UserRole::SupportWorker.can_manage_billing());

        assert!(UserRole::Admin.can_manage_staff());
        assert!(!UserRole::Coordinator.can_manage_staff());
    }

    #[test]
    fn test_role_round_trip() {
        for role in [UserRole::Admin, UserRole::Coordinator, UserRole::SupportWorker] {
            assert_eq!(UserRole::parse(role.as_str()), Some(role));
        }
        assert_eq!(UserRole::parse("owner"), None);
    }
}
