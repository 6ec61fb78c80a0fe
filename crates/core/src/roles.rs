//! Well-known role names and the typed [`Role`] they parse into.
//!
//! These must match the `CHECK` constraint in `20260301000001_create_users.sql`.

use serde::{Deserialize, Serialize};

pub const ROLE_USER: &str = "user";
pub const ROLE_PREMIUM: &str = "premium";
pub const ROLE_ADMIN: &str = "admin";

/// Account role. Governs quota ceilings and admin-only routes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Premium,
    Admin,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => ROLE_USER,
            Role::Premium => ROLE_PREMIUM,
            Role::Admin => ROLE_ADMIN,
        }
    }

    /// Parse a stored role name. Unknown names yield `None`.
    pub fn parse(name: &str) -> Option<Self> {
        match name {
            ROLE_USER => Some(Role::User),
            ROLE_PREMIUM => Some(Role::Premium),
            ROLE_ADMIN => Some(Role::Admin),
            _ => None,
        }
    }

    /// Premium and admin accounts have no weekly ceiling.
    pub fn is_unlimited(&self) -> bool {
        matches!(self, Role::Premium | Role::Admin)
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_round_trips_known_names() {
        for role in [Role::User, Role::Premium, Role::Admin] {
            assert_eq!(Role::parse(role.as_str()), Some(role));
        }
    }

    #[test]
    fn parse_rejects_unknown() {
        assert_eq!(Role::parse("creator"), None);
        assert_eq!(Role::parse("Admin"), None);
    }

    #[test]
    fn only_premium_and_admin_are_unlimited() {
        assert!(!Role::User.is_unlimited());
        assert!(Role::Premium.is_unlimited());
        assert!(Role::Admin.is_unlimited());
    }
}
